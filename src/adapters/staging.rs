use crate::adapters::floor_plan::RoomKind;
use crate::adapters::http::build_client;
use crate::adapters::traits::StagingGenerator;
use crate::error::AdapterError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

const STAGING_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";
const STOCK_IMAGE_BASE: &str = "https://images.estate-hub.example/staging";
const MIN_COLD_START_WAIT: Duration = Duration::from_secs(1);
const MAX_COLD_START_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStyle {
    Modern,
    Scandinavian,
    TraditionalIndian,
    Minimalist,
    Luxury,
    Industrial,
}

impl StagingStyle {
    pub const ALL: [StagingStyle; 6] = [
        StagingStyle::Modern,
        StagingStyle::Scandinavian,
        StagingStyle::TraditionalIndian,
        StagingStyle::Minimalist,
        StagingStyle::Luxury,
        StagingStyle::Industrial,
    ];

    fn slug(&self) -> &'static str {
        match self {
            StagingStyle::Modern => "modern",
            StagingStyle::Scandinavian => "scandinavian",
            StagingStyle::TraditionalIndian => "traditional-indian",
            StagingStyle::Minimalist => "minimalist",
            StagingStyle::Luxury => "luxury",
            StagingStyle::Industrial => "industrial",
        }
    }

    fn descriptor(&self) -> &'static str {
        match self {
            StagingStyle::Modern => "modern style, clean lines, neutral palette, contemporary furniture",
            StagingStyle::Scandinavian => "scandinavian style, light wood, white walls, cozy textiles",
            StagingStyle::TraditionalIndian => {
                "traditional indian style, carved teak furniture, brass accents, rich fabrics"
            }
            StagingStyle::Minimalist => "minimalist style, uncluttered, few essential pieces, soft light",
            StagingStyle::Luxury => "luxury style, marble surfaces, designer furniture, statement lighting",
            StagingStyle::Industrial => "industrial style, exposed brick, metal fixtures, leather seating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingRequest {
    pub room: RoomKind,
    pub style: StagingStyle,
}

impl StagingRequest {
    pub fn prompt(&self) -> String {
        format!(
            "Interior photograph of a furnished {}, {}, photorealistic, natural daylight, real estate listing photo",
            self.room.label().to_lowercase(),
            self.style.descriptor()
        )
    }

    pub fn stock_image_url(&self) -> String {
        format!("{}/{}.jpg", STOCK_IMAGE_BASE, self.style.slug())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StagedImageSource {
    Generated { content_type: String, bytes: Vec<u8> },
    Stock { url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub prompt: String,
    pub source: StagedImageSource,
}

impl StagedImage {
    pub fn is_generated(&self) -> bool {
        matches!(self.source, StagedImageSource::Generated { .. })
    }
}

/// Error body returned by the inference API
#[derive(Debug, Deserialize)]
struct InferenceError {
    error: Option<String>,
    estimated_time: Option<f64>,
}

fn cold_start_wait(estimated_secs: f64) -> Duration {
    if !estimated_secs.is_finite() {
        return MAX_COLD_START_WAIT;
    }
    let secs = estimated_secs.clamp(
        MIN_COLD_START_WAIT.as_secs_f64(),
        MAX_COLD_START_WAIT.as_secs_f64(),
    );
    Duration::from_secs_f64(secs)
}

/// Run `attempt`; on a cold start wait the estimated time and try exactly once more
pub async fn with_cold_start_retry<T, F, Fut>(mut attempt: F) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    match attempt().await {
        Err(AdapterError::ColdStart { estimated_secs }) => {
            let wait = cold_start_wait(estimated_secs);
            info!("⏳ Model is loading, retrying in {:?}", wait);
            tokio::time::sleep(wait).await;
            attempt().await
        }
        other => other,
    }
}

/// Virtual staging through Hugging Face text-to-image inference
pub struct HuggingFaceStager {
    client: Client,
    token: Option<String>,
}

impl HuggingFaceStager {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            token,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<StagedImageSource, AdapterError> {
        let token = self.token.as_deref().ok_or(AdapterError::NotConfigured {
            service: "huggingface",
        })?;

        let response = self
            .client
            .post(STAGING_MODEL_URL)
            .bearer_auth(token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<InferenceError> = response.json().await.ok();
            if status == StatusCode::SERVICE_UNAVAILABLE {
                if let Some(estimated_secs) = body.as_ref().and_then(|b| b.estimated_time) {
                    return Err(AdapterError::ColdStart { estimated_secs });
                }
            }
            if let Some(message) = body.and_then(|b| b.error) {
                warn!("Hugging Face error: {}", message);
            }
            return Err(AdapterError::Status {
                service: "huggingface",
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(AdapterError::invalid(
                "huggingface",
                format!("expected an image, got {}", content_type),
            ));
        }
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(AdapterError::invalid("huggingface", "empty image body"));
        }
        Ok(StagedImageSource::Generated {
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl StagingGenerator for HuggingFaceStager {
    async fn stage(&self, request: &StagingRequest) -> StagedImage {
        let prompt = request.prompt();
        let generated = with_cold_start_retry(|| self.generate(&prompt)).await;
        match generated {
            Ok(source) => {
                info!("✅ Generated staged {}", request.room.label());
                StagedImage { prompt, source }
            }
            Err(e) => {
                warn!("Staging failed ({}), using stock image", e);
                StagedImage {
                    source: StagedImageSource::Stock {
                        url: request.stock_image_url(),
                    },
                    prompt,
                }
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "Hugging Face"
    }
}
