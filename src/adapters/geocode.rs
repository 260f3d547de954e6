use crate::adapters::http::{build_client, ensure_success};
use crate::adapters::traits::Geocoder;
use crate::error::AdapterError;
use crate::notice::Notice;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

const PHOTON_URL: &str = "https://photon.komoot.io/api/";
const RESULT_LIMIT: &str = "5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Spaces request starts at least `interval` apart
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until a request may start, then claim the slot
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if Instant::now() < ready_at {
                debug!("Geocoder throttled for {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: longitude, latitude
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    street: Option<String>,
    district: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl FeatureProperties {
    fn label(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in [
            &self.name,
            &self.street,
            &self.district,
            &self.city,
            &self.state,
            &self.country,
        ]
        .into_iter()
        .flatten()
        {
            let part = part.trim();
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

fn points_from_collection(collection: FeatureCollection) -> Vec<GeoPoint> {
    collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let coordinates = feature.geometry?.coordinates;
            let (&longitude, &latitude) = (coordinates.first()?, coordinates.get(1)?);
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return None;
            }
            let label = feature.properties.label();
            Some(GeoPoint {
                label: if label.is_empty() {
                    format!("{:.5}, {:.5}", latitude, longitude)
                } else {
                    label
                },
                latitude,
                longitude,
            })
        })
        .collect()
}

/// Forward geocoding against Photon (OpenStreetMap data)
pub struct PhotonGeocoder {
    client: Client,
    limiter: RateLimiter,
}

impl PhotonGeocoder {
    pub fn new(min_interval: Duration, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            limiter: RateLimiter::new(min_interval),
        })
    }
}

#[async_trait]
impl Geocoder for PhotonGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<GeoPoint>, AdapterError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.limiter.acquire().await;

        let response = self
            .client
            .get(PHOTON_URL)
            .query(&[("q", query), ("limit", RESULT_LIMIT)])
            .send()
            .await?;
        let collection: FeatureCollection = ensure_success("photon", response)?.json().await?;
        Ok(points_from_collection(collection))
    }

    fn source_name(&self) -> &'static str {
        "Photon"
    }
}

/// Geocode for display: failures and empty results become a notice
pub async fn locate(geocoder: &dyn Geocoder, query: &str) -> Result<Vec<GeoPoint>, Notice> {
    match geocoder.geocode(query).await {
        Ok(points) if points.is_empty() => Err(Notice::info(format!(
            "No places found for \"{}\"",
            query.trim()
        ))),
        Ok(points) => Ok(points),
        Err(e) => {
            warn!("{} geocoding failed: {}", geocoder.source_name(), e);
            Err(Notice::error("Location search is unavailable right now"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;

    const PHOTON_FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [72.9052, 19.1176] },
                "properties": { "name": "Powai", "city": "Mumbai", "state": "Maharashtra", "country": "India" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [77.7499, 12.9698] },
                "properties": { "name": "Whitefield", "city": "Bengaluru", "country": "India" }
            },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [] }, "properties": {} },
            { "type": "Feature", "properties": { "name": "No geometry" } }
        ]
    }"#;

    #[test]
    fn decodes_photon_features() {
        let collection: FeatureCollection = serde_json::from_str(PHOTON_FIXTURE).unwrap();
        let points = points_from_collection(collection);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "Powai, Mumbai, Maharashtra, India");
        assert_eq!(points[0].latitude, 19.1176);
        assert_eq!(points[0].longitude, 72.9052);
        assert_eq!(points[1].label, "Whitefield, Bengaluru, India");
    }

    #[test]
    fn label_skips_repeated_parts() {
        let props = FeatureProperties {
            name: Some("Pune".to_string()),
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            ..Default::default()
        };
        assert_eq!(props.label(), "Pune, Maharashtra");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();

        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_does_not_wait_after_idle_period() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }

    struct FixedGeocoder(Result<Vec<GeoPoint>, ()>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Vec<GeoPoint>, AdapterError> {
            self.0.clone().map_err(|_| AdapterError::Status {
                service: "photon",
                status: 502,
            })
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn locate_maps_outcomes_to_notices() {
        let point = GeoPoint {
            label: "Baner, Pune".to_string(),
            latitude: 18.559,
            longitude: 73.786,
        };
        let found = locate(&FixedGeocoder(Ok(vec![point.clone()])), "Baner").await;
        assert_eq!(found, Ok(vec![point]));

        let empty = locate(&FixedGeocoder(Ok(Vec::new())), " Atlantis ").await;
        assert_eq!(empty.unwrap_err().kind, NoticeKind::Info);

        let failed = locate(&FixedGeocoder(Err(())), "Baner").await;
        assert!(failed.unwrap_err().is_error());
    }

    #[tokio::test]
    async fn blank_query_skips_the_request() {
        let geocoder = PhotonGeocoder::new(Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert!(geocoder.geocode("   ").await.unwrap().is_empty());
    }
}
