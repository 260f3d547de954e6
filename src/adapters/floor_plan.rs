use crate::adapters::http::{build_client, ensure_success};
use crate::adapters::traits::FloorPlanAnalyzer;
use crate::error::AdapterError;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
const SQFT_PER_SQM: f64 = 10.7639;
/// Fewer detected rooms than this is treated as a failed read
const MIN_CONFIDENT_ROOMS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Bedroom,
    Bathroom,
    Kitchen,
    LivingRoom,
    DiningRoom,
    Balcony,
    Study,
    Utility,
    Foyer,
    Pooja,
}

impl RoomKind {
    pub fn label(&self) -> &'static str {
        match self {
            RoomKind::Bedroom => "Bedroom",
            RoomKind::Bathroom => "Bathroom",
            RoomKind::Kitchen => "Kitchen",
            RoomKind::LivingRoom => "Living Room",
            RoomKind::DiningRoom => "Dining Room",
            RoomKind::Balcony => "Balcony",
            RoomKind::Study => "Study",
            RoomKind::Utility => "Utility",
            RoomKind::Foyer => "Foyer",
            RoomKind::Pooja => "Pooja Room",
        }
    }
}

/// Checked in order; the first keyword found on a line names the room
const ROOM_KEYWORDS: &[(&str, RoomKind)] = &[
    ("master bed", RoomKind::Bedroom),
    ("bedroom", RoomKind::Bedroom),
    ("bed room", RoomKind::Bedroom),
    ("m.bed", RoomKind::Bedroom),
    ("toilet", RoomKind::Bathroom),
    ("bathroom", RoomKind::Bathroom),
    ("bath", RoomKind::Bathroom),
    ("w.c", RoomKind::Bathroom),
    ("kitchen", RoomKind::Kitchen),
    ("living", RoomKind::LivingRoom),
    ("drawing", RoomKind::LivingRoom),
    ("hall", RoomKind::LivingRoom),
    ("lounge", RoomKind::LivingRoom),
    ("dining", RoomKind::DiningRoom),
    ("balcony", RoomKind::Balcony),
    ("sit out", RoomKind::Balcony),
    ("deck", RoomKind::Balcony),
    ("study", RoomKind::Study),
    ("utility", RoomKind::Utility),
    ("wash area", RoomKind::Utility),
    ("foyer", RoomKind::Foyer),
    ("entrance", RoomKind::Foyer),
    ("lobby", RoomKind::Foyer),
    ("pooja", RoomKind::Pooja),
    ("puja", RoomKind::Pooja),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Feet,
    Meters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub unit: LengthUnit,
}

impl Dimensions {
    pub fn area_sqft(&self) -> f64 {
        let area = self.length * self.width;
        match self.unit {
            LengthUnit::Feet => area,
            LengthUnit::Meters => area * SQFT_PER_SQM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub kind: RoomKind,
    pub label: String,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Vision,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub rooms: Vec<Room>,
    pub total_area_sqft: Option<f64>,
    pub source: AnalysisSource,
}

impl FloorPlan {
    fn from_rooms(rooms: Vec<Room>, source: AnalysisSource) -> Self {
        let areas: Vec<f64> = rooms
            .iter()
            .filter_map(|r| r.dimensions.map(|d| d.area_sqft()))
            .collect();
        let total_area_sqft = (!areas.is_empty()).then(|| areas.iter().sum());
        Self {
            rooms,
            total_area_sqft,
            source,
        }
    }

    pub fn count(&self, kind: RoomKind) -> usize {
        self.rooms.iter().filter(|r| r.kind == kind).count()
    }
}

fn dimension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(\d+(?:\.\d+)?)\s*('|′|ft|m)?(?:\s*(\d{1,2})\s*(?:"|″|in))?\s*[x×*]\s*(\d+(?:\.\d+)?)\s*('|′|ft|mtrs?|metres?|meters?|m)?(?:\s*(\d{1,2})\s*(?:"|″|in))?"#,
        )
        .expect("dimension pattern is valid")
    })
}

/// Parse the first `L x W` measurement on a line, e.g. `12'6" x 10'` or `3.5 x 4 m`
pub fn parse_dimensions(line: &str) -> Option<Dimensions> {
    let caps = dimension_regex().captures(line)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let inches = |i: usize| number(i).map(|v| v / 12.0).unwrap_or(0.0);

    let is_metric = |i: usize| {
        caps.get(i).is_some_and(|m| {
            let unit = m.as_str().to_lowercase();
            let followed_by_letter = line[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic());
            unit.starts_with('m') && !followed_by_letter
        })
    };
    let unit = if is_metric(2) || is_metric(5) {
        LengthUnit::Meters
    } else {
        LengthUnit::Feet
    };

    let (length, width) = match unit {
        LengthUnit::Feet => (number(1)? + inches(3), number(4)? + inches(6)),
        LengthUnit::Meters => (number(1)?, number(4)?),
    };
    if length <= 0.0 || width <= 0.0 {
        return None;
    }
    Some(Dimensions {
        length,
        width,
        unit,
    })
}

fn room_kind(line: &str) -> Option<RoomKind> {
    let lower = line.to_lowercase();
    ROOM_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, kind)| *kind)
}

/// Extract rooms from OCR text. A measurement on the line after a room
/// label is attached to that room, since OCR often splits them.
pub fn rooms_from_text(text: &str) -> Vec<Room> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut rooms = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if let Some(kind) = room_kind(line) {
            let mut dimensions = parse_dimensions(line);
            if dimensions.is_none() {
                if let Some(next) = lines.get(i + 1) {
                    if room_kind(next).is_none() {
                        dimensions = parse_dimensions(next);
                        if dimensions.is_some() {
                            i += 1;
                        }
                    }
                }
            }
            let label = dimension_regex()
                .split(line)
                .next()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(kind.label())
                .to_string();
            rooms.push(Room {
                kind,
                label,
                dimensions,
            });
        }
        i += 1;
    }
    rooms
}

/// Typical layout for an apartment of the given size
pub fn template_floor_plan(bhk: u8) -> FloorPlan {
    let bhk = bhk.clamp(1, 6);
    let feet = |length: f64, width: f64| {
        Some(Dimensions {
            length,
            width,
            unit: LengthUnit::Feet,
        })
    };

    let mut rooms = vec![
        Room {
            kind: RoomKind::LivingRoom,
            label: "Living Room".to_string(),
            dimensions: feet(16.0, 12.0),
        },
        Room {
            kind: RoomKind::Kitchen,
            label: "Kitchen".to_string(),
            dimensions: feet(10.0, 8.0),
        },
    ];
    for n in 1..=bhk {
        let (label, dims) = if n == 1 {
            ("Master Bedroom".to_string(), feet(14.0, 12.0))
        } else {
            (format!("Bedroom {}", n), feet(12.0, 10.0))
        };
        rooms.push(Room {
            kind: RoomKind::Bedroom,
            label,
            dimensions: dims,
        });
    }
    let bathrooms = if bhk == 1 { 1 } else { bhk.min(4) };
    for n in 1..=bathrooms {
        rooms.push(Room {
            kind: RoomKind::Bathroom,
            label: format!("Bathroom {}", n),
            dimensions: feet(8.0, 5.0),
        });
    }
    if bhk >= 2 {
        rooms.push(Room {
            kind: RoomKind::Balcony,
            label: "Balcony".to_string(),
            dimensions: feet(10.0, 4.0),
        });
    }
    if bhk >= 3 {
        rooms.push(Room {
            kind: RoomKind::DiningRoom,
            label: "Dining Area".to_string(),
            dimensions: feet(10.0, 9.0),
        });
    }
    FloorPlan::from_rooms(rooms, AnalysisSource::Template)
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    full_text_annotation: Option<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    code: Option<i32>,
    message: Option<String>,
}

/// OCR text from a Vision response, preferring the full-text annotation
fn ocr_text(response: AnnotateResponse) -> Result<String, AdapterError> {
    let first = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::invalid("vision", "empty responses array"))?;

    if let Some(status) = first.error {
        return Err(AdapterError::invalid(
            "vision",
            format!(
                "code {}: {}",
                status.code.unwrap_or_default(),
                status.message.unwrap_or_default()
            ),
        ));
    }

    let full = first.full_text_annotation.and_then(|t| t.text);
    let text = match full {
        Some(text) if !text.trim().is_empty() => text,
        _ => first
            .text_annotations
            .into_iter()
            .next()
            .and_then(|a| a.description)
            .unwrap_or_default(),
    };
    if text.trim().is_empty() {
        return Err(AdapterError::LowConfidence("no text detected".to_string()));
    }
    Ok(text)
}

/// Floor-plan reader backed by Google Vision text detection
pub struct VisionFloorPlanAnalyzer {
    client: Client,
    api_key: Option<String>,
}

impl VisionFloorPlanAnalyzer {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
        })
    }

    async fn detect_text(&self, image_url: &str) -> Result<String, AdapterError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(AdapterError::NotConfigured { service: "vision" })?;

        let body = json!({
            "requests": [{
                "image": { "source": { "imageUri": image_url } },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });
        debug!("Requesting OCR for {}", image_url);
        let response = self
            .client
            .post(VISION_ENDPOINT)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;
        let parsed: AnnotateResponse = ensure_success("vision", response)?.json().await?;
        ocr_text(parsed)
    }

    async fn try_analyze(&self, image_url: &str) -> Result<FloorPlan, AdapterError> {
        let text = self.detect_text(image_url).await?;
        let rooms = rooms_from_text(&text);
        if rooms.len() < MIN_CONFIDENT_ROOMS {
            return Err(AdapterError::LowConfidence(format!(
                "only {} rooms recognised",
                rooms.len()
            )));
        }
        Ok(FloorPlan::from_rooms(rooms, AnalysisSource::Vision))
    }
}

#[async_trait]
impl FloorPlanAnalyzer for VisionFloorPlanAnalyzer {
    async fn analyze(&self, image_url: &str, bhk_hint: u8) -> FloorPlan {
        match self.try_analyze(image_url).await {
            Ok(plan) => {
                info!("✅ Recognised {} rooms from floor plan", plan.rooms.len());
                plan
            }
            Err(e) => {
                warn!("Floor plan analysis failed ({}), using {} BHK template", e, bhk_hint);
                template_floor_plan(bhk_hint)
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "Google Vision"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feet_and_inches() {
        let d = parse_dimensions("MASTER BEDROOM 12'6\" x 10'").unwrap();
        assert_eq!(d.unit, LengthUnit::Feet);
        assert!((d.length - 12.5).abs() < 1e-9);
        assert_eq!(d.width, 10.0);
    }

    #[test]
    fn parses_plain_and_metric_dimensions() {
        let plain = parse_dimensions("Kitchen 10 X 8").unwrap();
        assert_eq!((plain.length, plain.width, plain.unit), (10.0, 8.0, LengthUnit::Feet));

        let metric = parse_dimensions("LIVING 3.5 x 4.2 m").unwrap();
        assert_eq!(metric.unit, LengthUnit::Meters);
        assert!((metric.area_sqft() - 3.5 * 4.2 * SQFT_PER_SQM).abs() < 1e-9);

        let suffixed = parse_dimensions("3.5m x 4m").unwrap();
        assert_eq!(suffixed.unit, LengthUnit::Meters);
    }

    #[test]
    fn unit_letter_starting_a_word_is_not_metric() {
        let d = parse_dimensions("12 x 10 master").unwrap();
        assert_eq!(d.unit, LengthUnit::Feet);
    }

    #[test]
    fn extracts_rooms_from_ocr_text() {
        let text = "M.BED ROOM\n12'0\" x 14'0\"\nBED ROOM 2 11' x 10'\nKITCHEN 8' X 10'\nTOILET\n5' x 8'\nLIVING / DINING 18' x 11'\nBALCONY\nNORTH";
        let rooms = rooms_from_text(text);
        let kinds: Vec<RoomKind> = rooms.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RoomKind::Bedroom,
                RoomKind::Bedroom,
                RoomKind::Kitchen,
                RoomKind::Bathroom,
                RoomKind::LivingRoom,
                RoomKind::Balcony,
            ]
        );
        assert_eq!(rooms[0].dimensions.unwrap().width, 14.0);
        assert_eq!(rooms[1].label, "BED ROOM 2");
        assert_eq!(rooms[3].dimensions.unwrap().length, 5.0);
        assert!(rooms[5].dimensions.is_none());

        let plan = FloorPlan::from_rooms(rooms, AnalysisSource::Vision);
        assert_eq!(plan.count(RoomKind::Bedroom), 2);
        let expected = 12.0 * 14.0 + 11.0 * 10.0 + 8.0 * 10.0 + 5.0 * 8.0 + 18.0 * 11.0;
        assert!((plan.total_area_sqft.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn template_scales_with_bhk() {
        let one = template_floor_plan(1);
        assert_eq!(one.count(RoomKind::Bedroom), 1);
        assert_eq!(one.count(RoomKind::Bathroom), 1);
        assert_eq!(one.count(RoomKind::Balcony), 0);
        assert_eq!(one.source, AnalysisSource::Template);

        let three = template_floor_plan(3);
        assert_eq!(three.count(RoomKind::Bedroom), 3);
        assert_eq!(three.count(RoomKind::Bathroom), 3);
        assert_eq!(three.count(RoomKind::DiningRoom), 1);
        assert!(three.total_area_sqft.unwrap() > one.total_area_sqft.unwrap());

        assert_eq!(template_floor_plan(0).count(RoomKind::Bedroom), 1);
    }

    #[test]
    fn decodes_vision_responses() {
        let full: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"textAnnotations":[{"description":"first"}],"fullTextAnnotation":{"text":"KITCHEN 10 x 8"}}]}"#,
        )
        .unwrap();
        assert_eq!(ocr_text(full).unwrap(), "KITCHEN 10 x 8");

        let only_annotations: AnnotateResponse =
            serde_json::from_str(r#"{"responses":[{"textAnnotations":[{"description":"HALL"}]}]}"#)
                .unwrap();
        assert_eq!(ocr_text(only_annotations).unwrap(), "HALL");

        let empty: AnnotateResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert!(matches!(ocr_text(empty), Err(AdapterError::LowConfidence(_))));

        let errored: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"error":{"code":7,"message":"billing disabled"}}]}"#,
        )
        .unwrap();
        assert!(matches!(ocr_text(errored), Err(AdapterError::InvalidResponse { .. })));

        let nothing: AnnotateResponse = serde_json::from_str("{}").unwrap();
        assert!(ocr_text(nothing).is_err());
    }

    #[tokio::test]
    async fn unconfigured_analyzer_falls_back_to_template() {
        let analyzer = VisionFloorPlanAnalyzer::new(None, Duration::from_secs(1)).unwrap();
        let plan = analyzer.analyze("https://example.com/plan.png", 2).await;
        assert_eq!(plan.source, AnalysisSource::Template);
        assert_eq!(plan.count(RoomKind::Bedroom), 2);
    }
}
