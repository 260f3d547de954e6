use crate::adapters::http::{build_client, ensure_success};
use crate::adapters::traits::FilterExtractor;
use crate::error::AdapterError;
use crate::models::{PriceRange, PropertyType, SearchFilters, SortOrder};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const GROQ_MODEL: &str = "llama-3.1-8b-instant";
const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

const SYSTEM_PROMPT: &str = "You convert Indian real-estate search queries into JSON filters. \
Reply with a single JSON object using only these keys: \
min_price (rupees, number), max_price (rupees, number), bhk (array of integers), \
localities (array of strings), property_types (array drawn from apartment, villa, \
independent_house, plot, penthouse, studio), sort (one of relevance, price_low_to_high, \
price_high_to_low, newest, area_largest). 1 lakh = 100000 rupees, 1 crore = 10000000 rupees. \
Omit keys the query does not mention.";

/// Localities the heuristic recognises, in display form
const KNOWN_LOCALITIES: &[&str] = &[
    "Powai",
    "Andheri West",
    "Andheri East",
    "Bandra",
    "Thane",
    "Navi Mumbai",
    "Whitefield",
    "Koramangala",
    "Indiranagar",
    "HSR Layout",
    "Electronic City",
    "Baner",
    "Hinjewadi",
    "Kharadi",
    "Wakad",
    "Gachibowli",
    "Hitech City",
    "Kondapur",
    "Golf Course Road",
    "Sohna Road",
    "Noida",
    "Dwarka",
];

const PROPERTY_TYPE_KEYWORDS: &[(&str, PropertyType)] = &[
    ("apartment", PropertyType::Apartment),
    ("apartments", PropertyType::Apartment),
    ("flat", PropertyType::Apartment),
    ("flats", PropertyType::Apartment),
    ("villa", PropertyType::Villa),
    ("villas", PropertyType::Villa),
    ("independent house", PropertyType::IndependentHouse),
    ("independent_house", PropertyType::IndependentHouse),
    ("house", PropertyType::IndependentHouse),
    ("bungalow", PropertyType::IndependentHouse),
    ("plot", PropertyType::Plot),
    ("plots", PropertyType::Plot),
    ("land", PropertyType::Plot),
    ("penthouse", PropertyType::Penthouse),
    ("studio", PropertyType::Studio),
    ("1rk", PropertyType::Studio),
];

const SORT_KEYWORDS: &[(&str, SortOrder)] = &[
    ("cheapest", SortOrder::PriceLowToHigh),
    ("lowest price", SortOrder::PriceLowToHigh),
    ("affordable", SortOrder::PriceLowToHigh),
    ("most expensive", SortOrder::PriceHighToLow),
    ("highest price", SortOrder::PriceHighToLow),
    ("premium", SortOrder::PriceHighToLow),
    ("newest", SortOrder::Newest),
    ("latest", SortOrder::Newest),
    ("new launch", SortOrder::Newest),
    ("largest", SortOrder::AreaLargest),
    ("biggest", SortOrder::AreaLargest),
    ("spacious", SortOrder::AreaLargest),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSearch {
    pub filters: SearchFilters,
    pub source: ExtractionSource,
}

fn bhk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d)(?:\s*(?:,|/|or|and)\s*(\d))?\s*-?\s*(?:bhk|bed(?:room)?s?)\b")
            .expect("bhk pattern is valid")
    })
}

fn budget_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+(?:\.\d+)?)\s*(?:-|to)\s*(\d+(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l|k)\b",
        )
        .expect("budget range pattern is valid")
    })
}

fn budget_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\b(under|below|less than|upto|up to|within|max|above|over|more than|at least|min|from)\s+)?(?:rs\.?|₹|inr)?\s*(\d+(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l|k)\b",
        )
        .expect("budget pattern is valid")
    })
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "cr" | "crore" | "crores" => CRORE,
        "k" => 1_000.0,
        _ => LAKH,
    }
}

fn rupees(amount: &str, unit: &str) -> Option<u64> {
    let value: f64 = amount.parse().ok()?;
    Some((value * unit_multiplier(unit)).round() as u64)
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn parse_budget(query: &str) -> PriceRange {
    if let Some(caps) = budget_range_regex().captures(query) {
        let low = rupees(&caps[1], &caps[3]);
        let high = rupees(&caps[2], &caps[3]);
        if let (Some(low), Some(high)) = (low, high) {
            return PriceRange {
                min: Some(low.min(high)),
                max: Some(low.max(high)),
            };
        }
    }

    let mut range = PriceRange::default();
    let mut unqualified = Vec::new();
    for caps in budget_regex().captures_iter(query) {
        let Some(amount) = rupees(&caps[2], &caps[3]) else {
            continue;
        };
        match caps.get(1).map(|m| m.as_str().to_lowercase()) {
            Some(q) if matches!(q.as_str(), "above" | "over" | "more than" | "at least" | "min" | "from") => {
                range.min = Some(amount)
            }
            Some(_) => range.max = Some(amount),
            None => unqualified.push(amount),
        }
    }

    match unqualified.as_slice() {
        [] => {}
        [only] => {
            if range.max.is_none() {
                range.max = Some(*only);
            } else if range.min.is_none() {
                range.min = Some(*only);
            }
        }
        many => {
            let low = many.iter().copied().min();
            let high = many.iter().copied().max();
            range.min = range.min.or(low);
            range.max = range.max.or(high);
        }
    }
    range
}

fn parse_bhk(query: &str) -> Vec<u8> {
    let mut bhk = Vec::new();
    for caps in bhk_regex().captures_iter(query) {
        for i in [1, 2] {
            if let Some(n) = caps.get(i).and_then(|m| m.as_str().parse::<u8>().ok()) {
                if n > 0 && !bhk.contains(&n) {
                    bhk.push(n);
                }
            }
        }
    }
    bhk.sort_unstable();
    bhk
}

fn parse_property_types(text: &str) -> Vec<PropertyType> {
    let lower = text.to_lowercase();
    let mut types = Vec::new();
    for (keyword, property_type) in PROPERTY_TYPE_KEYWORDS {
        if contains_phrase(&lower, keyword) && !types.contains(property_type) {
            types.push(*property_type);
        }
    }
    types
}

fn parse_localities(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KNOWN_LOCALITIES
        .iter()
        .filter(|locality| contains_phrase(&lower, &locality.to_lowercase()))
        .map(|locality| locality.to_string())
        .collect()
}

fn parse_sort(lower: &str) -> Option<SortOrder> {
    SORT_KEYWORDS
        .iter()
        .find(|(keyword, _)| contains_phrase(lower, keyword))
        .map(|(_, order)| *order)
}

/// Local regex-based filter extraction
pub fn heuristic_filters(query: &str) -> SearchFilters {
    let lower = query.to_lowercase();
    SearchFilters {
        price_range: parse_budget(query),
        bhk: parse_bhk(query),
        localities: parse_localities(query),
        property_types: parse_property_types(query),
        sort: parse_sort(&lower),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Filter object the model is asked to produce
#[derive(Debug, Default, Deserialize)]
struct LlmFilters {
    min_price: Option<f64>,
    max_price: Option<f64>,
    bhk: Option<OneOrMany<u8>>,
    localities: Option<OneOrMany<String>>,
    property_types: Option<OneOrMany<String>>,
    sort: Option<String>,
}

fn price(value: Option<f64>) -> Option<u64> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u64)
}

impl From<LlmFilters> for SearchFilters {
    fn from(raw: LlmFilters) -> Self {
        let mut bhk: Vec<u8> = raw
            .bhk
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| *n > 0)
            .collect();
        bhk.sort_unstable();
        bhk.dedup();

        let mut property_types = Vec::new();
        for name in raw.property_types.map(OneOrMany::into_vec).unwrap_or_default() {
            for t in parse_property_types(&name) {
                if !property_types.contains(&t) {
                    property_types.push(t);
                }
            }
        }

        let sort = raw
            .sort
            .and_then(|s| serde_json::from_value::<SortOrder>(json!(s.to_lowercase())).ok())
            .filter(|s| *s != SortOrder::Relevance);

        SearchFilters {
            price_range: PriceRange {
                min: price(raw.min_price),
                max: price(raw.max_price),
            },
            bhk,
            localities: raw
                .localities
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            property_types,
            sort,
        }
    }
}

/// Pull the filter object out of a chat completion
fn filters_from_completion(completion: ChatCompletion) -> Result<SearchFilters, AdapterError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AdapterError::invalid("groq", "no message content"))?;

    let raw: LlmFilters = serde_json::from_str(content.trim())
        .map_err(|e| AdapterError::invalid("groq", format!("filter JSON: {}", e)))?;
    let filters = SearchFilters::from(raw);
    if filters.is_empty() {
        return Err(AdapterError::LowConfidence("model returned no filters".to_string()));
    }
    Ok(filters)
}

/// Filter extraction through Groq chat completions
pub struct GroqFilterExtractor {
    client: Client,
    api_key: Option<String>,
}

impl GroqFilterExtractor {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
        })
    }

    async fn ask_model(&self, query: &str) -> Result<SearchFilters, AdapterError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(AdapterError::NotConfigured { service: "groq" })?;

        let body = json!({
            "model": GROQ_MODEL,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": query }
            ]
        });
        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        let completion: ChatCompletion = ensure_success("groq", response)?.json().await?;
        filters_from_completion(completion)
    }
}

#[async_trait]
impl FilterExtractor for GroqFilterExtractor {
    async fn extract(&self, query: &str) -> ExtractedSearch {
        match self.ask_model(query).await {
            Ok(filters) => {
                debug!("Model filters for {:?}: {:?}", query, filters);
                ExtractedSearch {
                    filters,
                    source: ExtractionSource::Llm,
                }
            }
            Err(e) => {
                match e {
                    AdapterError::NotConfigured { .. } => info!("AI search offline, using keyword parser"),
                    _ => warn!("AI search failed ({}), using keyword parser", e),
                }
                ExtractedSearch {
                    filters: heuristic_filters(query),
                    source: ExtractionSource::Heuristic,
                }
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "Groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_reads_bhk_budget_and_locality() {
        let filters = heuristic_filters("2 BHK flat in Powai under 1.5 crore");
        assert_eq!(filters.bhk, vec![2]);
        assert_eq!(filters.localities, vec!["Powai".to_string()]);
        assert_eq!(filters.property_types, vec![PropertyType::Apartment]);
        assert_eq!(filters.price_range.max, Some(15_000_000));
        assert_eq!(filters.price_range.min, None);
    }

    #[test]
    fn heuristic_budget_variants() {
        assert_eq!(
            parse_budget("between 50 lakh and 1 cr"),
            PriceRange {
                min: Some(5_000_000),
                max: Some(10_000_000)
            }
        );
        assert_eq!(
            parse_budget("80-95 lakhs"),
            PriceRange {
                min: Some(8_000_000),
                max: Some(9_500_000)
            }
        );
        assert_eq!(
            parse_budget("above 2 crore"),
            PriceRange {
                min: Some(20_000_000),
                max: None
            }
        );
        assert_eq!(parse_budget("rent within 35k").max, Some(35_000));
        assert_eq!(parse_budget("budget 90L").max, Some(9_000_000));
        assert!(parse_budget("3 bhk in baner").is_empty());
    }

    #[test]
    fn heuristic_reads_multiple_bhk() {
        assert_eq!(parse_bhk("2 or 3 BHK in Whitefield"), vec![2, 3]);
        assert_eq!(parse_bhk("3bhk"), vec![3]);
        assert_eq!(parse_bhk("4 bedroom villa"), vec![4]);
        assert!(parse_bhk("flats near metro").is_empty());
    }

    #[test]
    fn property_type_keywords_respect_word_boundaries() {
        assert_eq!(parse_property_types("penthouse with terrace"), vec![PropertyType::Penthouse]);
        assert_eq!(
            parse_property_types("independent house or villa"),
            vec![PropertyType::Villa, PropertyType::IndependentHouse]
        );
        assert!(parse_property_types("flatmates wanted").is_empty());
    }

    #[test]
    fn heuristic_reads_sort_intent() {
        assert_eq!(
            heuristic_filters("cheapest studio in Andheri West").sort,
            Some(SortOrder::PriceLowToHigh)
        );
        assert_eq!(heuristic_filters("latest launches").sort, Some(SortOrder::Newest));
        assert_eq!(heuristic_filters("spacious villas").sort, Some(SortOrder::AreaLargest));
        assert_eq!(heuristic_filters("villas").sort, None);
    }

    #[test]
    fn decodes_model_filters() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"max_price\": 15000000, \"bhk\": 2, \"localities\": [\"Powai\"], \"property_types\": [\"apartment\"], \"sort\": \"price_low_to_high\"}"}}]}"#,
        )
        .unwrap();
        let filters = filters_from_completion(completion).unwrap();
        assert_eq!(filters.price_range.max, Some(15_000_000));
        assert_eq!(filters.bhk, vec![2]);
        assert_eq!(filters.localities, vec!["Powai".to_string()]);
        assert_eq!(filters.property_types, vec![PropertyType::Apartment]);
        assert_eq!(filters.sort, Some(SortOrder::PriceLowToHigh));
    }

    #[test]
    fn malformed_model_output_is_rejected() {
        let not_json: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Sure! Here are your filters"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            filters_from_completion(not_json),
            Err(AdapterError::InvalidResponse { .. })
        ));

        let empty_object: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"{}"}}]}"#).unwrap();
        assert!(matches!(
            filters_from_completion(empty_object),
            Err(AdapterError::LowConfidence(_))
        ));

        let no_choices: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(filters_from_completion(no_choices).is_err());
    }

    #[tokio::test]
    async fn unconfigured_extractor_uses_heuristic() {
        let extractor = GroqFilterExtractor::new(None, Duration::from_secs(1)).unwrap();
        let extracted = extractor.extract("3 bhk villa in Whitefield").await;
        assert_eq!(extracted.source, ExtractionSource::Heuristic);
        assert_eq!(extracted.filters.bhk, vec![3]);
        assert_eq!(extracted.filters.property_types, vec![PropertyType::Villa]);
    }
}
