use super::PropertyType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price bounds in rupees, both inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl PriceRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, price: u64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    PriceLowToHigh,
    PriceHighToLow,
    Newest,
    AreaLargest,
}

/// Filter snapshot attached to recent and saved searches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub bhk: Vec<u8>,
    #[serde(default)]
    pub localities: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.price_range.is_empty()
            && self.bhk.is_empty()
            && self.localities.is_empty()
            && self.property_types.is_empty()
            && self.sort.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: String,
    pub query: String,
    pub filters: SearchFilters,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub filters: SearchFilters,
    pub created_at: DateTime<Utc>,
    pub alert_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_are_empty() {
        assert!(SearchFilters::default().is_empty());

        let with_sort = SearchFilters {
            sort: Some(SortOrder::Newest),
            ..Default::default()
        };
        assert!(!with_sort.is_empty());
    }

    #[test]
    fn price_range_bounds_are_inclusive() {
        let range = PriceRange {
            min: Some(5_000_000),
            max: Some(8_000_000),
        };
        assert!(range.contains(5_000_000));
        assert!(range.contains(8_000_000));
        assert!(!range.contains(4_999_999));
        assert!(!range.contains(8_000_001));
        assert!(PriceRange::default().contains(1));
    }

    #[test]
    fn filters_deserialize_with_missing_fields() {
        let filters: SearchFilters = serde_json::from_str(r#"{"bhk":[2,3]}"#).unwrap();
        assert_eq!(filters.bhk, vec![2, 3]);
        assert!(filters.localities.is_empty());
        assert!(filters.price_range.is_empty());
    }
}
