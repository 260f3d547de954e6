use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod messaging;
pub mod search;

pub use messaging::{Conversation, Message};
pub use search::{PriceRange, RecentSearch, SavedSearch, SearchFilters, SortOrder};

/// Kind of dwelling a listing describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    IndependentHouse,
    Plot,
    Penthouse,
    Studio,
}

impl PropertyType {
    pub const ALL: [PropertyType; 6] = [
        PropertyType::Apartment,
        PropertyType::Villa,
        PropertyType::IndependentHouse,
        PropertyType::Plot,
        PropertyType::Penthouse,
        PropertyType::Studio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::Villa => "Villa",
            PropertyType::IndependentHouse => "Independent House",
            PropertyType::Plot => "Plot",
            PropertyType::Penthouse => "Penthouse",
            PropertyType::Studio => "Studio",
        }
    }
}

/// Whether the listing is for sale or rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Sale,
    Rent,
}

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub locality: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Verification badges shown on a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verification {
    pub rera_registered: bool,
    pub owner_verified: bool,
}

/// Core property data model, owned by the external listings source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub property_type: PropertyType,
    pub listing_kind: ListingKind,
    /// Asking price (sale) or monthly rent, in rupees
    pub price: u64,
    pub bhk: u8,
    pub bathrooms: u8,
    pub carpet_area_sqft: u32,
    pub location: Location,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub seller_id: String,
    pub seller_name: String,
    pub verification: Verification,
    pub posted_at: DateTime<Utc>,
    pub raw_data: serde_json::Value,
}

impl Property {
    pub fn price_per_sqft(&self) -> Option<f64> {
        if self.carpet_area_sqft == 0 {
            return None;
        }
        Some(self.price as f64 / self.carpet_area_sqft as f64)
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
