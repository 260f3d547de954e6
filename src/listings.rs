use crate::models::{ListingKind, Location, Property, PropertyType, Verification};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;

/// Common trait for listing data sources
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Property>>;

    fn source_name(&self) -> &'static str;
}

/// Built-in catalogue used when no backend is wired up
pub struct SampleListingSource;

#[async_trait]
impl ListingSource for SampleListingSource {
    async fn fetch(&self) -> Result<Vec<Property>> {
        let listings = sample_listings();
        info!("📋 Serving {} sample listings", listings.len());
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "Sample"
    }
}

struct SampleListing {
    id: &'static str,
    title: &'static str,
    property_type: PropertyType,
    listing_kind: ListingKind,
    price: u64,
    bhk: u8,
    bathrooms: u8,
    carpet_area_sqft: u32,
    city: &'static str,
    locality: &'static str,
    coords: (f64, f64),
    amenities: &'static [&'static str],
    seller: (&'static str, &'static str),
    rera: bool,
    days_ago: i64,
}

const SAMPLES: &[SampleListing] = &[
    SampleListing {
        id: "prop_powai_2bhk",
        title: "2 BHK Lake-View Apartment in Powai",
        property_type: PropertyType::Apartment,
        listing_kind: ListingKind::Sale,
        price: 14_500_000,
        bhk: 2,
        bathrooms: 2,
        carpet_area_sqft: 780,
        city: "Mumbai",
        locality: "Powai",
        coords: (19.1176, 72.9060),
        amenities: &["Lift", "Gym", "Swimming Pool", "24x7 Security"],
        seller: ("seller_anita", "Anita Desai"),
        rera: true,
        days_ago: 3,
    },
    SampleListing {
        id: "prop_powai_3bhk",
        title: "Spacious 3 BHK near Hiranandani Gardens",
        property_type: PropertyType::Apartment,
        listing_kind: ListingKind::Sale,
        price: 26_000_000,
        bhk: 3,
        bathrooms: 3,
        carpet_area_sqft: 1_250,
        city: "Mumbai",
        locality: "Powai",
        coords: (19.1197, 72.9107),
        amenities: &["Lift", "Clubhouse", "Covered Parking"],
        seller: ("seller_rahul", "Rahul Mehta"),
        rera: true,
        days_ago: 10,
    },
    SampleListing {
        id: "prop_andheri_studio",
        title: "Furnished Studio near Andheri Metro",
        property_type: PropertyType::Studio,
        listing_kind: ListingKind::Rent,
        price: 35_000,
        bhk: 1,
        bathrooms: 1,
        carpet_area_sqft: 380,
        city: "Mumbai",
        locality: "Andheri West",
        coords: (19.1364, 72.8296),
        amenities: &["Furnished", "Power Backup"],
        seller: ("seller_farah", "Farah Khan"),
        rera: false,
        days_ago: 1,
    },
    SampleListing {
        id: "prop_whitefield_3bhk",
        title: "3 BHK Apartment in Gated Community",
        property_type: PropertyType::Apartment,
        listing_kind: ListingKind::Sale,
        price: 13_500_000,
        bhk: 3,
        bathrooms: 2,
        carpet_area_sqft: 1_420,
        city: "Bengaluru",
        locality: "Whitefield",
        coords: (12.9698, 77.7500),
        amenities: &["Gym", "Children's Play Area", "Swimming Pool"],
        seller: ("seller_kiran", "Kiran Reddy"),
        rera: true,
        days_ago: 6,
    },
    SampleListing {
        id: "prop_whitefield_villa",
        title: "4 BHK Independent Villa with Garden",
        property_type: PropertyType::Villa,
        listing_kind: ListingKind::Sale,
        price: 38_000_000,
        bhk: 4,
        bathrooms: 4,
        carpet_area_sqft: 3_100,
        city: "Bengaluru",
        locality: "Whitefield",
        coords: (12.9784, 77.7408),
        amenities: &["Private Garden", "Covered Parking", "Solar Water Heater"],
        seller: ("seller_kiran", "Kiran Reddy"),
        rera: true,
        days_ago: 21,
    },
    SampleListing {
        id: "prop_baner_2bhk",
        title: "2 BHK Ready-to-Move Flat",
        property_type: PropertyType::Apartment,
        listing_kind: ListingKind::Sale,
        price: 9_200_000,
        bhk: 2,
        bathrooms: 2,
        carpet_area_sqft: 860,
        city: "Pune",
        locality: "Baner",
        coords: (18.5590, 73.7868),
        amenities: &["Lift", "Gym"],
        seller: ("seller_sneha", "Sneha Kulkarni"),
        rera: true,
        days_ago: 2,
    },
    SampleListing {
        id: "prop_hinjewadi_1bhk",
        title: "Compact 1 BHK near IT Park",
        property_type: PropertyType::Apartment,
        listing_kind: ListingKind::Sale,
        price: 4_800_000,
        bhk: 1,
        bathrooms: 1,
        carpet_area_sqft: 520,
        city: "Pune",
        locality: "Hinjewadi",
        coords: (18.5913, 73.7389),
        amenities: &["Lift", "Power Backup"],
        seller: ("seller_sneha", "Sneha Kulkarni"),
        rera: false,
        days_ago: 14,
    },
    SampleListing {
        id: "prop_gachibowli_house",
        title: "3 BHK Independent House",
        property_type: PropertyType::IndependentHouse,
        listing_kind: ListingKind::Sale,
        price: 16_000_000,
        bhk: 3,
        bathrooms: 3,
        carpet_area_sqft: 1_900,
        city: "Hyderabad",
        locality: "Gachibowli",
        coords: (17.4401, 78.3489),
        amenities: &["Terrace", "Covered Parking"],
        seller: ("seller_arjun", "Arjun Rao"),
        rera: false,
        days_ago: 30,
    },
    SampleListing {
        id: "prop_gurgaon_penthouse",
        title: "Luxury 4 BHK Penthouse with Skyline Views",
        property_type: PropertyType::Penthouse,
        listing_kind: ListingKind::Sale,
        price: 55_000_000,
        bhk: 4,
        bathrooms: 5,
        carpet_area_sqft: 4_200,
        city: "Gurugram",
        locality: "Golf Course Road",
        coords: (28.4530, 77.0990),
        amenities: &["Private Terrace", "Concierge", "Swimming Pool", "Clubhouse"],
        seller: ("seller_meera", "Meera Kapoor"),
        rera: true,
        days_ago: 5,
    },
];

/// Sample catalogue of Indian listings
pub fn sample_listings() -> Vec<Property> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .map(|s| Property {
            id: s.id.to_string(),
            title: s.title.to_string(),
            property_type: s.property_type,
            listing_kind: s.listing_kind,
            price: s.price,
            bhk: s.bhk,
            bathrooms: s.bathrooms,
            carpet_area_sqft: s.carpet_area_sqft,
            location: Location {
                city: s.city.to_string(),
                locality: s.locality.to_string(),
                latitude: Some(s.coords.0),
                longitude: Some(s.coords.1),
            },
            amenities: s.amenities.iter().map(|a| a.to_string()).collect(),
            images: vec![format!("https://images.estate-hub.example/{}/cover.jpg", s.id)],
            seller_id: s.seller.0.to_string(),
            seller_name: s.seller.1.to_string(),
            verification: Verification {
                rera_registered: s.rera,
                owner_verified: true,
            },
            posted_at: now - Duration::days(s.days_ago),
            raw_data: json!({
                "mock": true,
                "locality": s.locality,
            }),
        })
        .collect()
}
