use crate::adapters::ai_search::ExtractedSearch;
use crate::adapters::floor_plan::FloorPlan;
use crate::adapters::geocode::GeoPoint;
use crate::adapters::news::NewsItem;
use crate::adapters::staging::{StagedImage, StagingRequest};
use crate::error::AdapterError;
use async_trait::async_trait;

/// Floor-plan image to room layout. Never fails: low-confidence or failed
/// analysis yields a template plan.
#[async_trait]
pub trait FloorPlanAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str, bhk_hint: u8) -> FloorPlan;

    fn source_name(&self) -> &'static str;
}

/// Virtual staging of an empty room
#[async_trait]
pub trait StagingGenerator: Send + Sync {
    async fn stage(&self, request: &StagingRequest) -> StagedImage;

    fn source_name(&self) -> &'static str;
}

/// Natural-language query to structured search filters
#[async_trait]
pub trait FilterExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> ExtractedSearch;

    fn source_name(&self) -> &'static str;
}

/// Free-text place to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Vec<GeoPoint>, AdapterError>;

    fn source_name(&self) -> &'static str;
}

/// Real-estate news headlines
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn headlines(&self, limit: usize) -> Vec<NewsItem>;

    fn source_name(&self) -> &'static str;
}
