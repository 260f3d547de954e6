//! Clients for the external inference and data services.
//!
//! Every adapter degrades to a deterministic local result when its service
//! is unconfigured or failing; only the geocoder reports errors to callers.

pub mod ai_search;
pub mod floor_plan;
pub mod geocode;
pub mod http;
pub mod news;
pub mod staging;
pub mod traits;

pub use ai_search::{heuristic_filters, ExtractedSearch, ExtractionSource, GroqFilterExtractor};
pub use floor_plan::{
    template_floor_plan, AnalysisSource, FloorPlan, Room, RoomKind, VisionFloorPlanAnalyzer,
};
pub use geocode::{locate, GeoPoint, PhotonGeocoder, RateLimiter};
pub use news::{fallback_headlines, NewsItem, RssNewsSource};
pub use staging::{
    with_cold_start_retry, HuggingFaceStager, StagedImage, StagedImageSource, StagingRequest,
    StagingStyle,
};
pub use traits::{FilterExtractor, FloorPlanAnalyzer, Geocoder, NewsSource, StagingGenerator};
