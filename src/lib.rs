//! AgriGuru: crop recommendation dashboard
//!
//! Layout:
//! - `data`: CSV reference tables loaded with Polars
//! - `region`: state / district / season lookups over the production history
//! - `classifier`: random forest trained on soil/climate readings
//! - `recommend`: ranks district crops by classifier confidence
//! - `soil_guide`: static soil type → crops reference
//! - `weather`, `i18n`: HTTP collaborators (forecast, translation)
//! - `api_server`, `web`: Axum router, JSON API and HTML pages (`api` feature)

pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod recommend;
pub mod region;
pub mod soil_guide;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod i18n;
#[cfg(feature = "api")]
pub mod weather;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use classifier::{ClassProbabilities, Classifier, ForestParams, RandomForest, SoilModel, SoilReading};
pub use config::AppConfig;
pub use data::{ProductionHistory, ProductionRecord, ReferenceData, SoilDataset, TrainingExample};
pub use error::{DataError, ModelError, RecommendError};
pub use recommend::{rank_recommendations, Recommendation, Recommendations, MAX_RECOMMENDATIONS};
pub use region::RegionIndex;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
