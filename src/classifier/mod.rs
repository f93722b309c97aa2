//! Crop classifier
//!
//! - `encoder`: sorted label encoding for categorical values
//! - `tree` / `forest`: CART trees bagged into a random forest
//! - `probabilities`: named label → probability mapping returned by inference
//! - `soil_model`: forest + soil-type encoder fitted on the soil dataset

pub mod encoder;
pub mod forest;
pub mod probabilities;
pub mod soil_model;
pub mod tree;

pub use encoder::LabelEncoder;
pub use forest::{ForestParams, RandomForest};
pub use probabilities::ClassProbabilities;
pub use soil_model::{SoilModel, SoilReading, FEATURE_NAMES};
pub use tree::{Criterion, DecisionTree, MaxFeatures, TreeParams};

use crate::error::ModelError;

/// Anything that maps a feature vector to per-class probabilities
pub trait Classifier: Send + Sync {
    /// Class labels in the order probabilities are reported
    fn classes(&self) -> &[String];

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities, ModelError>;
}
