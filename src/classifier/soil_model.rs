//! Soil/climate crop model
//!
//! Feature vector layout (fixed at training time):
//! `[nitrogen, phosphorous, potassium, temperature, humidity, moisture, soil_id]`
//! where `soil_id` is the sorted-label id of the soil type.

use serde::{Deserialize, Serialize};

use super::encoder::LabelEncoder;
use super::forest::{ForestParams, RandomForest};
use super::probabilities::ClassProbabilities;
use super::Classifier;
use crate::data::SoilDataset;
use crate::error::ModelError;

pub const FEATURE_NAMES: [&str; 7] = [
    "nitrogen",
    "phosphorous",
    "potassium",
    "temperature",
    "humidity",
    "moisture",
    "soil_type",
];

/// User-entered soil and climate readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub nitrogen: f64,
    pub phosphorous: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub soil_type: String,
}

impl SoilReading {
    /// Every numeric reading must be finite and non-negative
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("nitrogen", self.nitrogen),
            ("phosphorous", self.phosphorous),
            ("potassium", self.potassium),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("moisture", self.moisture),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidReading { field, value });
            }
        }
        Ok(())
    }
}

pub struct SoilModel {
    forest: RandomForest,
    soil_encoder: LabelEncoder,
    /// Soil types in first-appearance order, for the dashboard select
    soil_types: Vec<String>,
    n_examples: usize,
}

impl SoilModel {
    pub fn train(dataset: &SoilDataset, params: &ForestParams) -> Result<Self, ModelError> {
        let soil_encoder =
            LabelEncoder::fit("soil type", dataset.examples.iter().map(|e| e.soil_type.as_str()));

        let mut soil_types: Vec<String> = Vec::new();
        for example in &dataset.examples {
            if !soil_types.contains(&example.soil_type) {
                soil_types.push(example.soil_type.clone());
            }
        }

        let x = dataset
            .examples
            .iter()
            .map(|e| {
                let soil_id = soil_encoder.transform(&e.soil_type)?;
                Ok(vec![
                    e.nitrogen,
                    e.phosphorous,
                    e.potassium,
                    e.temperature,
                    e.humidity,
                    e.moisture,
                    soil_id as f64,
                ])
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        let labels: Vec<&str> = dataset.examples.iter().map(|e| e.crop_type.as_str()).collect();

        let forest = RandomForest::fit(&x, &labels, params)?;

        Ok(Self {
            forest,
            soil_encoder,
            soil_types,
            n_examples: dataset.examples.len(),
        })
    }

    /// Validated, encoded feature vector for `reading`
    pub fn features(&self, reading: &SoilReading) -> Result<[f64; 7], ModelError> {
        reading.validate()?;
        let soil_id = self.soil_encoder.transform(&reading.soil_type)?;
        Ok([
            reading.nitrogen,
            reading.phosphorous,
            reading.potassium,
            reading.temperature,
            reading.humidity,
            reading.moisture,
            soil_id as f64,
        ])
    }

    pub fn predict(&self, reading: &SoilReading) -> Result<ClassProbabilities, ModelError> {
        let features = self.features(reading)?;
        self.forest.predict_proba(&features)
    }

    pub fn soil_types(&self) -> &[String] {
        &self.soil_types
    }

    pub fn crop_labels(&self) -> &[String] {
        self.forest.classes()
    }

    pub fn n_examples(&self) -> usize {
        self.n_examples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrainingExample;

    fn example(n: f64, soil: &str, crop: &str) -> TrainingExample {
        TrainingExample {
            nitrogen: n,
            phosphorous: 10.0,
            potassium: 5.0,
            temperature: 28.0,
            humidity: 55.0,
            moisture: 40.0,
            soil_type: soil.into(),
            crop_type: crop.into(),
        }
    }

    fn reading(n: f64, soil: &str) -> SoilReading {
        SoilReading {
            nitrogen: n,
            phosphorous: 10.0,
            potassium: 5.0,
            temperature: 28.0,
            humidity: 55.0,
            moisture: 40.0,
            soil_type: soil.into(),
        }
    }

    fn model() -> SoilModel {
        let mut examples = Vec::new();
        for i in 0..15 {
            examples.push(example(5.0 + i as f64 * 0.1, "Sandy", "Millets"));
            examples.push(example(40.0 + i as f64 * 0.1, "Clayey", "Paddy"));
        }
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        SoilModel::train(&SoilDataset { examples }, &params).unwrap()
    }

    #[test]
    fn test_soil_types_in_appearance_order() {
        let model = model();
        assert_eq!(model.soil_types(), &["Sandy", "Clayey"]);
        assert_eq!(model.crop_labels(), &["Millets", "Paddy"]);
        assert_eq!(model.n_examples(), 30);
    }

    #[test]
    fn test_feature_encoding() {
        let model = model();
        let features = model.features(&reading(12.0, "Sandy")).unwrap();
        assert_eq!(features[0], 12.0);
        // Sorted ids: Clayey = 0, Sandy = 1
        assert_eq!(features[6], 1.0);
    }

    #[test]
    fn test_predict() {
        let model = model();
        let probs = model.predict(&reading(41.0, "Clayey")).unwrap();
        assert_eq!(probs.top().map(|(l, _)| l), Some("Paddy"));
    }

    #[test]
    fn test_rejects_unknown_soil_and_negative_readings() {
        let model = model();
        assert!(matches!(
            model.predict(&reading(10.0, "Peaty")),
            Err(ModelError::UnknownCategory { .. })
        ));
        assert!(matches!(
            model.predict(&reading(-1.0, "Sandy")),
            Err(ModelError::InvalidReading { field: "nitrogen", .. })
        ));
    }
}
