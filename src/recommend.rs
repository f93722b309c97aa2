//! Recommendation Filter/Ranker
//!
//! Combines classifier output with the district-crop set. Confidence only
//! ranks; a crop the district has never grown is never recommended, however
//! likely the classifier thinks it is.
//!
//! Ordering: confidence descending, ties broken by crop name ascending.

use serde::Serialize;
use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::classifier::ClassProbabilities;
use crate::error::RecommendError;

pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub crop: String,
    /// Classifier probability in [0, 1]
    pub confidence: f64,
}

pub type Recommendations = SmallVec<[Recommendation; MAX_RECOMMENDATIONS]>;

/// Rank the district crops the classifier knows by its confidence
///
/// Returns at most `MAX_RECOMMENDATIONS` entries, or `NoLocalMatch` when no
/// district crop is among the classifier's labels.
pub fn rank_recommendations<S: AsRef<str>>(
    probabilities: &ClassProbabilities,
    district_crops: &[S],
) -> Result<Recommendations, RecommendError> {
    let mut matched: Vec<Recommendation> = Vec::with_capacity(district_crops.len());
    for crop in district_crops {
        let crop = crop.as_ref();
        if matched.iter().any(|r| r.crop == crop) {
            continue;
        }
        if let Some(confidence) = probabilities.get(crop) {
            matched.push(Recommendation {
                crop: crop.to_string(),
                confidence,
            });
        }
    }

    if matched.is_empty() {
        return Err(RecommendError::NoLocalMatch);
    }

    matched.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.crop.cmp(&b.crop))
    });
    matched.truncate(MAX_RECOMMENDATIONS);

    Ok(matched.into_iter().collect())
}
