//! Named label → probability mapping produced right after inference

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::ModelError;

/// Class probabilities keyed by label
///
/// Built from a classifier's class list and its positional probability
/// vector; once constructed, lookups are by name only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbabilities {
    /// (label, probability) in classifier class order
    entries: Vec<(String, f64)>,
    #[serde(skip)]
    by_label: FxHashMap<String, f64>,
}

impl ClassProbabilities {
    pub fn new(labels: &[String], probabilities: &[f64]) -> Result<Self, ModelError> {
        if labels.len() != probabilities.len() {
            return Err(ModelError::ProbabilityMismatch {
                labels: labels.len(),
                probabilities: probabilities.len(),
            });
        }

        let mut entries = Vec::with_capacity(labels.len());
        let mut by_label = FxHashMap::default();
        for (label, &p) in labels.iter().zip(probabilities) {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(ModelError::InvalidProbability {
                    label: label.clone(),
                    value: p,
                });
            }
            entries.push((label.clone(), p));
            by_label.insert(label.clone(), p);
        }

        Ok(Self { entries, by_label })
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.by_label.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-probability label, ignoring locality
    pub fn top(&self) -> Option<(&str, f64)> {
        self.iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pairs_by_position() {
        let probs = ClassProbabilities::new(&labels(&["Rice", "Wheat"]), &[0.25, 0.75]).unwrap();
        assert_eq!(probs.get("Wheat"), Some(0.75));
        assert_eq!(probs.get("Maize"), None);
        assert_eq!(probs.top(), Some(("Wheat", 0.75)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = ClassProbabilities::new(&labels(&["Rice", "Wheat"]), &[1.0]).unwrap_err();
        assert!(matches!(err, ModelError::ProbabilityMismatch { labels: 2, probabilities: 1 }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(ClassProbabilities::new(&labels(&["Rice"]), &[1.5]).is_err());
        assert!(ClassProbabilities::new(&labels(&["Rice"]), &[f64::NAN]).is_err());
    }
}
