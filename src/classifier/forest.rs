//! Random forest classifier
//!
//! Trees are fit in parallel with Rayon on bootstrap samples. Tree `i` draws
//! from its own `StdRng` seeded with `seed + i`, so a given seed produces the
//! same forest regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::encoder::LabelEncoder;
use super::probabilities::ClassProbabilities;
use super::tree::{DecisionTree, TreeParams};
use super::Classifier;
use crate::error::ModelError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub bootstrap: bool,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            bootstrap: true,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    classes: LabelEncoder,
    n_features: usize,
}

impl RandomForest {
    pub fn fit<S: AsRef<str>>(
        x: &[Vec<f64>],
        labels: &[S],
        params: &ForestParams,
    ) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != labels.len() {
            return Err(ModelError::LabelCountMismatch {
                features: x.len(),
                labels: labels.len(),
            });
        }

        let n_features = x[0].len();
        if let Some(bad) = x.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::FeatureDimension {
                expected: n_features,
                actual: bad.len(),
            });
        }

        let classes = LabelEncoder::fit("crop type", labels.iter().map(|l| l.as_ref()));
        let y = labels
            .iter()
            .map(|l| classes.transform(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let n_samples = x.len();
        let n_classes = classes.len();
        let n_trees = params.n_trees.max(1);

        let trees: Vec<DecisionTree> = (0..n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, &y, n_classes, &sample, &params.tree, &mut rng)
            })
            .collect();

        tracing::info!(
            "Fitted random forest: {} trees, {} samples, {} features, {} classes",
            trees.len(),
            n_samples,
            n_features,
            n_classes
        );

        Ok(Self {
            trees,
            classes,
            n_features,
        })
    }

    /// Mean leaf distribution across trees, in class order
    pub fn predict_proba_raw(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::FeatureDimension {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut sums = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sums.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }

        let n = self.trees.len() as f64;
        Ok(sums.into_iter().map(|s| (s / n).clamp(0.0, 1.0)).collect())
    }

    /// Most probable class label
    pub fn predict(&self, row: &[f64]) -> Result<&str, ModelError> {
        let proba = self.predict_proba_raw(row)?;
        let best = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Ok(self.classes.inverse(best).unwrap_or_default())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[String] {
        self.classes.classes()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities, ModelError> {
        let proba = self.predict_proba_raw(features)?;
        ClassProbabilities::new(self.classes.classes(), &proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two well-separated clusters per class in 2D
    fn clusters() -> (Vec<Vec<f64>>, Vec<&'static str>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.05;
            x.push(vec![1.0 + jitter, 1.0 - jitter]);
            y.push("Rice");
            x.push(vec![10.0 + jitter, 10.0 - jitter]);
            y.push("Wheat");
            x.push(vec![1.0 + jitter, 10.0 - jitter]);
            y.push("Maize");
        }
        (x, y)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_classes_are_sorted() {
        let (x, y) = clusters();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        assert_eq!(forest.classes(), &["Maize", "Rice", "Wheat"]);
        assert_eq!(forest.n_trees(), 15);
    }

    #[test]
    fn test_predicts_separable_clusters() {
        let (x, y) = clusters();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();

        assert_eq!(forest.predict(&[1.2, 0.9]).unwrap(), "Rice");
        assert_eq!(forest.predict(&[10.3, 9.8]).unwrap(), "Wheat");
        assert_eq!(forest.predict(&[1.1, 9.9]).unwrap(), "Maize");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = clusters();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let probs = forest.predict_proba(&[5.0, 5.0]).unwrap();

        assert_eq!(probs.len(), 3);
        let total: f64 = probs.iter().map(|(_, p)| p).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert!(probs.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = clusters();
        let a = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let b = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let row = [4.0, 6.5];
        assert_eq!(a.predict_proba_raw(&row).unwrap(), b.predict_proba_raw(&row).unwrap());
    }

    #[test]
    fn test_input_validation() {
        let (x, y) = clusters();
        assert!(matches!(
            RandomForest::fit::<&str>(&[], &[], &small_params()),
            Err(ModelError::EmptyTrainingSet)
        ));
        assert!(matches!(
            RandomForest::fit(&x, &y[..3], &small_params()),
            Err(ModelError::LabelCountMismatch { .. })
        ));

        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        assert!(matches!(
            forest.predict_proba_raw(&[1.0]),
            Err(ModelError::FeatureDimension { expected: 2, actual: 1 })
        ));
    }
}
