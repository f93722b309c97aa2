//! CART decision tree used as the random forest's base learner
//!
//! Nodes live in a flat arena (`Vec<Node>`) and refer to children by index.
//! Leaves keep the class distribution of the training samples that reached
//! them, which is what `predict_proba` averages across the forest.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl Criterion {
    fn impurity(self, counts: &[f64], total: f64) -> f64 {
        if total <= 0.0 {
            return 0.0;
        }
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c / total;
                        p * p
                    })
                    .sum::<f64>()
            }
            Criterion::Entropy => counts
                .iter()
                .filter(|&&c| c > 0.0)
                .map(|&c| {
                    let p = c / total;
                    -p * libm::log2(p)
                })
                .sum(),
        }
    }
}

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    #[default]
    Sqrt,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_features: MaxFeatures,
    /// None grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

/// Candidate split found while scanning one feature
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Read-only inputs shared by the recursive builder
struct BuildContext<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    params: &'a TreeParams,
}

const IMPURITY_EPS: f64 = 1e-12;

impl DecisionTree {
    /// Fit on the rows selected by `sample_indices` (duplicates allowed,
    /// which is how bootstrap weighting is expressed)
    ///
    /// `x` rows must all have the same length and `y` holds encoded class ids
    /// below `n_classes`; the forest validates both before calling this.
    pub fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        sample_indices: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let ctx = BuildContext {
            x,
            y,
            n_classes,
            n_features: x.first().map_or(0, Vec::len),
            params,
        };

        let mut tree = DecisionTree {
            nodes: Vec::new(),
            n_classes,
        };
        let mut indices = sample_indices.to_vec();
        tree.build(&ctx, &mut indices, 0, rng);
        tree
    }

    fn build<R: Rng>(
        &mut self,
        ctx: &BuildContext<'_>,
        indices: &mut [usize],
        depth: usize,
        rng: &mut R,
    ) -> usize {
        let counts = class_counts(ctx.y, indices, ctx.n_classes);
        let total = indices.len() as f64;
        let impurity = ctx.params.criterion.impurity(&counts, total);

        // Reserve the slot so children get higher ids than their parent
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let can_split = impurity > IMPURITY_EPS
            && indices.len() >= ctx.params.min_samples_split.max(2)
            && ctx.params.max_depth.map_or(true, |d| depth < d);

        if can_split {
            if let Some(split) = best_split(ctx, indices, &counts, impurity, rng) {
                let mid = partition(indices, |i| ctx.x[i][split.feature] <= split.threshold);
                let (left_idx, right_idx) = indices.split_at_mut(mid);
                let left = self.build(ctx, left_idx, depth + 1, rng);
                let right = self.build(ctx, right_idx, depth + 1, rng);
                self.nodes[id] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return id;
            }
        }

        let distribution = if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![0.0; ctx.n_classes]
        };
        self.nodes[id] = Node::Leaf { distribution };
        id
    }

    /// Class distribution of the leaf `row` falls into
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &i in indices {
        counts[y[i]] += 1.0;
    }
    counts
}

/// Move rows matching `goes_left` to the front; returns the split point
fn partition(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for j in 0..indices.len() {
        if goes_left(indices[j]) {
            indices.swap(mid, j);
            mid += 1;
        }
    }
    mid
}

/// Best split over a random feature subset
///
/// Features are visited in random order. The first `max_features` are always
/// scanned; if none of them yields a valid split, scanning continues through
/// the remaining features until one does.
fn best_split<R: Rng>(
    ctx: &BuildContext<'_>,
    indices: &[usize],
    parent_counts: &[f64],
    parent_impurity: f64,
    rng: &mut R,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..ctx.n_features).collect();
    features.shuffle(rng);
    let k = ctx.params.max_features.resolve(ctx.n_features);

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for (visited, &feature) in features.iter().enumerate() {
        if visited >= k && best.is_some() {
            break;
        }

        sorted.sort_by(|&a, &b| ctx.x[a][feature].total_cmp(&ctx.x[b][feature]));

        let total = sorted.len() as f64;
        let mut left = vec![0.0; ctx.n_classes];
        let mut right = parent_counts.to_vec();

        for pos in 0..sorted.len() - 1 {
            let class = ctx.y[sorted[pos]];
            left[class] += 1.0;
            right[class] -= 1.0;

            let value = ctx.x[sorted[pos]][feature];
            let next = ctx.x[sorted[pos + 1]][feature];
            if next <= value {
                continue;
            }

            let n_left = (pos + 1) as f64;
            let n_right = total - n_left;
            let weighted = (n_left * ctx.params.criterion.impurity(&left, n_left)
                + n_right * ctx.params.criterion.impurity(&right, n_right))
                / total;

            // Zero-gain splits count: XOR-like nodes separate one level down
            if weighted <= parent_impurity + IMPURITY_EPS
                && best.as_ref().map_or(true, |b| weighted < b.impurity)
            {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity: weighted,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fit_all(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &TreeParams) -> DecisionTree {
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        DecisionTree::fit(x, y, n_classes, &indices, params, &mut rng)
    }

    #[test]
    fn test_gini_impurity() {
        assert_relative_eq!(Criterion::Gini.impurity(&[5.0, 5.0], 10.0), 0.5);
        assert_relative_eq!(Criterion::Gini.impurity(&[10.0, 0.0], 10.0), 0.0);
        assert_relative_eq!(Criterion::Entropy.impurity(&[5.0, 5.0], 10.0), 1.0);
    }

    #[test]
    fn test_single_threshold_split() {
        let x = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let y = vec![0, 0, 1, 1];
        let tree = fit_all(&x, &y, 2, &TreeParams::default());

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[5.1]), &[0.0, 1.0]);
        // Midpoint threshold is 5.0, inclusive on the left
        assert_eq!(tree.predict_proba(&[5.0]), &[1.0, 0.0]);
    }

    #[test]
    fn test_max_depth_keeps_mixed_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let y = vec![0, 1, 0, 1];
        let params = TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        };
        let tree = fit_all(&x, &y, 2, &params);

        assert_eq!(tree.n_nodes(), 1);
        let dist = tree.predict_proba(&[2.5]);
        assert_relative_eq!(dist[0], 0.5);
        assert_relative_eq!(dist[1], 0.5);
    }

    #[test]
    fn test_xor_grows_past_zero_gain_root() {
        let x = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let y = vec![0, 1, 1, 0];
        let params = TreeParams {
            max_features: MaxFeatures::All,
            ..TreeParams::default()
        };
        let tree = fit_all(&x, &y, 2, &params);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 4);
        for (row, &class) in x.iter().zip(&y) {
            assert_relative_eq!(tree.predict_proba(row)[class], 1.0);
        }
    }

    #[test]
    fn test_identical_rows_become_leaf() {
        let x = vec![vec![1.0, 1.0]; 4];
        let y = vec![0, 1, 1, 1];
        let tree = fit_all(&x, &y, 2, &TreeParams::default());
        assert_eq!(tree.n_leaves(), 1);
        assert_relative_eq!(tree.predict_proba(&[1.0, 1.0])[1], 0.75);
    }
}
