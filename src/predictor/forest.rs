//! Bootstrap-aggregated decision trees for binary outcome classification
//!
//! Trees split on gini impurity; the forest averages leaf class fractions
//! into a probability and accumulates mean-decrease-in-impurity feature
//! importances.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const DEFAULT_TREES: usize = 100;
const DEFAULT_MAX_DEPTH: usize = 8;
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum Node {
    Leaf {
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single gini-split decision tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    root: usize,
    importances: Vec<f64>,
    max_depth: usize,
}

impl DecisionTree {
    fn new(max_depth: usize) -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
            importances: Vec::new(),
            max_depth,
        }
    }

    fn fit(&mut self, samples: &[Vec<f64>], labels: &[u8]) {
        self.nodes.clear();
        let n_features = samples.first().map_or(0, Vec::len);
        self.importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..samples.len()).collect();
        let total = samples.len();
        self.root = self.build(samples, labels, &indices, 0, total);

        let sum: f64 = self.importances.iter().sum();
        if sum > 0.0 {
            for importance in &mut self.importances {
                *importance /= sum;
            }
        }
    }

    fn build(
        &mut self,
        samples: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        depth: usize,
        total: usize,
    ) -> usize {
        let positives = indices.iter().filter(|&&i| labels[i] == 1).count();
        #[allow(clippy::cast_precision_loss)]
        let positive_fraction = positives as f64 / indices.len() as f64;

        let is_pure = positives == 0 || positives == indices.len();
        if depth >= self.max_depth || indices.len() < MIN_SAMPLES_SPLIT || is_pure {
            return self.push(Node::Leaf { positive_fraction });
        }

        let Some(split) = best_split(samples, labels, indices) else {
            return self.push(Node::Leaf { positive_fraction });
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| samples[i][split.feature] <= split.threshold);

        #[allow(clippy::cast_precision_loss)]
        {
            self.importances[split.feature] += (indices.len() as f64 * split.gain) / total as f64;
        }

        let left = self.build(samples, labels, &left_idx, depth + 1, total);
        let right = self.build(samples, labels, &right_idx, depth + 1, total);

        self.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Fraction of positive training samples in the leaf this vector lands in.
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut index = self.root;
        loop {
            match &self.nodes[index] {
                Node::Leaf { positive_fraction } => return *positive_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Binary gini impurity.
fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Exhaustive best split over every feature and every midpoint between
/// adjacent distinct values.
fn best_split(samples: &[Vec<f64>], labels: &[u8], indices: &[usize]) -> Option<Split> {
    let n_features = samples.first().map_or(0, Vec::len);
    let total = indices.len();
    let total_positives = indices.iter().filter(|&&i| labels[i] == 1).count();
    let parent_impurity = gini(total_positives, total);

    let mut best: Option<Split> = None;

    for feature in 0..n_features {
        let mut ordered: Vec<(f64, u8)> = indices
            .iter()
            .map(|&i| (samples[i][feature], labels[i]))
            .collect();
        ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_total = 0;
        let mut left_positives = 0;
        for i in 0..total - 1 {
            left_total += 1;
            left_positives += usize::from(ordered[i].1 == 1);

            // No threshold between equal values.
            if (ordered[i].0 - ordered[i + 1].0).abs() < f64::EPSILON {
                continue;
            }

            let right_total = total - left_total;
            let right_positives = total_positives - left_positives;

            #[allow(clippy::cast_precision_loss)]
            let weighted = (left_total as f64 * gini(left_positives, left_total)
                + right_total as f64 * gini(right_positives, right_total))
                / total as f64;
            let gain = parent_impurity - weighted;

            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: (ordered[i].0 + ordered[i + 1].0) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}

/// Random forest: bagged gini trees with averaged probabilities and
/// importances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_trees: usize,
    max_depth: usize,
    seed: u64,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(DEFAULT_TREES, DEFAULT_MAX_DEPTH)
    }
}

impl RandomForest {
    /// Create an unfitted forest.
    #[must_use]
    pub fn new(n_trees: usize, max_depth: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_trees,
            max_depth,
            seed: 42,
        }
    }

    /// Override the bootstrap seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest on a sample matrix and binary labels.
    ///
    /// Each tree trains on a bootstrap resample (with replacement, same size
    /// as the input). Empty input leaves the forest unfitted.
    pub fn fit(&mut self, samples: &[Vec<f64>], labels: &[u8]) {
        self.trees.clear();
        if samples.is_empty() {
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..self.n_trees {
            let bootstrap: Vec<usize> = (0..samples.len())
                .map(|_| rng.gen_range(0..samples.len()))
                .collect();
            let boot_samples: Vec<Vec<f64>> =
                bootstrap.iter().map(|&i| samples[i].clone()).collect();
            let boot_labels: Vec<u8> = bootstrap.iter().map(|&i| labels[i]).collect();

            let mut tree = DecisionTree::new(self.max_depth);
            tree.fit(&boot_samples, &boot_labels);
            self.trees.push(tree);
        }
    }

    /// Class probabilities `[p_failure, p_success]`.
    ///
    /// An unfitted forest predicts certain failure, matching the dummy-fit
    /// fallback contract.
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> [f64; 2] {
        if self.trees.is_empty() {
            return [1.0, 0.0];
        }
        #[allow(clippy::cast_precision_loss)]
        let p1 = self
            .trees
            .iter()
            .map(|t| t.predict_proba(features))
            .sum::<f64>()
            / self.trees.len() as f64;
        [1.0 - p1, p1]
    }

    /// Predicted class: 1 when success is at least as likely as failure.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features)[1] >= 0.5)
    }

    /// Importances averaged across trees, one entry per feature.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let n_features = self
            .trees
            .iter()
            .map(|t| t.feature_importances().len())
            .max()
            .unwrap_or(0);
        let mut totals = vec![0.0; n_features];

        for tree in &self.trees {
            for (i, &importance) in tree.feature_importances().iter().enumerate() {
                totals[i] += importance;
            }
        }

        if !self.trees.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let n = self.trees.len() as f64;
            for total in &mut totals {
                *total /= n;
            }
        }
        totals
    }

    /// Number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Separable data: feature 0 below 0 fails, above 0 succeeds.
    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let x = f64::from(i) - 10.0 + 0.5;
            samples.push(vec![x, 1.0]);
            labels.push(u8::from(x > 0.0));
        }
        (samples, labels)
    }

    #[test]
    fn test_tree_learns_separable_data() {
        let (samples, labels) = separable();
        let mut tree = DecisionTree::new(4);
        tree.fit(&samples, &labels);

        assert!(tree.predict_proba(&[5.0, 1.0]) > 0.5);
        assert!(tree.predict_proba(&[-5.0, 1.0]) < 0.5);
    }

    #[test]
    fn test_forest_probabilities_sum_to_one() {
        let (samples, labels) = separable();
        let mut forest = RandomForest::new(20, 4);
        forest.fit(&samples, &labels);

        let proba = forest.predict_proba(&[3.0, 1.0]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-9);
        assert_eq!(forest.predict(&[3.0, 1.0]), 1);
        assert_eq!(forest.predict(&[-3.0, 1.0]), 0);
    }

    #[test]
    fn test_informative_feature_gets_importance() {
        let (samples, labels) = separable();
        let mut forest = RandomForest::new(20, 4);
        forest.fit(&samples, &labels);

        let importances = forest.feature_importances();
        assert!(importances[0] > importances[1]);
        assert!(importances[1].abs() < f64::EPSILON);
    }

    #[test]
    fn test_unfitted_forest_predicts_failure() {
        let forest = RandomForest::default();
        assert_eq!(forest.predict_proba(&[1.0; 6]), [1.0, 0.0]);
        assert_eq!(forest.predict(&[1.0; 6]), 0);
    }

    #[test]
    fn test_single_dummy_sample() {
        let mut forest = RandomForest::new(10, 4);
        forest.fit(&[vec![0.0; 6]], &[0]);

        let proba = forest.predict_proba(&[0.0; 6]);
        assert!((proba[0] - 1.0).abs() < f64::EPSILON);
        assert_eq!(forest.n_trees(), 10);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let (samples, labels) = separable();
        let mut a = RandomForest::new(10, 4).with_seed(7);
        let mut b = RandomForest::new(10, 4).with_seed(7);
        a.fit(&samples, &labels);
        b.fit(&samples, &labels);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let (samples, labels) = separable();
        let mut forest = RandomForest::new(10, 4);
        forest.fit(&samples, &labels);

        let json = serde_json::to_vec(&forest).unwrap();
        let restored: RandomForest = serde_json::from_slice(&json).unwrap();
        assert_eq!(
            forest.predict_proba(&[2.0, 1.0]),
            restored.predict_proba(&[2.0, 1.0])
        );
    }
}
