//! CART decision trees.

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Gini impurity over class indices (classification)
    Gini,
    /// Mean squared error (regression)
    Mse,
}

/// Decision tree model.
///
/// Classification targets are class indices `0..n_classes` stored as f64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split (all when `None`)
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    /// Seed for feature sampling
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self::with_criterion(Criterion::Gini)
    }

    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self::with_criterion(Criterion::Mse)
    }

    fn with_criterion(criterion: Criterion) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion,
            random_state: 0,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fix the number of classes instead of deriving it from the labels.
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    fn is_classifier(&self) -> bool {
        self.criterion == Criterion::Gini
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(BenchtopError::length_mismatch(n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(BenchtopError::Fit("Cannot fit a tree on zero samples".to_string()));
        }

        self.n_features = x.ncols();
        if self.is_classifier() {
            let needed = y.iter().fold(0.0f64, |m, &v| m.max(v)) as usize + 1;
            self.n_classes = self.n_classes.max(needed);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let leaf = || TreeNode::Leaf {
            value: self.leaf_value(y, indices),
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || is_pure(y, indices);
        if should_stop {
            return leaf();
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, rng) else {
            return leaf();
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Best (feature, threshold, impurity decrease) over a random subset of
    /// features, scanning each feature's sorted values once.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let features: Vec<usize> = if n_try < n_features {
            rand::seq::index::sample(rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let n = indices.len() as f64;
        let parent = self.impurity_of(y, indices);
        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in features {
            let mut samples: Vec<(f64, f64)> =
                indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = SplitStats::new(self.n_classes);
            let mut right = SplitStats::new(self.n_classes);
            for &(_, yi) in &samples {
                right.add(yi, self.is_classifier());
            }

            for i in 0..samples.len() - 1 {
                let (xi, yi) = samples[i];
                left.add(yi, self.is_classifier());
                right.remove(yi, self.is_classifier());

                if xi == samples[i + 1].0 {
                    continue;
                }
                if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left.count as f64 * left.impurity(self.criterion)
                    + right.count as f64 * right.impurity(self.criterion))
                    / n;
                let gain = parent - weighted;
                if gain > best.map_or(0.0, |b| b.2) {
                    best = Some((feature_idx, (xi + samples[i + 1].0) / 2.0, gain));
                }
            }
        }

        best
    }

    fn impurity_of(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        let mut stats = SplitStats::new(self.n_classes);
        for &i in indices {
            stats.add(y[i], self.is_classifier());
        }
        stats.impurity(self.criterion)
    }

    fn leaf_value(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        if self.is_classifier() {
            let mut counts = vec![0usize; self.n_classes];
            for &i in indices {
                counts[y[i] as usize] += 1;
            }
            majority(&counts) as f64
        } else if indices.is_empty() {
            0.0
        } else {
            indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
        }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| BenchtopError::Fit("Decision tree is not fitted".to_string()))?;
        if x.ncols() != self.n_features {
            return Err(BenchtopError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if row[*feature_idx] <= *threshold { &**left } else { &**right };
                        }
                    }
                }
            })
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the fitted tree (0 for a single leaf).
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map(node_depth).unwrap_or(0)
    }
}

/// Index of the largest count; ties resolve to the lowest index.
pub(crate) fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        Some(&first) => indices.iter().all(|&i| y[i] == y[first]),
        None => true,
    }
}

/// Running statistics for one side of a candidate split.
struct SplitStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
    class_counts: Vec<usize>,
}

impl SplitStats {
    fn new(n_classes: usize) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sq_sum: 0.0,
            class_counts: vec![0; n_classes],
        }
    }

    fn add(&mut self, y: f64, classes: bool) {
        self.count += 1;
        if classes {
            self.class_counts[y as usize] += 1;
        } else {
            self.sum += y;
            self.sq_sum += y * y;
        }
    }

    fn remove(&mut self, y: f64, classes: bool) {
        self.count -= 1;
        if classes {
            self.class_counts[y as usize] -= 1;
        } else {
            self.sum -= y;
            self.sq_sum -= y * y;
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        match criterion {
            Criterion::Gini => {
                1.0 - self
                    .class_counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Mse => {
                let mean = self.sum / n;
                (self.sq_sum / n - mean * mean).max(0.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 1.0], [4.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new_classifier();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&array![[2.5], [11.5]]).unwrap();
        assert_eq!(pred, array![1.0, 5.0]);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new_classifier().with_max_depth(Some(1));
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[0.0, 5.0], [0.0, 1.0], [1.0, 5.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut tree = DecisionTree::new_classifier();
        tree.fit(&x, &y).unwrap();
        let imp = tree.feature_importances().unwrap();
        assert_eq!(imp[0], 1.0);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let tree = DecisionTree::new_regressor();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(BenchtopError::Fit(_))));

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0, 2.0]]),
            Err(BenchtopError::ShapeMismatch { .. })
        ));
        assert!(tree.fit(&array![[1.0]], &array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_majority_ties_to_lowest() {
        assert_eq!(majority(&[2, 3, 3]), 1);
        assert_eq!(majority(&[0, 0]), 0);
    }
}
