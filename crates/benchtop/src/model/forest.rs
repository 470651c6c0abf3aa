//! Random forests.

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BenchtopError, Result};

use super::tree::{DecisionTree, majority};

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// All features
    All,
}

/// Bagged ensemble of decision trees.
///
/// Tree `i` draws its bootstrap sample and split features from a ChaCha8
/// generator seeded with `random_state + i`, so a forest is reproducible
/// from its seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: u64,
    is_classification: bool,
    n_classes: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl RandomForest {
    /// Create a classifier over `n_classes` class indices
    pub fn new_classifier(n_estimators: usize, n_classes: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
            is_classification: true,
            n_classes,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Create a regressor
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            max_features: MaxFeatures::All,
            is_classification: false,
            n_classes: 0,
            ..Self::new_classifier(n_estimators, 0)
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(BenchtopError::length_mismatch(n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(BenchtopError::Fit("Cannot fit a forest on zero samples".to_string()));
        }
        if self.n_estimators == 0 {
            return Err(BenchtopError::Config("n_estimators must be at least 1".to_string()));
        }

        self.n_features = x.ncols();
        let max_features = self.compute_max_features(self.n_features);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let seed = self.random_state.wrapping_add(tree_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let sample_indices: Vec<usize> = if self.bootstrap {
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };
            let x_boot = x.select(Axis(0), &sample_indices);
            let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();

            let mut tree = if self.is_classification {
                DecisionTree::new_classifier().with_n_classes(self.n_classes)
            } else {
                DecisionTree::new_regressor()
            }
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(Some(max_features))
            .with_random_state(rng.next_u64());

            tree.fit(&x_boot, &y_boot)?;
            trees.push(tree);
        }
        self.trees = trees;
        self.compute_feature_importances();

        debug!(
            trees = self.trees.len(),
            samples = n_samples,
            features = self.n_features,
            max_features,
            "fitted random forest"
        );
        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Make predictions: majority vote for classification (ties to the
    /// lowest class index), mean for regression
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(BenchtopError::Fit("Random forest is not fitted".to_string()));
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;

        let n_samples = x.nrows();
        let predictions = if self.is_classification {
            (0..n_samples)
                .map(|i| {
                    let mut votes = vec![0usize; self.n_classes.max(1)];
                    for preds in &all_predictions {
                        if let Some(slot) = votes.get_mut(preds[i] as usize) {
                            *slot += 1;
                        }
                    }
                    majority(&votes) as f64
                })
                .collect()
        } else {
            (0..n_samples)
                .map(|i| {
                    all_predictions.iter().map(|p| p[i]).sum::<f64>() / all_predictions.len() as f64
                })
                .collect()
        };

        Ok(predictions)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
