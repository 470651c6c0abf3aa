//! Seeded train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};
use crate::table::{Column, Table};

/// Row indices of a train/test partition.
///
/// The test set holds `ceil(test_fraction * n)` rows. Rows are shuffled with
/// a ChaCha8 generator seeded from `seed`, so the same inputs always give the
/// same partition.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(BenchtopError::Config(format!(
            "test_fraction must be within (0, 1), got {}",
            test_fraction
        )));
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(BenchtopError::Config(format!(
            "Cannot split {} rows with test_fraction {}: both sets need at least one row",
            n, test_fraction
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let test = order[..n_test].to_vec();
    let train = order[n_test..].to_vec();
    Ok((train, test))
}

/// Held-out partition of the feature table and target produced by one
/// training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    pub x_train: Table,
    pub x_test: Table,
    pub y_train: Column,
    pub y_test: Column,
    pub test_fraction: f64,
    pub seed: u64,
}

impl SplitResult {
    /// Partition features and target with the same row assignment.
    pub fn new(features: &Table, target: &Column, test_fraction: f64, seed: u64) -> Result<Self> {
        if features.row_count() != target.len() {
            return Err(BenchtopError::length_mismatch(features.row_count(), target.len()));
        }
        let (train, test) = split_indices(target.len(), test_fraction, seed)?;
        Ok(Self {
            x_train: features.take_rows(&train),
            x_test: features.take_rows(&test),
            y_train: target.take(&train),
            y_test: target.take(&test),
            test_fraction,
            seed,
        })
    }

    pub fn train_rows(&self) -> usize {
        self.y_train.len()
    }

    pub fn test_rows(&self) -> usize {
        self.y_test.len()
    }
}
