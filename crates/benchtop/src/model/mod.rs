//! Task detection, model training and fitted artifacts.
//!
//! Estimators are implemented over `ndarray` matrices. Every source of
//! randomness (the train/test split, bootstrap samples, split features) is
//! a ChaCha8 generator derived from the configured seed, so a training run
//! is reproducible.

mod artifact;
mod forest;
mod linear;
mod split;
mod task;
mod trainer;
mod tree;

pub use artifact::{FittedModel, ModelArtifact, Predictions, model_path, sanitize_file_stem};
pub(crate) use artifact::write_atomic;
pub use forest::{MaxFeatures, RandomForest};
pub use linear::{LinearRegression, LogisticRegression};
pub use split::{SplitResult, split_indices};
pub use task::{TaskDetector, TaskSelection, TaskType};
pub(crate) use trainer::numeric_target;
pub use trainer::{ModelFamily, Trainer, TrainingConfig, TrainingOutcome, class_labels, sort_labels};
pub use tree::{Criterion, DecisionTree, TreeNode};
