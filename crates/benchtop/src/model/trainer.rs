//! Model training.

use std::collections::BTreeSet;

use chrono::Utc;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BenchtopError, Result};
use crate::features::{FeatureConfig, FeaturePipelineBuilder};
use crate::metrics::{EvaluationMetrics, evaluate};
use crate::profile::{Profiler, TableProfile};
use crate::table::{Column, Table};
use crate::warning::{ColumnWarning, WarningKind};

use super::artifact::{FittedModel, ModelArtifact};
use super::forest::RandomForest;
use super::linear::{LinearRegression, LogisticRegression};
use super::split::SplitResult;
use super::task::{TaskDetector, TaskSelection, TaskType};

/// Estimator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Random forest classifier or regressor.
    #[default]
    Auto,
    /// Same as `Auto`.
    RandomForest,
    /// Logistic regression for classification, least squares for
    /// regression.
    Linear,
}

/// Options for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Target column name.
    pub target: String,
    pub task: TaskSelection,
    /// Held-out fraction, in (0, 1).
    pub test_fraction: f64,
    pub seed: u64,
    pub model: ModelFamily,
    pub features: FeatureConfig,
    /// Feature columns; every non-target column when `None`.
    pub feature_columns: Option<Vec<String>>,
    /// Trees in a random forest.
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub detector: TaskDetector,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            task: TaskSelection::Auto,
            test_fraction: 0.2,
            seed: 42,
            model: ModelFamily::Auto,
            features: FeatureConfig::default(),
            feature_columns: None,
            n_estimators: 100,
            max_depth: None,
            detector: TaskDetector::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a configuration for a target column.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_task(mut self, task: TaskSelection) -> Self {
        self.task = task;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_model(mut self, model: ModelFamily) -> Self {
        self.model = model;
        self
    }

    pub fn with_scaling(mut self, scale: bool) -> Self {
        self.features.scale_numeric = scale;
        self
    }

    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = Some(columns);
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(BenchtopError::Config("A target column is required".to_string()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(BenchtopError::Config(format!(
                "test_fraction must be within (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.n_estimators == 0 {
            return Err(BenchtopError::Config("n_estimators must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(BenchtopError::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Everything a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub split: SplitResult,
    /// Held-out evaluation.
    pub metrics: EvaluationMetrics,
    /// Rows excluded because the target was missing.
    pub dropped_target_rows: usize,
    pub warnings: Vec<ColumnWarning>,
}

/// Fits a feature pipeline and estimator for one target column.
#[derive(Debug, Clone, Default)]
pub struct Trainer;

impl Trainer {
    pub fn new() -> Self {
        Self
    }

    /// Train on a table described by `profile`.
    ///
    /// Rows with a missing target are excluded, the remaining rows are
    /// split, the feature pipeline and estimator are fitted on the training
    /// rows only, and the held-out rows are scored.
    pub fn train(
        &self,
        table: &Table,
        profile: &TableProfile,
        config: &TrainingConfig,
    ) -> Result<TrainingOutcome> {
        config.validate()?;
        if table.column(&config.target).is_none() {
            return Err(BenchtopError::Config(format!(
                "Target column '{}' not found",
                config.target
            )));
        }

        let (normalized, mut warnings) = Profiler::new().normalize_mixed_types(table);
        let (features, target) = normalized.split_column(&config.target)?;

        let keep: Vec<usize> = (0..target.len()).filter(|&i| !target.values[i].is_null()).collect();
        let dropped_target_rows = target.len() - keep.len();
        let (features, target) = if dropped_target_rows > 0 {
            let message = format!(
                "Excluded {} rows with a missing '{}' value",
                dropped_target_rows, config.target
            );
            warn!(target = %config.target, dropped = dropped_target_rows, "{}", message);
            warnings.push(ColumnWarning::new(
                config.target.clone(),
                WarningKind::MissingTarget,
                message,
            ));
            (features.take_rows(&keep), target.take(&keep))
        } else {
            (features, target)
        };
        if target.is_empty() {
            return Err(BenchtopError::EmptyInput(format!(
                "Target column '{}' has no values",
                config.target
            )));
        }

        let task = config.detector.resolve(config.task, &target);
        let feature_columns: Vec<String> = match &config.feature_columns {
            Some(columns) => columns
                .iter()
                .filter(|c| **c != config.target)
                .cloned()
                .collect(),
            None => features.column_names().iter().map(|c| c.to_string()).collect(),
        };
        let feature_refs: Vec<&str> = feature_columns.iter().map(String::as_str).collect();

        info!(
            target = %config.target,
            task = task.label(),
            rows = target.len(),
            features = feature_refs.len(),
            "training model"
        );

        let split = SplitResult::new(&features, &target, config.test_fraction, config.seed)?;
        let pipeline = FeaturePipelineBuilder::new(config.features.clone())
            .build(profile, &feature_refs)?
            .fit(&split.x_train)?;
        warnings.extend(pipeline.warnings().iter().cloned());
        let x_train = pipeline.transform(&split.x_train)?;

        let (model, classes) = match task {
            TaskType::Classification => {
                let classes = class_labels(&split.y_train);
                if classes.len() < 2 {
                    return Err(BenchtopError::Fit(format!(
                        "Classification needs at least 2 classes in the training split, found {}",
                        classes.len()
                    )));
                }
                let y = encode_labels(&split.y_train, &classes);
                let model = match config.model {
                    ModelFamily::Auto | ModelFamily::RandomForest => {
                        let mut forest =
                            RandomForest::new_classifier(config.n_estimators, classes.len())
                                .with_max_depth(config.max_depth)
                                .with_random_state(config.seed);
                        forest.fit(&x_train, &y)?;
                        FittedModel::RandomForest(forest)
                    }
                    ModelFamily::Linear => {
                        let mut logistic = LogisticRegression::new(classes.len());
                        logistic.fit(&x_train, &y)?;
                        FittedModel::LogisticRegression(logistic)
                    }
                };
                (model, classes)
            }
            TaskType::Regression => {
                let y = numeric_target(&split.y_train)?;
                let model = match config.model {
                    ModelFamily::Auto | ModelFamily::RandomForest => {
                        let mut forest = RandomForest::new_regressor(config.n_estimators)
                            .with_max_depth(config.max_depth)
                            .with_random_state(config.seed);
                        forest.fit(&x_train, &y)?;
                        FittedModel::RandomForest(forest)
                    }
                    ModelFamily::Linear => {
                        let mut linear = LinearRegression::new();
                        linear.fit(&x_train, &y)?;
                        FittedModel::LinearRegression(linear)
                    }
                };
                (model, Vec::new())
            }
        };

        let artifact = ModelArtifact {
            target: config.target.clone(),
            task,
            features: pipeline,
            model,
            classes,
            train_rows: split.train_rows(),
            seed: config.seed,
            trained_at: Utc::now(),
        };
        let metrics = evaluate(&artifact, &split)?;
        info!(
            target = %config.target,
            model = artifact.model.name(),
            train_rows = split.train_rows(),
            test_rows = split.test_rows(),
            "trained model"
        );

        Ok(TrainingOutcome {
            artifact,
            split,
            metrics,
            dropped_target_rows,
            warnings,
        })
    }
}

/// Sorted distinct labels of a target column in text form. Labels sort
/// numerically when every label is a number, lexicographically otherwise.
pub fn class_labels(target: &Column) -> Vec<String> {
    let labels: BTreeSet<String> = target
        .values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect();
    let mut labels: Vec<String> = labels.into_iter().collect();
    sort_labels(&mut labels);
    labels
}

/// Sort labels numerically if all parse as numbers, else lexicographically.
pub fn sort_labels(labels: &mut [String]) {
    let numeric: Option<Vec<f64>> = labels.iter().map(|l| l.parse::<f64>().ok()).collect();
    if numeric.is_some() {
        labels.sort_by(|a, b| {
            let a = a.parse::<f64>().unwrap_or(0.0);
            let b = b.parse::<f64>().unwrap_or(0.0);
            a.total_cmp(&b)
        });
    } else {
        labels.sort();
    }
}

fn encode_labels(target: &Column, classes: &[String]) -> Array1<f64> {
    target
        .values
        .iter()
        .map(|v| {
            let label = v.to_string();
            classes.iter().position(|c| *c == label).unwrap_or(0) as f64
        })
        .collect()
}

/// Target values as numbers; numeric text is accepted.
pub(crate) fn numeric_target(target: &Column) -> Result<Array1<f64>> {
    target
        .values
        .iter()
        .map(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .ok_or_else(|| {
                    BenchtopError::Config(format!(
                        "Regression target '{}' holds a non-numeric value '{}'",
                        target.name, v
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification_table() -> Table {
        let n = 60;
        Table::new(vec![
            Column::numeric("x", (0..n).map(|i| Some(i as f64))),
            Column::text(
                "group",
                (0..n).map(|i| Some(if i % 2 == 0 { "even" } else { "odd" })),
            ),
            Column::text(
                "label",
                (0..n).map(|i| Some(if i < n / 2 { "low" } else { "high" })),
            ),
        ])
        .unwrap()
    }

    fn regression_table() -> Table {
        let n = 80;
        Table::new(vec![
            Column::numeric("x", (0..n).map(|i| Some(i as f64))),
            Column::numeric("noise", (0..n).map(|i| Some(((i * 7) % 5) as f64))),
            Column::numeric("y", (0..n).map(|i| Some(3.0 * i as f64 + 2.0))),
        ])
        .unwrap()
    }

    fn train(table: &Table, config: &TrainingConfig) -> Result<TrainingOutcome> {
        let profile = Profiler::new().profile(table);
        Trainer::new().train(table, &profile, config)
    }

    #[test]
    fn test_auto_classification_with_forest() {
        let table = classification_table();
        let config = TrainingConfig::new("label").with_n_estimators(10);
        let outcome = train(&table, &config).unwrap();

        assert_eq!(outcome.artifact.task, TaskType::Classification);
        assert_eq!(outcome.artifact.classes, vec!["high", "low"]);
        assert_eq!(outcome.split.test_rows(), 12);
        assert_eq!(outcome.split.train_rows(), 48);
        match &outcome.metrics {
            EvaluationMetrics::Classification(m) => assert!(m.accuracy >= 0.9),
            other => panic!("expected classification metrics, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_regression_family() {
        let table = regression_table();
        let config = TrainingConfig::new("y").with_model(ModelFamily::Linear);
        let outcome = train(&table, &config).unwrap();

        assert_eq!(outcome.artifact.task, TaskType::Regression);
        assert_eq!(outcome.artifact.model.name(), "linear regression");
        match &outcome.metrics {
            EvaluationMetrics::Regression(m) => {
                assert!(m.rmse < 1e-6);
                assert!(m.r2 > 0.999);
            }
            other => panic!("expected regression metrics, got {:?}", other),
        }
    }

    #[test]
    fn test_logistic_family() {
        let table = classification_table();
        let config = TrainingConfig::new("label").with_model(ModelFamily::Linear);
        let outcome = train(&table, &config).unwrap();
        assert_eq!(outcome.artifact.model.name(), "logistic regression");
    }

    #[test]
    fn test_same_seed_same_artifact() {
        let table = classification_table();
        let config = TrainingConfig::new("label").with_n_estimators(5);
        let a = train(&table, &config).unwrap();
        let b = train(&table, &config).unwrap();
        assert_eq!(a.split, b.split);
        assert_eq!(a.artifact.model, b.artifact.model);
        assert_eq!(a.artifact.features, b.artifact.features);
    }

    #[test]
    fn test_missing_target_rows_are_dropped() {
        let table = Table::new(vec![
            Column::numeric("x", (0..20).map(|i| Some(i as f64))),
            Column::numeric(
                "y",
                (0..20).map(|i| if i % 5 == 0 { None } else { Some(i as f64 * 1.5) }),
            ),
        ])
        .unwrap();
        let config = TrainingConfig::new("y")
            .with_task(TaskSelection::Regression)
            .with_n_estimators(5);
        let outcome = train(&table, &config).unwrap();
        assert_eq!(outcome.dropped_target_rows, 4);
        assert_eq!(outcome.split.train_rows() + outcome.split.test_rows(), 16);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::MissingTarget));
    }

    #[test]
    fn test_single_class_is_fit_error() {
        let table = Table::new(vec![
            Column::numeric("x", (0..10).map(|i| Some(i as f64))),
            Column::text("label", (0..10).map(|_| Some("only"))),
        ])
        .unwrap();
        let result = train(&table, &TrainingConfig::new("label"));
        assert!(matches!(result, Err(BenchtopError::Fit(_))));
    }

    #[test]
    fn test_config_errors() {
        let table = regression_table();
        assert!(matches!(
            train(&table, &TrainingConfig::new("missing")),
            Err(BenchtopError::Config(_))
        ));
        assert!(matches!(
            train(&table, &TrainingConfig::new("y").with_test_fraction(1.0)),
            Err(BenchtopError::Config(_))
        ));
        assert!(matches!(
            train(&table, &TrainingConfig::default()),
            Err(BenchtopError::Config(_))
        ));
    }

    #[test]
    fn test_forced_regression_on_text_fails() {
        let table = classification_table();
        let config = TrainingConfig::new("label").with_task(TaskSelection::Regression);
        assert!(matches!(train(&table, &config), Err(BenchtopError::Config(_))));
    }

    #[test]
    fn test_class_label_order() {
        let column = Column::numeric("y", [Some(10.0), Some(2.0), Some(1.0), Some(2.0)]);
        assert_eq!(class_labels(&column), vec!["1", "2", "10"]);

        let column = Column::text("y", [Some("b"), Some("a"), Some("B")]);
        assert_eq!(class_labels(&column), vec!["B", "a", "b"]);
    }
}
