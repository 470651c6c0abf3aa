//! Model evaluation metrics.
//!
//! Every metric takes true and predicted values of equal, non-zero length.
//! Unequal lengths fail with [`BenchtopError::ShapeMismatch`], empty inputs
//! with [`BenchtopError::EmptyInput`].

mod classification;
mod regression;

use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};
use crate::model::{ModelArtifact, Predictions, SplitResult, TaskType, numeric_target};

pub use classification::{
    ClassificationMetrics, ConfusionMatrix, accuracy, confusion_matrix, f1_weighted,
};
pub use regression::{RegressionMetrics, r2, rmse};

/// Scores of a model on its held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum EvaluationMetrics {
    Classification(ClassificationMetrics),
    Regression(RegressionMetrics),
}

impl EvaluationMetrics {
    pub fn task(&self) -> TaskType {
        match self {
            EvaluationMetrics::Classification(_) => TaskType::Classification,
            EvaluationMetrics::Regression(_) => TaskType::Regression,
        }
    }

    /// Headline scores as (name, value) pairs.
    pub fn summary(&self) -> Vec<(&'static str, f64)> {
        match self {
            EvaluationMetrics::Classification(m) => {
                vec![("accuracy", m.accuracy), ("f1_weighted", m.f1_weighted)]
            }
            EvaluationMetrics::Regression(m) => vec![("rmse", m.rmse), ("r2", m.r2)],
        }
    }
}

/// Score an artifact on the test rows of a split.
pub fn evaluate(artifact: &ModelArtifact, split: &SplitResult) -> Result<EvaluationMetrics> {
    let predictions = artifact.predict(&split.x_test)?;
    match (artifact.task, predictions) {
        (TaskType::Classification, Predictions::Labels(predicted)) => {
            let actual: Vec<String> = split.y_test.values.iter().map(|v| v.to_string()).collect();
            ClassificationMetrics::with_classes(&actual, &predicted, &artifact.classes)
                .map(EvaluationMetrics::Classification)
        }
        (TaskType::Regression, Predictions::Values(predicted)) => {
            let actual = numeric_target(&split.y_test)?;
            RegressionMetrics::compute(&actual.to_vec(), &predicted)
                .map(EvaluationMetrics::Regression)
        }
        (task, _) => Err(BenchtopError::Fit(format!(
            "Predictions do not match the {} task",
            task.label()
        ))),
    }
}
