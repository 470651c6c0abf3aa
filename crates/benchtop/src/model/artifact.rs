//! Fitted model artifacts and their persistence.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BenchtopError, Result};
use crate::features::FittedFeaturePipeline;
use crate::table::Table;

use super::forest::RandomForest;
use super::linear::{LinearRegression, LogisticRegression};
use super::task::TaskType;

/// A fitted estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    LinearRegression(LinearRegression),
}

impl FittedModel {
    /// Human-readable estimator name.
    pub fn name(&self) -> &'static str {
        match self {
            FittedModel::RandomForest(_) => "random forest",
            FittedModel::LogisticRegression(_) => "logistic regression",
            FittedModel::LinearRegression(_) => "linear regression",
        }
    }

    /// Raw predictions: class indices for classifiers, values for regressors.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            FittedModel::RandomForest(model) => model.predict(x),
            FittedModel::LogisticRegression(model) => model.predict(x),
            FittedModel::LinearRegression(model) => model.predict(x),
        }
    }

    /// Feature importances, when the estimator has them.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        match self {
            FittedModel::RandomForest(model) => model.feature_importances(),
            _ => None,
        }
    }
}

/// Predictions mapped back to the target's domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predictions {
    /// Class labels, in the target's text form.
    Labels(Vec<String>),
    /// Regression values.
    Values(Vec<f64>),
}

impl Predictions {
    pub fn len(&self) -> usize {
        match self {
            Predictions::Labels(labels) => labels.len(),
            Predictions::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fitted estimator bound to the feature pipeline that produced its
/// inputs. It keeps no reference to the table it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Target column name.
    pub target: String,
    pub task: TaskType,
    pub features: FittedFeaturePipeline,
    pub model: FittedModel,
    /// Class labels by index (classification only), in sorted order.
    pub classes: Vec<String>,
    pub train_rows: usize,
    pub seed: u64,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    /// Predict for a table with the training feature columns.
    pub fn predict(&self, table: &Table) -> Result<Predictions> {
        let x = self.features.transform(table)?;
        let raw = self.model.predict(&x)?;
        match self.task {
            TaskType::Classification => raw
                .iter()
                .map(|&idx| {
                    self.classes.get(idx as usize).cloned().ok_or_else(|| {
                        BenchtopError::Fit(format!("Model predicted unknown class index {}", idx))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Predictions::Labels),
            TaskType::Regression => Ok(Predictions::Values(raw.to_vec())),
        }
    }

    /// Feature names paired with importances, most important first.
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.model.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .features
            .feature_names()
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Save the artifact as JSON.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a failed save never leaves a truncated artifact behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| {
            BenchtopError::Persistence(format!("Failed to serialize model artifact: {}", e))
        })?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), target = %self.target, "saved model artifact");
        Ok(())
    }

    /// Save under `<root>/models/model_<target>.json`, replacing any
    /// previous artifact for the same target.
    pub fn save_to(&self, output_root: impl AsRef<Path>) -> Result<PathBuf> {
        let path = model_path(output_root, &self.target);
        self.save(&path)?;
        Ok(path)
    }

    /// Load an artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            BenchtopError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            BenchtopError::Persistence(format!(
                "Failed to parse model artifact '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Path of the artifact for a target column.
pub fn model_path(output_root: impl AsRef<Path>, target: &str) -> PathBuf {
    output_root
        .as_ref()
        .join("models")
        .join(format!("model_{}.json", sanitize_file_stem(target)))
}

/// Make a column name safe to embed in a file name.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "target".to_string()
    } else {
        cleaned
    }
}

/// Write a file through a temporary sibling and an atomic rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                BenchtopError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BenchtopError::Persistence(format!("Invalid path '{}'", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        fs::rename(&tmp, path)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        BenchtopError::Persistence(format!("Failed to write '{}': {}", path.display(), e))
    })
}
