//! Column-wise feature pipeline.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clean::NumericImpute;
use crate::error::{BenchtopError, Result};
use crate::profile::{ColumnKind, TableProfile};
use crate::table::{Column, Table};
use crate::warning::{ColumnWarning, WarningKind};

use super::transformers::{CategoricalTransform, NumericTransform};

/// Options for building a feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Fill strategy for numeric columns.
    pub numeric_impute: NumericImpute,
    /// Standardize numeric columns after imputation.
    pub scale_numeric: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            numeric_impute: NumericImpute::Median,
            scale_numeric: true,
        }
    }
}

impl FeatureConfig {
    pub fn with_numeric_impute(mut self, strategy: NumericImpute) -> Self {
        self.numeric_impute = strategy;
        self
    }

    pub fn with_scaling(mut self, scale: bool) -> Self {
        self.scale_numeric = scale;
        self
    }
}

/// Groups feature columns by kind according to a table profile.
#[derive(Debug, Clone, Default)]
pub struct FeaturePipelineBuilder {
    config: FeatureConfig,
}

impl FeaturePipelineBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Plan a pipeline over the given feature columns.
    ///
    /// Numeric columns are imputed and optionally scaled, categorical
    /// columns are imputed and one-hot encoded, datetime columns are left
    /// out with a warning. A column the profile does not know fails with a
    /// schema mismatch.
    pub fn build(
        &self,
        profile: &TableProfile,
        feature_columns: &[&str],
    ) -> Result<FeaturePipeline> {
        let missing: Vec<String> = feature_columns
            .iter()
            .filter(|name| profile.column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BenchtopError::missing_columns(missing));
        }

        let mut pipeline = FeaturePipeline {
            config: self.config.clone(),
            numeric: Vec::new(),
            categorical: Vec::new(),
            warnings: Vec::new(),
        };

        for name in feature_columns {
            match profile.kind_of(name) {
                Some(ColumnKind::Numeric) => pipeline.numeric.push(name.to_string()),
                Some(ColumnKind::Categorical) => pipeline.categorical.push(name.to_string()),
                Some(ColumnKind::Datetime) | None => {
                    let message = format!("Datetime column '{}' is not used as a feature", name);
                    warn!(column = %name, "{}", message);
                    pipeline
                        .warnings
                        .push(ColumnWarning::new(*name, WarningKind::UnusedColumn, message));
                }
            }
        }

        debug!(
            numeric = pipeline.numeric.len(),
            categorical = pipeline.categorical.len(),
            "planned feature pipeline"
        );
        Ok(pipeline)
    }
}

/// An unfitted feature pipeline: which columns go through which transform.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: FeatureConfig,
    numeric: Vec<String>,
    categorical: Vec<String>,
    warnings: Vec<ColumnWarning>,
}

impl FeaturePipeline {
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical
    }

    /// Fit every transform on the training table. Consumes the plan, so a
    /// pipeline is fitted exactly once.
    pub fn fit(self, table: &Table) -> Result<FittedFeaturePipeline> {
        check_columns(
            table,
            self.numeric.iter().chain(&self.categorical).map(String::as_str),
        )?;

        let mut warnings = self.warnings;
        let mut numeric = Vec::with_capacity(self.numeric.len());
        for name in &self.numeric {
            let column = require(table, name)?;
            let (transform, fell_back) = NumericTransform::fit(
                column,
                self.config.numeric_impute,
                self.config.scale_numeric,
            )?;
            if fell_back {
                let message =
                    format!("Column '{}' has no finite training fill; filled with 0", name);
                warn!(column = %name, "{}", message);
                warnings.push(ColumnWarning::new(name.as_str(), WarningKind::Imputation, message));
            }
            numeric.push(transform);
        }

        let categorical: Vec<CategoricalTransform> = self
            .categorical
            .iter()
            .map(|name| require(table, name).map(CategoricalTransform::fit))
            .collect::<Result<_>>()?;

        let mut feature_names: Vec<String> = numeric.iter().map(|t| t.column.clone()).collect();
        for transform in &categorical {
            feature_names.extend(transform.feature_names());
        }

        info!(
            rows = table.row_count(),
            features = feature_names.len(),
            "fitted feature pipeline"
        );

        Ok(FittedFeaturePipeline {
            numeric,
            categorical,
            feature_names,
            warnings,
        })
    }
}

/// A fitted, immutable feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedFeaturePipeline {
    numeric: Vec<NumericTransform>,
    categorical: Vec<CategoricalTransform>,
    feature_names: Vec<String>,
    #[serde(default)]
    warnings: Vec<ColumnWarning>,
}

impl FittedFeaturePipeline {
    /// Output column names: numeric columns first, then one-hot columns.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Input columns the pipeline reads.
    pub fn input_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|t| t.column.as_str())
            .chain(self.categorical.iter().map(|t| t.column.as_str()))
            .collect()
    }

    pub fn numeric_transforms(&self) -> &[NumericTransform] {
        &self.numeric
    }

    pub fn categorical_transforms(&self) -> &[CategoricalTransform] {
        &self.categorical
    }

    /// Warnings raised while planning and fitting.
    pub fn warnings(&self) -> &[ColumnWarning] {
        &self.warnings
    }

    /// Transform a table into a feature matrix.
    ///
    /// Extra columns are ignored; a missing input column fails with a
    /// schema mismatch naming every absent column.
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>> {
        let inputs = self.input_columns();
        check_columns(table, inputs.iter().copied())?;

        let rows = table.row_count();
        let mut matrix = Array2::<f64>::zeros((rows, self.n_features()));
        let mut offset = 0;

        for transform in &self.numeric {
            let values = transform.apply(require(table, &transform.column)?)?;
            for (row, value) in values.into_iter().enumerate() {
                matrix[[row, offset]] = value;
            }
            offset += 1;
        }

        for transform in &self.categorical {
            let positions = transform.apply(require(table, &transform.column)?);
            for (row, position) in positions.into_iter().enumerate() {
                if let Some(position) = position {
                    matrix[[row, offset + position]] = 1.0;
                }
            }
            offset += transform.encoder.width();
        }

        Ok(matrix)
    }
}

fn check_columns<'a>(table: &Table, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let missing: Vec<String> = names
        .into_iter()
        .filter(|name| table.column(name).is_none())
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BenchtopError::missing_columns(missing))
    }
}

fn require<'t>(table: &'t Table, name: &str) -> Result<&'t Column> {
    table
        .column(name)
        .ok_or_else(|| BenchtopError::missing_columns(vec![name.to_string()]))
}
