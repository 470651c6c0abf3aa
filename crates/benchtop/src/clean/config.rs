//! Cleaning configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};

/// Fill strategy for missing numeric cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericImpute {
    #[default]
    Median,
    Mean,
    /// Fill with 0.
    Constant,
}

impl NumericImpute {
    pub fn label(&self) -> &'static str {
        match self {
            NumericImpute::Median => "median",
            NumericImpute::Mean => "mean",
            NumericImpute::Constant => "constant",
        }
    }
}

/// Fill strategy for missing categorical cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalImpute {
    /// Fill with the most frequent value.
    #[default]
    MostFrequent,
    /// Fill with the literal "Missing".
    Constant,
}

impl CategoricalImpute {
    pub fn label(&self) -> &'static str {
        match self {
            CategoricalImpute::MostFrequent => "most_frequent",
            CategoricalImpute::Constant => "constant",
        }
    }
}

/// Options for one cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Remove exact-duplicate rows.
    pub drop_duplicates: bool,
    /// Drop columns whose missing fraction exceeds this, in [0, 1].
    pub missing_threshold: f64,
    pub numeric_impute: NumericImpute,
    pub categorical_impute: CategoricalImpute,
    /// Try converting text columns to datetimes.
    pub parse_dates: bool,
    /// Clip numeric columns to their IQR fences.
    pub cap_outliers: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            missing_threshold: 1.0,
            numeric_impute: NumericImpute::Median,
            categorical_impute: CategoricalImpute::MostFrequent,
            parse_dates: true,
            cap_outliers: false,
        }
    }
}

impl CleaningConfig {
    /// Set duplicate removal.
    pub fn with_drop_duplicates(mut self, enabled: bool) -> Self {
        self.drop_duplicates = enabled;
        self
    }

    /// Set the column missingness threshold.
    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = threshold;
        self
    }

    /// Set the numeric fill strategy.
    pub fn with_numeric_impute(mut self, strategy: NumericImpute) -> Self {
        self.numeric_impute = strategy;
        self
    }

    /// Set the categorical fill strategy.
    pub fn with_categorical_impute(mut self, strategy: CategoricalImpute) -> Self {
        self.categorical_impute = strategy;
        self
    }

    /// Set date coercion.
    pub fn with_parse_dates(mut self, enabled: bool) -> Self {
        self.parse_dates = enabled;
        self
    }

    /// Set outlier capping.
    pub fn with_cap_outliers(mut self, enabled: bool) -> Self {
        self.cap_outliers = enabled;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.missing_threshold) {
            return Err(BenchtopError::Config(format!(
                "missing_threshold must be within [0, 1], got {}",
                self.missing_threshold
            )));
        }
        Ok(())
    }
}
