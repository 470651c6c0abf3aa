//! Per-column warnings recorded by pipeline stages.

use serde::{Deserialize, Serialize};

/// What kind of condition a warning describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A text column holds more than one element type.
    MixedTypes,
    /// Date coercion could not be applied to a column.
    DateCoercion,
    /// Imputation fell back to a default fill value.
    Imputation,
    /// Outlier capping was skipped for a column.
    OutlierCapping,
    /// Rows without a target value were excluded.
    MissingTarget,
    /// A column was not used by the feature pipeline.
    UnusedColumn,
}

impl WarningKind {
    /// Get a human-readable label for the warning kind.
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::MixedTypes => "Mixed Types",
            WarningKind::DateCoercion => "Date Coercion",
            WarningKind::Imputation => "Imputation",
            WarningKind::OutlierCapping => "Outlier Capping",
            WarningKind::MissingTarget => "Missing Target",
            WarningKind::UnusedColumn => "Unused Column",
        }
    }
}

/// A warning attached to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnWarning {
    /// Column the warning is about.
    pub column: String,
    /// Warning kind.
    pub kind: WarningKind,
    /// Human-readable description.
    pub message: String,
}

impl ColumnWarning {
    /// Create a new warning.
    pub fn new(column: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind,
            message: message.into(),
        }
    }
}
