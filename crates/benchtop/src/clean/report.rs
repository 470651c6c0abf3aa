//! What a cleaning run changed.

use serde::{Deserialize, Serialize};

use crate::table::format_number;
use crate::warning::ColumnWarning;

/// One change applied by the cleaning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CleaningChange {
    /// A text column was converted to datetimes.
    CoerceDates {
        column: String,
        valid_fraction: f64,
    },

    /// Exact-duplicate rows were removed.
    RemoveDuplicates { rows: usize },

    /// A column exceeded the missingness threshold.
    DropColumn {
        column: String,
        missing_fraction: f64,
    },

    /// Missing cells were filled.
    Impute {
        column: String,
        strategy: String,
        fill: String,
        filled: usize,
    },

    /// Values were clipped to the IQR fences.
    CapOutliers {
        column: String,
        lower: f64,
        upper: f64,
        capped: usize,
    },
}

impl CleaningChange {
    /// Get a human-readable description of the change.
    pub fn description(&self) -> String {
        match self {
            CleaningChange::CoerceDates {
                column,
                valid_fraction,
            } => format!(
                "Converted '{}' to datetime ({:.0}% parsed)",
                column,
                valid_fraction * 100.0
            ),
            CleaningChange::RemoveDuplicates { rows } => {
                format!("Removed {} duplicate rows", rows)
            }
            CleaningChange::DropColumn {
                column,
                missing_fraction,
            } => format!(
                "Dropped '{}' ({:.1}% missing)",
                column,
                missing_fraction * 100.0
            ),
            CleaningChange::Impute {
                column,
                strategy,
                fill,
                filled,
            } => format!(
                "Filled {} missing values in '{}' with '{}' ({})",
                filled, column, fill, strategy
            ),
            CleaningChange::CapOutliers {
                column,
                lower,
                upper,
                capped,
            } => format!(
                "Capped {} values in '{}' to [{}, {}]",
                capped,
                column,
                format_number(*lower),
                format_number(*upper)
            ),
        }
    }
}

/// A date coercion that was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercedColumn {
    pub name: String,
    pub parsed: usize,
    pub valid_fraction: f64,
}

/// Why a date coercion was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionFailureReason {
    /// No cell parsed as a date.
    NotDates,
    /// Some cells parsed, but not more than the acceptance fraction.
    BelowThreshold,
}

/// A date coercion that was rejected; the column is left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionFailure {
    pub name: String,
    pub valid_fraction: f64,
    pub reason: CoercionFailureReason,
}

/// Summary of a cleaning run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Changes in the order they were applied.
    pub changes: Vec<CleaningChange>,
    /// Text columns left unconverted by date coercion.
    pub coercion_failures: Vec<CoercionFailure>,
    /// Per-column faults that were isolated.
    pub warnings: Vec<ColumnWarning>,
}

impl CleaningReport {
    /// Record a change.
    pub fn add_change(&mut self, change: CleaningChange) {
        self.changes.push(change);
    }

    /// Rows removed as duplicates.
    pub fn duplicates_removed(&self) -> usize {
        self.changes
            .iter()
            .map(|c| match c {
                CleaningChange::RemoveDuplicates { rows } => *rows,
                _ => 0,
            })
            .sum()
    }

    /// Names of columns dropped by the missingness threshold.
    pub fn dropped_columns(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                CleaningChange::DropColumn { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of columns converted to datetimes.
    pub fn coerced_columns(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                CleaningChange::CoerceDates { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Total cells filled by imputation.
    pub fn values_imputed(&self) -> usize {
        self.changes
            .iter()
            .map(|c| match c {
                CleaningChange::Impute { filled, .. } => *filled,
                _ => 0,
            })
            .sum()
    }

    /// Total values clipped by outlier capping.
    pub fn values_capped(&self) -> usize {
        self.changes
            .iter()
            .map(|c| match c {
                CleaningChange::CapOutliers { capped, .. } => *capped,
                _ => 0,
            })
            .sum()
    }
}
