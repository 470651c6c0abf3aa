//! The cleaning engine.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::profile::{DATE_ACCEPT_FRACTION, DateParse, NumericSummary, mean, median};
use crate::table::{Column, StorageType, Table, Value, format_number};
use crate::warning::{ColumnWarning, WarningKind};

use super::config::{CategoricalImpute, CleaningConfig, NumericImpute};
use super::report::{
    CleaningChange, CleaningReport, CoercedColumn, CoercionFailure, CoercionFailureReason,
};

/// Fill value for categorical cells without a usable mode.
pub const MISSING_LABEL: &str = "Missing";

/// Multiplier applied to the IQR when capping outliers.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// A cleaned table together with what was done to it.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: Table,
    pub report: CleaningReport,
}

/// Engine applying the cleaning steps in a fixed order: date coercion,
/// deduplication, column pruning, numeric imputation, categorical
/// imputation, outlier capping.
#[derive(Debug, Clone, Default)]
pub struct CleaningEngine;

impl CleaningEngine {
    /// Create a new cleaning engine.
    pub fn new() -> Self {
        Self
    }

    /// Clean a table. The input is left untouched.
    ///
    /// Only an invalid configuration fails the whole run; problems with a
    /// single column are recorded as warnings and the remaining columns are
    /// still processed.
    pub fn clean(&self, table: &Table, config: &CleaningConfig) -> Result<CleaningOutcome> {
        config.validate()?;
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "cleaning table"
        );

        let mut report = CleaningReport {
            rows_before: table.row_count(),
            columns_before: table.column_count(),
            ..Default::default()
        };

        let mut current = table.clone();
        if config.parse_dates {
            current = self.coerce_dates(&current, &mut report);
        }
        if config.drop_duplicates {
            current = self.remove_duplicates(&current, &mut report);
        }
        current = self.prune_columns(&current, config.missing_threshold, &mut report);

        let mut columns = current.into_columns();
        for column in columns.iter_mut() {
            match column.storage {
                StorageType::Numeric => {
                    self.impute_numeric(column, config.numeric_impute, &mut report)
                }
                StorageType::Text => {
                    self.impute_categorical(column, config.categorical_impute, &mut report)
                }
                StorageType::DateTime => {}
            }
        }
        if config.cap_outliers {
            for column in columns.iter_mut().filter(|c| c.storage.is_numeric()) {
                self.cap_outliers(column, &mut report);
            }
        }

        let table = Table::new(columns)?;
        report.rows_after = table.row_count();
        report.columns_after = table.column_count();
        info!(
            rows = report.rows_after,
            columns = report.columns_after,
            changes = report.changes.len(),
            warnings = report.warnings.len(),
            "cleaned table"
        );

        Ok(CleaningOutcome { table, report })
    }

    fn coerce_dates(&self, table: &Table, report: &mut CleaningReport) -> Table {
        let mut current = table.clone();
        for (index, column) in table.columns().iter().enumerate() {
            if column.storage != StorageType::Text {
                continue;
            }
            match coerce_to_datetime(column) {
                Ok((coerced, summary)) => {
                    debug!(
                        column = %summary.name,
                        fraction = summary.valid_fraction,
                        "coerced to datetime"
                    );
                    report.add_change(CleaningChange::CoerceDates {
                        column: summary.name,
                        valid_fraction: summary.valid_fraction,
                    });
                    current = current.with_column_at(index, coerced);
                }
                Err(failure) => {
                    if failure.reason == CoercionFailureReason::BelowThreshold {
                        let message = format!(
                            "Only {:.0}% of '{}' parse as dates; left as text",
                            failure.valid_fraction * 100.0,
                            failure.name
                        );
                        warn!(column = %failure.name, "{}", message);
                        report.warnings.push(ColumnWarning::new(
                            failure.name.clone(),
                            WarningKind::DateCoercion,
                            message,
                        ));
                    }
                    report.coercion_failures.push(failure);
                }
            }
        }
        current
    }

    fn remove_duplicates(&self, table: &Table, report: &mut CleaningReport) -> Table {
        let mut seen = HashSet::new();
        let keep: Vec<usize> = (0..table.row_count())
            .filter(|&row| seen.insert(table.row_key(row)))
            .collect();

        let removed = table.row_count() - keep.len();
        if removed == 0 {
            return table.clone();
        }
        debug!(removed, "removed duplicate rows");
        report.add_change(CleaningChange::RemoveDuplicates { rows: removed });
        table.take_rows(&keep)
    }

    fn prune_columns(&self, table: &Table, threshold: f64, report: &mut CleaningReport) -> Table {
        let mut dropped = Vec::new();
        for column in table.columns() {
            let missing_fraction = column.missing_fraction();
            if missing_fraction > threshold {
                debug!(column = %column.name, missing_fraction, "dropping column");
                report.add_change(CleaningChange::DropColumn {
                    column: column.name.clone(),
                    missing_fraction,
                });
                dropped.push(column.name.as_str());
            }
        }
        table.drop_columns(&dropped)
    }

    fn impute_numeric(
        &self,
        column: &mut Column,
        strategy: NumericImpute,
        report: &mut CleaningReport,
    ) {
        let filled = column.null_count();
        if filled == 0 {
            return;
        }

        let numbers = column.numbers();
        let fill = match strategy {
            NumericImpute::Median => median(&numbers),
            NumericImpute::Mean => (!numbers.is_empty()).then(|| mean(&numbers)),
            NumericImpute::Constant => Some(0.0),
        };
        let fill = match fill {
            Some(fill) if fill.is_finite() => fill,
            other => {
                let message = match other {
                    Some(fill) => format!(
                        "Column '{}' has a non-finite {} ({}); filled with 0",
                        column.name,
                        strategy.label(),
                        fill
                    ),
                    None => format!(
                        "Column '{}' has no values to take a {} from; filled with 0",
                        column.name,
                        strategy.label()
                    ),
                };
                warn!(column = %column.name, "{}", message);
                report.warnings.push(ColumnWarning::new(
                    column.name.clone(),
                    WarningKind::Imputation,
                    message,
                ));
                0.0
            }
        };

        for value in column.values.iter_mut().filter(|v| v.is_null()) {
            *value = Value::Number(fill);
        }
        report.add_change(CleaningChange::Impute {
            column: column.name.clone(),
            strategy: strategy.label().to_string(),
            fill: format_number(fill),
            filled,
        });
    }

    fn impute_categorical(
        &self,
        column: &mut Column,
        strategy: CategoricalImpute,
        report: &mut CleaningReport,
    ) {
        let filled = column.null_count();
        if filled == 0 {
            return;
        }

        let fill = match strategy {
            CategoricalImpute::MostFrequent => match column.mode() {
                Some(mode) => mode.clone(),
                None => {
                    let message = format!(
                        "Column '{}' has no most frequent value; filled with '{}'",
                        column.name, MISSING_LABEL
                    );
                    warn!(column = %column.name, "{}", message);
                    report.warnings.push(ColumnWarning::new(
                        column.name.clone(),
                        WarningKind::Imputation,
                        message,
                    ));
                    Value::text(MISSING_LABEL)
                }
            },
            CategoricalImpute::Constant => Value::text(MISSING_LABEL),
        };

        for value in column.values.iter_mut().filter(|v| v.is_null()) {
            *value = fill.clone();
        }
        report.add_change(CleaningChange::Impute {
            column: column.name.clone(),
            strategy: strategy.label().to_string(),
            fill: fill.to_string(),
            filled,
        });
    }

    fn cap_outliers(&self, column: &mut Column, report: &mut CleaningReport) {
        let Some(summary) = NumericSummary::from_values(&column.numbers()) else {
            let message = format!("Column '{}' has no values; capping skipped", column.name);
            warn!(column = %column.name, "{}", message);
            report.warnings.push(ColumnWarning::new(
                column.name.clone(),
                WarningKind::OutlierCapping,
                message,
            ));
            return;
        };

        let (lower, upper) = summary.fences(IQR_MULTIPLIER);
        if !lower.is_finite() || !upper.is_finite() {
            let message = format!(
                "Column '{}' has non-finite quartiles; capping skipped",
                column.name
            );
            warn!(column = %column.name, "{}", message);
            report.warnings.push(ColumnWarning::new(
                column.name.clone(),
                WarningKind::OutlierCapping,
                message,
            ));
            return;
        }

        let mut capped = 0;
        for value in column.values.iter_mut() {
            if let Value::Number(n) = value {
                let clipped = n.clamp(lower, upper);
                if clipped != *n {
                    *n = clipped;
                    capped += 1;
                }
            }
        }

        debug!(column = %column.name, lower, upper, capped, "capped outliers");
        if capped > 0 {
            report.add_change(CleaningChange::CapOutliers {
                column: column.name.clone(),
                lower,
                upper,
                capped,
            });
        }
    }
}

/// Try converting a text column to datetimes.
///
/// The conversion is accepted only when more than
/// [`DATE_ACCEPT_FRACTION`] of all rows parse; cells that fail to parse
/// become missing.
pub fn coerce_to_datetime(
    column: &Column,
) -> std::result::Result<(Column, CoercedColumn), CoercionFailure> {
    let parse = DateParse::attempt(column);
    let valid_fraction = parse.valid_fraction;

    if valid_fraction > DATE_ACCEPT_FRACTION {
        let summary = CoercedColumn {
            name: column.name.clone(),
            parsed: parse.parsed,
            valid_fraction,
        };
        return Ok((parse.into_column(column.name.clone()), summary));
    }

    let reason = if parse.parsed == 0 {
        CoercionFailureReason::NotDates
    } else {
        CoercionFailureReason::BelowThreshold
    };
    Err(CoercionFailure {
        name: column.name.clone(),
        valid_fraction,
        reason,
    })
}
