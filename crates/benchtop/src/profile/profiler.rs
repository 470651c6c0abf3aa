//! Column classification and missingness statistics.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::table::{Column, ElementKind, StorageType, Table};
use crate::warning::{ColumnWarning, WarningKind};

use super::dates::DateParse;
use super::stats::{NumericSummary, pearson};

/// Fraction of rows that must parse before a text column counts as dates.
pub const DATE_ACCEPT_FRACTION: f64 = 0.8;

/// Numeric columns, in table order, that enter the correlation matrix.
pub const MAX_CORRELATION_COLUMNS: usize = 8;

/// Analytical kind of a column, computed once per table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
}

impl ColumnKind {
    /// Kind implied by a storage type.
    pub fn from_storage(storage: StorageType) -> Self {
        match storage {
            StorageType::Numeric => ColumnKind::Numeric,
            StorageType::Text => ColumnKind::Categorical,
            StorageType::DateTime => ColumnKind::Datetime,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Datetime => "datetime",
        }
    }
}

/// Frequency information for a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// Most frequent value.
    pub top: Option<String>,
    /// Occurrences of the most frequent value.
    pub top_frequency: usize,
    /// Value counts, most frequent first, when cardinality is small.
    pub value_counts: Option<IndexMap<String, usize>>,
}

/// Profile of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Position in the table.
    pub position: usize,
    /// Analytical kind.
    pub kind: ColumnKind,
    /// Storage type the kind was derived from.
    pub storage: StorageType,
    pub missing_count: usize,
    pub missing_fraction: f64,
    /// Number of distinct non-missing values.
    pub cardinality: usize,
    /// Text column holding more than one element type.
    pub mixed_types: bool,
    /// Fraction of rows parsing as dates, when date detection ran.
    pub date_parse_fraction: Option<f64>,
    pub numeric: Option<NumericSummary>,
    pub categorical: Option<CategoricalSummary>,
}

impl ColumnProfile {
    /// Returns true if date detection found this text column date-like.
    pub fn is_date_candidate(&self) -> bool {
        self.date_parse_fraction
            .map(|f| f > DATE_ACCEPT_FRACTION)
            .unwrap_or(false)
    }
}

/// Pairwise Pearson correlations between numeric columns.
///
/// `values[i][j]` correlates `columns[i]` with `columns[j]` over the rows
/// where both are present. It is `None` when fewer than two such rows exist
/// or either column is constant over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlate the given numeric columns.
    pub fn compute(columns: &[&Column]) -> Self {
        let cells: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|c| c.values.iter().map(|v| v.as_f64()).collect())
            .collect();
        let values: Vec<Vec<Option<f64>>> = cells
            .iter()
            .map(|x| cells.iter().map(|y| pearson(x, y)).collect::<Vec<_>>())
            .collect();
        Self {
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            values,
        }
    }

    /// Correlation between two columns by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Profile of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub row_count: usize,
    pub column_count: usize,
    /// Rows that exactly repeat an earlier row.
    pub duplicate_rows: usize,
    /// Per-column profiles in table order.
    pub columns: Vec<ColumnProfile>,
    /// Correlations between the first numeric columns, when there are at
    /// least two.
    pub correlations: Option<CorrelationMatrix>,
    pub warnings: Vec<ColumnWarning>,
}

impl TableProfile {
    /// Get a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Kind of a column by name.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }

    /// Names of columns of one kind, in table order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Total missing cells across the table.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }
}

/// Schema profiler.
#[derive(Debug, Clone)]
pub struct Profiler {
    /// Attempt date parsing on text columns.
    parse_dates: bool,
    /// Keep value counts for categorical columns up to this cardinality.
    max_value_counts: usize,
}

impl Default for Profiler {
    fn default() -> Self {
        Self {
            parse_dates: false,
            max_value_counts: 40,
        }
    }
}

impl Profiler {
    /// Create a profiler without date detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable date detection on text columns.
    pub fn with_date_detection(mut self, parse_dates: bool) -> Self {
        self.parse_dates = parse_dates;
        self
    }

    /// Set the cardinality limit for keeping value counts.
    pub fn with_max_value_counts(mut self, limit: usize) -> Self {
        self.max_value_counts = limit;
        self
    }

    /// Profile every column of a table.
    pub fn profile(&self, table: &Table) -> TableProfile {
        let mut warnings = Vec::new();
        let columns: Vec<ColumnProfile> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(position, column)| {
                let profile = self.profile_column(position, column);
                if profile.mixed_types {
                    warnings.push(mixed_type_warning(column));
                }
                profile
            })
            .collect();

        let mut seen = HashSet::new();
        let duplicate_rows = (0..table.row_count())
            .filter(|&row| !seen.insert(table.row_key(row)))
            .count();

        let numeric: Vec<&Column> = table
            .columns()
            .iter()
            .filter(|c| c.storage == StorageType::Numeric)
            .take(MAX_CORRELATION_COLUMNS)
            .collect();
        let correlations = (numeric.len() >= 2).then(|| CorrelationMatrix::compute(&numeric));

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            duplicate_rows,
            warnings = warnings.len(),
            "profiled table"
        );

        TableProfile {
            row_count: table.row_count(),
            column_count: table.column_count(),
            duplicate_rows,
            columns,
            correlations,
            warnings,
        }
    }

    fn profile_column(&self, position: usize, column: &Column) -> ColumnProfile {
        let kind = ColumnKind::from_storage(column.storage);
        let mixed_types = column.has_mixed_types();

        let date_parse_fraction = (self.parse_dates && kind == ColumnKind::Categorical)
            .then(|| DateParse::attempt(column).valid_fraction);

        let numeric = match kind {
            ColumnKind::Numeric => NumericSummary::from_values(&column.numbers()),
            _ => None,
        };
        let categorical = match kind {
            ColumnKind::Categorical => Some(self.categorical_summary(column)),
            _ => None,
        };

        debug!(
            column = %column.name,
            kind = ?kind,
            missing = column.null_count(),
            date_parse_fraction = ?date_parse_fraction,
            "profiled column"
        );

        ColumnProfile {
            name: column.name.clone(),
            position,
            kind,
            storage: column.storage,
            missing_count: column.null_count(),
            missing_fraction: column.missing_fraction(),
            cardinality: column.distinct_count(),
            mixed_types,
            date_parse_fraction,
            numeric,
            categorical,
        }
    }

    fn categorical_summary(&self, column: &Column) -> CategoricalSummary {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in column.values.iter().filter(|v| !v.is_null()) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        counts.sort_by(|ka, ca, kb, cb| cb.cmp(ca).then_with(|| ka.cmp(kb)));

        let (top, top_frequency) = counts
            .first()
            .map(|(k, c)| (Some(k.clone()), *c))
            .unwrap_or((None, 0));
        let value_counts = (counts.len() <= self.max_value_counts).then_some(counts);

        CategoricalSummary {
            top,
            top_frequency,
            value_counts,
        }
    }

    /// Render every mixed-type text column as plain text.
    ///
    /// Returns the normalized table and one warning per rewritten column.
    pub fn normalize_mixed_types(&self, table: &Table) -> (Table, Vec<ColumnWarning>) {
        let mut warnings = Vec::new();
        let mut normalized = table.clone();
        for (index, column) in table.columns().iter().enumerate() {
            if column.has_mixed_types() {
                let warning = mixed_type_warning(column);
                warn!(column = %column.name, "{}", warning.message);
                warnings.push(warning);
                normalized = normalized.with_column_at(index, column.to_text());
            }
        }
        (normalized, warnings)
    }
}

fn mixed_type_warning(column: &Column) -> ColumnWarning {
    let kinds: Vec<&str> = column
        .element_kinds()
        .into_iter()
        .map(|k| match k {
            ElementKind::Number => "number",
            ElementKind::Text => "text",
            ElementKind::DateTime => "datetime",
        })
        .collect();
    ColumnWarning::new(
        column.name.clone(),
        WarningKind::MixedTypes,
        format!(
            "Column '{}' mixes {} values; normalized to text",
            column.name,
            kinds.join(" and ")
        ),
    )
}
