//! Schema profiling.
//!
//! The profiler classifies every column as numeric, categorical or datetime
//! from its storage type, measures missingness and cardinality, and computes
//! describe-style statistics and pairwise correlations between numeric
//! columns. Date detection on text columns only runs when asked for.

mod dates;
mod profiler;
mod stats;

pub use dates::{DateParse, looks_like_date, parse_datetime};
pub use profiler::{
    CategoricalSummary, ColumnKind, ColumnProfile, CorrelationMatrix, DATE_ACCEPT_FRACTION,
    MAX_CORRELATION_COLUMNS, Profiler, TableProfile,
};
pub use stats::{NumericSummary, mean, median, pearson, population_std, quantile, sample_std};
