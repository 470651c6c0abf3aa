//! Date-like text detection and parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{Column, StorageType, Value};

/// Shapes a date-like string can take. Strings matching none of these are
/// never handed to the format parsers.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}-\d{1,2}-\d{1,2}",            // ISO date
        r"^\d{1,2}/\d{1,2}/\d{4}",            // US date
        r"^\d{1,2}-\d{1,2}-\d{4}",            // European date
        r"^\d{4}/\d{1,2}/\d{1,2}",            // Alt ISO
        r"^\d{1,2}\.\d{1,2}\.\d{4}",          // Dotted date
        r"^\d{1,2} [A-Za-z]{3,9},? \d{4}",    // 15 Jan 2024
        r"^[A-Za-z]{3,9} \d{1,2},? \d{4}",    // Jan 15, 2024
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first wins for ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Returns true if the string has the shape of a date.
pub fn looks_like_date(value: &str) -> bool {
    let value = value.trim();
    DATE_PATTERNS.iter().any(|pattern| pattern.is_match(value))
}

/// Parse a date or datetime string.
///
/// Dates without a time component land at midnight; offsets in RFC 3339
/// strings are normalized to UTC.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if !looks_like_date(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Result of trying to read every cell of a column as a datetime.
#[derive(Debug, Clone, PartialEq)]
pub struct DateParse {
    /// Cells after parsing; unparseable and missing cells become null.
    pub values: Vec<Value>,
    /// Number of cells that parsed.
    pub parsed: usize,
    /// Parsed cells over all rows (missing cells count against it).
    pub valid_fraction: f64,
}

impl DateParse {
    /// Attempt to parse every cell of a column.
    pub fn attempt(column: &Column) -> Self {
        let values: Vec<Value> = column
            .values
            .iter()
            .map(|v| match v {
                Value::DateTime(dt) => Value::DateTime(*dt),
                Value::Text(s) => parse_datetime(s).map(Value::DateTime).unwrap_or(Value::Null),
                _ => Value::Null,
            })
            .collect();
        let parsed = values.iter().filter(|v| !v.is_null()).count();
        let valid_fraction = if values.is_empty() {
            0.0
        } else {
            parsed as f64 / values.len() as f64
        };
        Self {
            values,
            parsed,
            valid_fraction,
        }
    }

    /// Build the coerced datetime column.
    pub fn into_column(self, name: impl Into<String>) -> Column {
        Column::with_storage(name, StorageType::DateTime, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_common_formats() {
        assert_eq!(parse_datetime("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_datetime("01/15/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_datetime("15/01/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_datetime("15 Jan 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_datetime("Jan 15, 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(
            parse_datetime("2024-01-15 08:30:00"),
            ymd(2024, 1, 15).date().and_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_datetime("2024-01-15T08:30:00+02:00"),
            ymd(2024, 1, 15).date().and_hms_opt(6, 30, 0)
        );
    }

    #[test]
    fn test_rejects_non_dates() {
        assert_eq!(parse_datetime("hello"), None);
        assert_eq!(parse_datetime("12345"), None);
        assert_eq!(parse_datetime("2024-13-45"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn test_attempt_counts_missing_against_fraction() {
        let column = Column::text(
            "d",
            [Some("2024-01-01"), Some("2024-01-02"), Some("oops"), None],
        );
        let parse = DateParse::attempt(&column);
        assert_eq!(parse.parsed, 2);
        assert!((parse.valid_fraction - 0.5).abs() < 1e-12);
        assert_eq!(parse.values[2], Value::Null);

        let coerced = parse.into_column("d");
        assert_eq!(coerced.storage, StorageType::DateTime);
    }
}
