//! Delimited-text and spreadsheet parser with delimiter detection.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BenchtopError, Result};
use crate::table::{Column, StorageType, Table, Value};

use super::source::SourceMetadata;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// ZIP container (xlsx, xlsm, ods).
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B];
/// OLE compound document (legacy xls).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// How the uploaded bytes should be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FormatHint {
    /// Delimited text. `None` auto-detects the delimiter.
    Delimited { delimiter: Option<u8> },
    /// Spreadsheet workbook. `None` reads the first sheet.
    Spreadsheet { sheet_name: Option<String> },
}

impl FormatHint {
    /// Delimited text with an explicit delimiter.
    pub fn delimited(delimiter: u8) -> Self {
        FormatHint::Delimited {
            delimiter: Some(delimiter),
        }
    }

    /// Spreadsheet with an explicit sheet name.
    pub fn sheet(name: impl Into<String>) -> Self {
        FormatHint::Spreadsheet {
            sheet_name: Some(name.into()),
        }
    }

    /// Guess a hint from a file name, falling back to content sniffing.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
                FormatHint::Spreadsheet { sheet_name: None }
            }
            "tsv" | "tab" => FormatHint::delimited(b'\t'),
            "csv" => FormatHint::Delimited { delimiter: None },
            _ if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) => {
                FormatHint::Spreadsheet { sheet_name: None }
            }
            _ => FormatHint::Delimited { delimiter: None },
        }
    }
}

impl Default for FormatHint {
    fn default() -> Self {
        FormatHint::Delimited { delimiter: None }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Whether the first row holds column names.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character for delimited text.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

impl ParserConfig {
    /// Limit the number of data rows read.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Treat the first row as data and generate column names.
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }
}

/// Parses uploaded tabular data into a [`Table`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a file and parse it, detecting the format from its extension
    /// when no hint is given.
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        hint: Option<FormatHint>,
    ) -> Result<(Table, SourceMetadata)> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| BenchtopError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let hint = hint.unwrap_or_else(|| FormatHint::detect(path, &bytes));

        let (table, mut metadata) = self.parse_bytes(&bytes, &hint)?;
        metadata = metadata.with_path(path.to_path_buf());
        Ok((table, metadata))
    }

    /// Parse an uploaded byte stream.
    pub fn parse_bytes(&self, bytes: &[u8], hint: &FormatHint) -> Result<(Table, SourceMetadata)> {
        let (table, format) = match hint {
            FormatHint::Delimited { delimiter } => {
                let delimiter = match delimiter {
                    Some(d) => *d,
                    None => detect_delimiter(bytes)?,
                };
                (self.parse_delimited(bytes, delimiter)?, delimited_format_name(delimiter))
            }
            FormatHint::Spreadsheet { sheet_name } => (
                self.parse_spreadsheet(bytes, sheet_name.as_deref())?,
                "spreadsheet".to_string(),
            ),
        };

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            format = %format,
            "ingested table"
        );

        let metadata = SourceMetadata::new(bytes, format, table.row_count(), table.column_count());
        Ok((table, metadata))
    }

    /// Parse delimited text with a known delimiter.
    pub fn parse_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<Table> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(BenchtopError::EmptyInput("No columns found".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = if self.config.has_header {
            match records.next() {
                Some(record) => record
                    .map_err(format_error)?
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                None => return Err(BenchtopError::EmptyInput("No columns found".to_string())),
            }
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut width = headers.len();

        for (row_idx, result) in records.enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result.map_err(format_error)?;
            let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            if !self.config.has_header && width == 0 {
                width = row.len();
            }
            if row.len() > width {
                return Err(BenchtopError::Format(format!(
                    "Row {} has {} fields, expected {}",
                    row_idx + 1,
                    row.len(),
                    width
                )));
            }
            rows.push(row);
        }

        let headers = if self.config.has_header {
            headers
        } else {
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(BenchtopError::EmptyInput("No columns found".to_string()));
        }
        if rows.is_empty() {
            return Err(BenchtopError::EmptyInput("No data rows found".to_string()));
        }

        let headers = normalize_headers(headers);
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                // Short rows are padded with missing values
                let cells: Vec<&str> = rows
                    .iter()
                    .map(|row| row.get(idx).map(|s| s.as_str()).unwrap_or(""))
                    .collect();
                text_cells_to_column(name, &cells)
            })
            .collect();

        Table::new(columns)
    }

    #[cfg(feature = "spreadsheet")]
    fn parse_spreadsheet(&self, bytes: &[u8], sheet_name: Option<&str>) -> Result<Table> {
        super::spreadsheet::read_sheet(bytes, sheet_name, &self.config)
    }

    #[cfg(not(feature = "spreadsheet"))]
    fn parse_spreadsheet(&self, _bytes: &[u8], _sheet_name: Option<&str>) -> Result<Table> {
        Err(BenchtopError::Format(
            "Spreadsheet support is not enabled in this build".to_string(),
        ))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn format_error(e: csv::Error) -> BenchtopError {
    BenchtopError::Format(e.to_string())
}

fn delimited_format_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
    .to_string()
}

/// Build a column from raw text cells.
///
/// The column is numeric when every non-missing cell parses as a number;
/// otherwise the raw strings are kept as text.
pub(crate) fn text_cells_to_column(name: String, cells: &[&str]) -> Column {
    let numeric = cells
        .iter()
        .filter(|c| !is_null_value(c))
        .all(|c| c.trim().parse::<f64>().is_ok());

    if numeric {
        let values = cells
            .iter()
            .map(|c| {
                if is_null_value(c) {
                    Value::Null
                } else {
                    c.trim().parse::<f64>().map(Value::Number).unwrap_or(Value::Null)
                }
            })
            .collect();
        Column::with_storage(name, StorageType::Numeric, values)
    } else {
        let values = cells
            .iter()
            .map(|c| {
                if is_null_value(c) {
                    Value::Null
                } else {
                    Value::Text(c.to_string())
                }
            })
            .collect();
        Column::with_storage(name, StorageType::Text, values)
    }
}

/// Make column names unique and non-empty.
///
/// Blank names become `Unnamed: <i>`; repeats get `.1`, `.2`, ... suffixes.
pub(crate) fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while result.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        if candidate != base {
            debug!(original = %base, renamed = %candidate, "renamed duplicate header");
        }
        result.push(candidate);
    }
    result
}

/// Check if a raw cell represents a missing value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("#n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed == "<NA>"
}

/// Detect the delimiter by analyzing the first few lines.
pub fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let mut undecodable = 0;
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| match l {
            Ok(line) => Some(line),
            Err(_) => {
                undecodable += 1;
                None
            }
        })
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        if undecodable > 0 {
            return Err(BenchtopError::Format("Input is not valid UTF-8 text".to_string()));
        }
        return Err(BenchtopError::EmptyInput("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Tab gets a slight bonus as it rarely appears inside values
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    debug!(delimiter = %(best_delimiter as char).escape_default(), "detected delimiter");
    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        let data = b"a;b;c\n1,5;2;3\n4;5;6";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_delimiter_rejects_undecodable_bytes() {
        let data: &[u8] = &[0xff, 0xfe, 0x00, b'\n', 0xc3, 0x28, b'\n'];
        assert!(matches!(detect_delimiter(data), Err(BenchtopError::Format(_))));
        assert!(matches!(
            detect_delimiter(b"\n  \n"),
            Err(BenchtopError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"name,age,city\nAlice,30,NYC\nBob,25,LA";
        let table = parser.parse_delimited(data, b',').unwrap();

        assert_eq!(table.column_names(), vec!["name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some(&Value::text("Alice")));
        assert_eq!(table.get(1, 1), Some(&Value::Number(25.0)));
        assert_eq!(table.column("age").unwrap().storage, StorageType::Numeric);
        assert_eq!(table.column("city").unwrap().storage, StorageType::Text);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let parser = Parser::new();
        let table = parser.parse_delimited(b"a,b\n1,2\n3\n", b',').unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.get(1, 1), Some(&Value::Null));
    }

    #[test]
    fn test_long_rows_are_format_errors() {
        let parser = Parser::new();
        let result = parser.parse_delimited(b"a,b\n1,2,3\n", b',');
        assert!(matches!(result, Err(BenchtopError::Format(_))));
    }

    #[test]
    fn test_empty_inputs() {
        let parser = Parser::new();
        assert!(matches!(
            parser.parse_delimited(b"", b','),
            Err(BenchtopError::EmptyInput(_))
        ));
        assert!(matches!(
            parser.parse_delimited(b"a,b\n", b','),
            Err(BenchtopError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_headerless_input() {
        let parser = Parser::with_config(ParserConfig::default().without_header());
        let table = parser.parse_delimited(b"1,x\n2,y\n", b',').unwrap();
        assert_eq!(table.column_names(), vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_normalize_headers() {
        let headers = vec!["a".into(), "".into(), "a".into(), "a".into()];
        assert_eq!(
            normalize_headers(headers),
            vec!["a", "Unnamed: 1", "a.1", "a.2"]
        );
    }

    #[test]
    fn test_is_null_value() {
        assert!(is_null_value(""));
        assert!(is_null_value("NA"));
        assert!(is_null_value("na"));
        assert!(is_null_value("N/A"));
        assert!(is_null_value("NaN"));
        assert!(is_null_value("null"));
        assert!(is_null_value("NULL"));
        assert!(!is_null_value("value"));
        assert!(!is_null_value("0"));
    }

    #[test]
    fn test_format_hint_detection() {
        assert_eq!(
            FormatHint::detect(Path::new("data.xlsx"), b""),
            FormatHint::Spreadsheet { sheet_name: None }
        );
        assert_eq!(
            FormatHint::detect(Path::new("data.tsv"), b""),
            FormatHint::delimited(b'\t')
        );
        assert_eq!(
            FormatHint::detect(Path::new("upload"), &[0x50, 0x4B, 0x03, 0x04]),
            FormatHint::Spreadsheet { sheet_name: None }
        );
        assert_eq!(
            FormatHint::detect(Path::new("upload"), b"a,b\n1,2"),
            FormatHint::Delimited { delimiter: None }
        );
    }

    #[test]
    fn test_parse_bytes_metadata() {
        let parser = Parser::new();
        let (table, meta) = parser
            .parse_bytes(b"a\tb\n1\t2\n", &FormatHint::default())
            .unwrap();
        assert_eq!(table.shape(), (1, 2));
        assert_eq!(meta.format, "tsv");
        assert!(meta.hash.starts_with("sha256:"));
        assert_eq!(meta.size_bytes, 8);
    }
}
