//! Spreadsheet workbook reader.

use std::io::Cursor;

use calamine::{Data, Reader, Sheets, open_workbook_auto_from_rs};
use tracing::debug;

use crate::error::{BenchtopError, Result};
use crate::table::{Column, Table, Value};

use super::parser::{ParserConfig, is_null_value, normalize_headers};

fn open(bytes: &[u8]) -> Result<Sheets<Cursor<Vec<u8>>>> {
    open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| BenchtopError::Format(format!("Unreadable workbook: {}", e)))
}

/// List the sheet names of a workbook.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(open(bytes)?.sheet_names())
}

/// Read one sheet (the first when `sheet_name` is `None`) into a table.
///
/// Cells keep their native types, so a column mixing numbers and text is
/// stored as text with mixed elements.
pub(crate) fn read_sheet(
    bytes: &[u8],
    sheet_name: Option<&str>,
    config: &ParserConfig,
) -> Result<Table> {
    let mut workbook = open(bytes)?;
    let names = workbook.sheet_names();

    let name = match sheet_name {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => {
            return Err(BenchtopError::Format(format!(
                "Sheet '{}' not found (available: {})",
                name,
                names.join(", ")
            )));
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| BenchtopError::EmptyInput("Workbook has no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| BenchtopError::Format(format!("Unreadable sheet '{}': {}", name, e)))?;
    debug!(sheet = %name, height = range.height(), width = range.width(), "reading sheet");

    let mut rows = range.rows();
    let width = range.width();
    if width == 0 {
        return Err(BenchtopError::EmptyInput(format!("Sheet '{}' has no columns", name)));
    }

    let headers: Vec<String> = if config.has_header {
        match rows.next() {
            Some(row) => row.iter().map(|c| c.to_string()).collect(),
            None => return Err(BenchtopError::EmptyInput(format!("Sheet '{}' is empty", name))),
        }
    } else {
        (0..width).map(|i| format!("column_{}", i + 1)).collect()
    };

    let mut buffers: Vec<Vec<Value>> = vec![Vec::new(); width];
    for (row_idx, row) in rows.enumerate() {
        if let Some(max) = config.max_rows {
            if row_idx >= max {
                break;
            }
        }
        for (buffer, cell) in buffers.iter_mut().zip(row.iter()) {
            buffer.push(cell_value(cell));
        }
    }

    if buffers.first().map(Vec::is_empty).unwrap_or(true) {
        return Err(BenchtopError::EmptyInput(format!("Sheet '{}' has no data rows", name)));
    }

    let columns = normalize_headers(headers)
        .into_iter()
        .zip(buffers)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) if is_null_value(s) => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or(Value::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_format_error() {
        let result = read_sheet(b"PK\x03\x04not a workbook", None, &ParserConfig::default());
        assert!(matches!(result, Err(BenchtopError::Format(_))));
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Int(3)), Value::Number(3.0));
        assert_eq!(cell_value(&Data::String("NA".into())), Value::Null);
        assert_eq!(cell_value(&Data::String("x".into())), Value::text("x"));
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Bool(true)), Value::text("true"));
    }
}
