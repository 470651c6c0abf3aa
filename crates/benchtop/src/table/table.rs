//! In-memory tables.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};

use super::column::Column;
use super::value::{Value, ValueKey};

/// Hashable identity of a full row, used for exact-duplicate detection.
pub type RowKey = Vec<ValueKey>;

/// An ordered set of equally long, uniquely named columns.
///
/// Tables are never mutated by pipeline stages; every stage returns a new
/// table so before/after states stay available to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(BenchtopError::Format(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(BenchtopError::Format(format!(
                    "Column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    expected
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Create a table from headers and row-major cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = headers.len();
        let mut buffers: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); width];

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(BenchtopError::Format(format!(
                    "Row {} has {} fields, expected {}",
                    row_idx + 1,
                    row.len(),
                    width
                )));
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(buffers)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::new(columns)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume the table, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// All column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col).and_then(|c| c.values.get(row))
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[row]).collect()
    }

    /// Equality key for one row.
    pub fn row_key(&self, row: usize) -> RowKey {
        self.columns.iter().map(|c| c.values[row].key()).collect()
    }

    /// New table with the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// New table with the first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..n.min(self.row_count())).collect();
        self.take_rows(&rows)
    }

    /// New table without the named columns. Unknown names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Split off one column, returning the remaining table and the column.
    pub fn split_column(&self, name: &str) -> Result<(Self, Column)> {
        let index = self.column_index(name).ok_or_else(|| {
            BenchtopError::Config(format!("Column '{}' not found", name))
        })?;
        let mut columns = self.columns.clone();
        let column = columns.remove(index);
        Ok((Self { columns }, column))
    }

    /// New table with one column replaced by position.
    pub fn with_column_at(&self, index: usize, column: Column) -> Self {
        let mut columns = self.columns.clone();
        columns[index] = column;
        Self { columns }
    }

    /// New table with a column appended. The column must match the row
    /// count and carry a new name.
    pub fn with_column(&self, column: Column) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::new(columns)
    }
}
