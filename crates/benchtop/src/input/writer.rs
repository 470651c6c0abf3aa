//! Export tables back to delimited text.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{BenchtopError, Result};
use crate::table::Table;

/// Serialize a table as delimited text with a header row.
///
/// Missing cells are written empty; numbers use their shortest exact form so
/// that parsing the output yields the same table.
pub fn write_delimited(table: &Table, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        writer.write_record(table.row(row).iter().map(|v| v.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| BenchtopError::Persistence(format!("Failed to flush table: {}", e)))
}

/// Write a table to a delimited file, creating parent directories.
pub fn write_delimited_file(table: &Table, path: impl AsRef<Path>, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_delimited(table, delimiter)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| BenchtopError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let mut file = File::create(path).map_err(|e| BenchtopError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| BenchtopError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
