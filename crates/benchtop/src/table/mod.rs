//! Tabular data model shared by every pipeline stage.

mod column;
mod table;
mod value;

pub use column::{Column, StorageType};
pub use table::{RowKey, Table};
pub use value::{DATETIME_FORMAT, ElementKind, Value, ValueKey, format_number};
