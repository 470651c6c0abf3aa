//! Table ingestion: uploaded bytes in, typed tables out.

mod parser;
mod source;
#[cfg(feature = "spreadsheet")]
mod spreadsheet;
mod writer;

pub use parser::{FormatHint, Parser, ParserConfig, detect_delimiter, is_null_value};
pub use source::SourceMetadata;
#[cfg(feature = "spreadsheet")]
pub use spreadsheet::sheet_names;
pub use writer::{write_delimited, write_delimited_file};
