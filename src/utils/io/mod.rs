//! File input for raw survey and reference tables
//!
//! Tables arrive either as Parquet files or as tab-delimited text with a
//! header row. Both are read into a single Arrow record batch.

pub mod delimited;
pub mod parquet;

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;

use crate::error::{FrsError, Result};

pub use delimited::read_delimited;
pub use parquet::read_parquet;

/// Extensions recognised for table files, in lookup order
pub const TABLE_EXTENSIONS: [&str; 3] = ["parquet", "tab", "tsv"];

/// Find the file holding a table in a directory
///
/// Returns `None` when no file with a recognised extension exists.
#[must_use]
pub fn find_table_file(dir: &Path, table: &str) -> Option<PathBuf> {
    TABLE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{table}.{ext}")))
        .find(|path| path.is_file())
}

/// Read a table file, choosing the reader from the extension
pub fn read_table_file(path: &Path) -> Result<RecordBatch> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => read_parquet(path),
        Some("tab" | "tsv" | "txt") => read_delimited(path, b'\t'),
        Some("csv") => read_delimited(path, b','),
        _ => Err(FrsError::io_at("Unrecognised table file extension", path)),
    }
}
