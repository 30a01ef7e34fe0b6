//! Utility functions for error handling
//!
//! File-system checks that attach the path and purpose to the error, so a
//! missing input is reported before any computation starts.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{FrsError, Result};

/// Check that a file exists without opening it
pub fn require_file(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(FrsError::MissingInput {
            purpose: purpose.to_string(),
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(FrsError::io_at(
            format!("Expected a file for: {purpose}"),
            path,
        ));
    }
    Ok(())
}

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    require_file(path, purpose)?;

    fs::File::open(path).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        FrsError::io_with_source(message, path, e)
    })
}

/// Create (or truncate) a file for writing
pub fn safe_create_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                FrsError::io_with_source(
                    format!("Failed to create directory for: {purpose}"),
                    parent,
                    e,
                )
            })?;
        }
    }

    fs::File::create(path).map_err(|e| {
        FrsError::io_with_source(format!("Failed to create file for: {purpose}"), path, e)
    })
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(FrsError::MissingInput {
            purpose: purpose.to_string(),
            path: path.to_path_buf(),
        });
    }

    if !path.is_dir() {
        return Err(FrsError::io_at(
            format!("Expected a directory for: {purpose}"),
            path,
        ));
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let message = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check directory permissions".to_string()
                }
                _ => format!("Failed to access directory for: {purpose}"),
            };
            Err(FrsError::io_with_source(message, path, e))
        }
    }
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    match io::Read::read_to_string(&mut file, &mut content) {
        Ok(_) => Ok(content),
        Err(e) => {
            let message = match e.kind() {
                io::ErrorKind::InvalidData => {
                    "File contains invalid UTF-8 data - cannot read as text".to_string()
                }
                _ => format!("Failed to read file content for: {purpose}"),
            };
            Err(FrsError::io_with_source(message, path, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_purpose() {
        let path = Path::new("/definitely/not/here.tab");
        let err = safe_open_file(path, "reading the adult table").unwrap_err();
        match err {
            FrsError::MissingInput { purpose, path: p } => {
                assert_eq!(purpose, "reading the adult table");
                assert_eq!(p, path);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_is_not_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = require_file(dir.path(), "a table").unwrap_err();
        assert!(matches!(err, FrsError::IoContext { .. }));
        assert!(validate_directory(dir.path(), "raw data").is_ok());
    }
}
