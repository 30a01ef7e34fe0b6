//! Error handling for dataset generation.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors raised while loading, transforming, storing or validating survey data
#[derive(Debug, thiserror::Error)]
pub enum FrsError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// IO error with the path and purpose of the failed operation
    #[error("IO error for {path}: {message}")]
    IoContext {
        /// Human readable description of the failure
        message: String,
        /// Path involved in the failure
        path: PathBuf,
        /// Underlying IO error, if any
        #[source]
        source: Option<io::Error>,
    },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required input file or directory does not exist
    #[error("Missing input for {purpose}: {path}")]
    MissingInput {
        /// What the input was needed for
        purpose: String,
        /// Expected location
        path: PathBuf,
    },

    /// A raw table is not available for the requested year
    #[error("Table {table} not available for {year}")]
    MissingTable {
        /// Table name
        table: String,
        /// Survey year
        year: i32,
    },

    /// A column is absent from a table
    #[error("Table {table} has no column {column}")]
    MissingColumn {
        /// Table name
        table: String,
        /// Column name
        column: String,
    },

    /// Arrays or tables do not line up
    #[error("Shape error: {0}")]
    Shape(String),

    /// Identifier arithmetic or containment violated
    #[error("Identifier error: {0}")]
    Identifier(String),

    /// Generated variables still contain missing values
    #[error("Missing values in variables: {}", variables.join(", "))]
    MissingValues {
        /// Variables containing NaN
        variables: Vec<String>,
    },

    /// A statistical imputation could not be carried out
    #[error("Imputation error: {0}")]
    Imputation(String),

    /// The columnar store holds something unexpected
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FrsError {
    /// Create a missing-column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an IO error carrying the path it concerns
    pub fn io_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::IoContext {
            message: message.into(),
            path: path.into(),
            source: None,
        }
    }

    /// Create an IO error carrying the path and the underlying error
    pub fn io_with_source(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::IoContext {
            message: message.into(),
            path: path.into(),
            source: Some(source),
        }
    }
}

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, FrsError>;
