//! A Rust library for building microsimulation datasets from the Family
//! Resources Survey and validating them against UKMOD.
//!
//! The pipeline runs per survey year: raw tables are loaded through a
//! [`raw::RawSurveySource`], transformed into typed variables, optionally
//! enhanced with imputations from auxiliary surveys, and written to a
//! columnar store keyed by `<variable>/<year>`.

pub mod config;
pub mod dataset;
pub mod enhance;
pub mod error;
pub mod models;
pub mod raw;
pub mod reference;
pub mod schema;
pub mod store;
pub mod transform;
pub mod utils;
pub mod validation;

// Re-export the most common types for easier use
pub use config::{
    DatasetConfig, GenerationOptions, ImputationConfig, StorageConfig, ValidationConfig,
};
pub use dataset::{BaseFrs, Dataset, Frs, FrsEnhanced, UkmodAggregates, UkmodInput, UkmodOutput};
pub use error::{FrsError, Result};
pub use models::{Entity, Variable, VariableSet, VariableValues};
pub use raw::{FrsDirectorySource, MemorySource, RawSurveySource, RawTable, RawTables};
pub use store::{StoreReader, write_store};
pub use validation::{ValidationReport, validate};
