//! Columnar store for generated datasets
//!
//! One Parquet file per dataset and year. Each variable is a column named
//! `<variable>/<year>` holding its whole array as a single list value, with
//! the owning entity in the field metadata.

pub mod reader;
pub mod writer;

pub use reader::{StoreReader, decode_labels};
pub use writer::{encode_labels, write_store};

/// Field metadata key holding the entity
pub const ENTITY_KEY: &str = "entity";
/// Field metadata key holding the value kind
pub const KIND_KEY: &str = "kind";
/// File metadata key holding the dataset name
pub const DATASET_KEY: &str = "dataset";
/// File metadata key holding the year
pub const YEAR_KEY: &str = "year";

/// Store key of a variable in a year
#[must_use]
pub fn variable_key(name: &str, year: i32) -> String {
    format!("{name}/{year}")
}

/// Split a store key into variable name and year
#[must_use]
pub fn split_key(key: &str) -> Option<(&str, i32)> {
    let (name, year) = key.rsplit_once('/')?;
    Some((name, year.parse().ok()?))
}
