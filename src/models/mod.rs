//! Domain models for survey datasets
//!
//! Entities and their identifier arithmetic, survey code enumerations and the
//! typed variable arrays that make up a generated dataset.

pub mod entity;
pub mod types;
pub mod variable;

// Re-export commonly used types
pub use entity::Entity;
pub use types::{SurveyCode, UNKNOWN_LABEL};
pub use variable::{ValueKind, Variable, VariableSet, VariableValues};
