//! Validation of generated datasets against the UKMOD reference model

pub mod compare;
pub mod mapping;
pub mod report;
pub mod stats;
pub mod tolerance;

pub use compare::{household_totals, validate};
pub use mapping::{VariablePair, load_variable_map, parse_variable_map};
pub use report::{CheckResult, ValidationReport};
pub use stats::{Aggregates, weighted_quantile};
pub use tolerance::{Tolerance, Tolerances, relative_error};
