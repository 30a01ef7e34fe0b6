//! Transforms from raw survey tables to model variables.

pub mod base;
pub mod frame;
pub mod frs;
pub mod person;

/// Weekly to annual multiplier
pub const WEEKS_IN_YEAR: f64 = 52.0;

/// Monthly to annual multiplier
pub const MONTHS_IN_YEAR: f64 = 12.0;
