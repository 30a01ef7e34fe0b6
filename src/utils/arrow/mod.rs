//! Arrow data handling utilities
//!
//! Conversions from Arrow arrays into the plain vectors the transforms work on.

pub mod conversion;

pub use conversion::{array_to_f64, array_to_strings, is_numeric};
