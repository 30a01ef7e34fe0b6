//! Shared utilities for file access, Arrow conversion and logging

pub mod arrow;
pub mod io;
pub mod logging;

pub use logging::{StepTimer, warn_input};
