//! Step logging and stage progress bars

pub mod log;
pub mod progress;

pub use log::{StepTimer, warn_input};
pub use progress::{create_stage_progress_bar, finish_progress_bar};
