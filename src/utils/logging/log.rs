//! Log lines for timed pipeline steps
//!
//! A [`StepTimer`] logs when a step touching a file starts and, once the step
//! is done, how many records it produced and how long it took.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A running step over one file
#[derive(Debug)]
pub struct StepTimer {
    step: String,
    path: PathBuf,
    start: Instant,
}

impl StepTimer {
    /// Log the start of a step and begin timing it
    ///
    /// # Arguments
    /// * `step` - What is being done, e.g. `reading spi donors`
    /// * `path` - File the step reads or writes
    pub fn start(step: impl Into<String>, path: &Path) -> Self {
        let step = step.into();
        log::info!("Started {step}: {}", path.display());
        Self {
            step,
            path: path.to_path_buf(),
            start: Instant::now(),
        }
    }

    /// Log the end of the step with the number of records it handled
    pub fn finish(self, count: usize, unit: &str) {
        log::info!(
            "{}",
            step_summary(&self.step, &self.path, count, unit, self.start.elapsed())
        );
    }
}

/// Completion line of a step
fn step_summary(step: &str, path: &Path, count: usize, unit: &str, elapsed: Duration) -> String {
    format!("Finished {step}: {count} {unit} from {} in {elapsed:.2?}", path.display())
}

/// Warn about a problem in an input, naming the file when there is one
pub fn warn_input(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message} ({})", path.display()),
        None => log::warn!("{message}"),
    }
}
