//! Validation results

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::error::util::safe_create_file;

/// Outcome of one comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Generated variable
    pub variable: String,
    /// Reference variable
    pub reference: String,
    /// What was compared, e.g. `q50` or `aggregate`
    pub metric: String,
    /// Value computed from the generated dataset
    pub result: f64,
    /// Value computed from the reference
    pub target: f64,
    /// Whether the result met its tolerance
    pub passed: bool,
}

/// Every check of one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Year validated
    pub year: i32,
    /// Checks in the order they ran
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    /// Empty report for a year
    #[must_use]
    pub fn new(year: i32) -> Self {
        Self {
            year,
            checks: Vec::new(),
        }
    }

    /// Record a check
    pub fn push(
        &mut self,
        variable: &str,
        reference: &str,
        metric: impl Into<String>,
        result: f64,
        target: f64,
        passed: bool,
    ) {
        self.checks.push(CheckResult {
            variable: variable.to_string(),
            reference: reference.to_string(),
            metric: metric.into(),
            result,
            target,
            passed,
        });
    }

    /// Whether every check passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Checks that failed
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = safe_create_file(path, "writing validation report")?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_every_check() {
        let mut report = ValidationReport::new(2018);
        report.push("employment_income", "yem", "aggregate", 1.0, 1.0, true);
        report.push("employment_income", "yem", "q50", 2.0, f64::NAN, false);

        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["year"], 2018);
        assert_eq!(json["checks"][0]["metric"], "aggregate");
        assert!(json["checks"][1]["target"].is_null());
    }
}
