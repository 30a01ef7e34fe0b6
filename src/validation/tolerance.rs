//! Absolute-or-relative tolerance bands

use serde::Serialize;

/// Relative error of a result against a target
///
/// A zero target gives zero error for a zero result and infinite error
/// otherwise.
#[must_use]
pub fn relative_error(result: f64, target: f64) -> f64 {
    if target == 0.0 {
        if result == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (result / target - 1.0).abs()
    }
}

/// Bounds a result must meet against its target
///
/// A check passes when the values are equal, or when either bound holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    /// Largest accepted absolute difference, exclusive
    pub absolute: Option<f64>,
    /// Largest accepted relative error, exclusive
    pub relative: Option<f64>,
}

impl Tolerance {
    /// Relative bound only
    #[must_use]
    pub fn relative(relative: f64) -> Self {
        Self {
            absolute: None,
            relative: Some(relative),
        }
    }

    /// Pass if either bound holds
    #[must_use]
    pub fn absolute_or_relative(absolute: f64, relative: f64) -> Self {
        Self {
            absolute: Some(absolute),
            relative: Some(relative),
        }
    }

    /// Whether the result is close enough to the target
    ///
    /// Two missing values (both NaN) agree.
    #[must_use]
    pub fn passes(&self, result: f64, target: f64) -> bool {
        if result.is_nan() || target.is_nan() {
            return result.is_nan() && target.is_nan();
        }
        if result == target {
            return true;
        }
        let within_absolute = self
            .absolute
            .is_some_and(|bound| (result - target).abs() < bound);
        let within_relative = self
            .relative
            .is_some_and(|bound| relative_error(result, target) < bound);
        within_absolute || within_relative
    }
}

/// Per-variable limits for comparisons against the reference model
#[derive(Debug, Clone, PartialEq)]
pub struct Tolerances {
    /// Quantile checks over positive values
    pub quantile: Tolerance,
    /// Aggregate and positive-count checks
    pub aggregate: Tolerance,
    /// Largest accepted mean relative error among reference-positive households
    pub max_mean_rel_error: f64,
    /// Smallest accepted share of households agreeing on positivity
    pub min_nonzero_agreement: f64,
    /// Checks against the reference aggregate table
    pub aggregate_table: Tolerance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_either_bound_is_enough() {
        let tolerance = Tolerance::absolute_or_relative(25.0, 0.05);
        // 20 apart, 20% relative: absolute bound holds
        assert!(tolerance.passes(120.0, 100.0));
        // 400 apart, 4% relative: relative bound holds
        assert!(tolerance.passes(10_400.0, 10_000.0));
        // 30 apart, 30% relative: neither holds
        assert!(!tolerance.passes(130.0, 100.0));
    }

    #[test]
    fn test_zero_target() {
        let tolerance = Tolerance::relative(0.05);
        assert!(tolerance.passes(0.0, 0.0));
        assert!(!tolerance.passes(1.0, 0.0));
        assert_eq!(relative_error(3.0, 0.0), f64::INFINITY);
        assert_eq!(relative_error(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_exact_equality_passes_a_zero_bound() {
        let tolerance = Tolerance::relative(0.0);
        assert!(tolerance.passes(5.0, 5.0));
        assert!(!tolerance.passes(5.0001, 5.0));
    }

    #[test]
    fn test_missing_values() {
        let tolerance = Tolerance::relative(0.05);
        assert!(tolerance.passes(f64::NAN, f64::NAN));
        assert!(!tolerance.passes(f64::NAN, 1.0));
    }
}
