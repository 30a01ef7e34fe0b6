//! Weighted summary statistics
//!
//! Quantiles use the cumulative-weight midpoint rule: each sorted value sits
//! at `(cumulative weight - weight / 2) / total weight`, and quantiles are
//! interpolated linearly between those positions, clamped at the ends.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Quantiles reported in aggregate tables, `q0` to `q100` in steps of ten
#[must_use]
pub fn aggregate_quantiles() -> Vec<f64> {
    (0..=10).map(|i| f64::from(i) / 10.0).collect()
}

/// Label of a quantile, e.g. `q50`
#[must_use]
pub fn quantile_label(q: f64) -> String {
    format!("q{}", (q * 100.0).round())
}

/// Weighted quantile of the values
///
/// Returns NaN when there are no values or no weight.
#[must_use]
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> f64 {
    let order = (0..values.len())
        .filter(|&i| !values[i].is_nan())
        .sorted_by(|&a, &b| values[a].total_cmp(&values[b]))
        .collect_vec();
    let total: f64 = order.iter().map(|&i| weights[i]).sum();
    if order.is_empty() || total <= 0.0 {
        return f64::NAN;
    }

    let mut cumulative = 0.0;
    let positions = order
        .iter()
        .map(|&i| {
            cumulative += weights[i];
            (cumulative - 0.5 * weights[i]) / total
        })
        .collect_vec();

    let first = positions[0];
    let last = positions[positions.len() - 1];
    if q <= first {
        return values[order[0]];
    }
    if q >= last {
        return values[order[order.len() - 1]];
    }

    let upper = positions.partition_point(|&p| p <= q);
    let lower = upper - 1;
    let (x0, x1) = (positions[lower], positions[upper]);
    let (y0, y1) = (values[order[lower]], values[order[upper]]);
    if x1 == x0 {
        y1
    } else {
        y0 + (q - x0) * (y1 - y0) / (x1 - x0)
    }
}

/// Weighted sum of the values, ignoring NaN
#[must_use]
pub fn weighted_sum(values: &[f64], weights: &[f64]) -> f64 {
    values
        .iter()
        .zip(weights)
        .filter(|(v, _)| !v.is_nan())
        .map(|(v, w)| v * w)
        .sum()
}

/// Total weight of the entries matching a predicate
#[must_use]
pub fn weighted_count<F>(values: &[f64], weights: &[f64], predicate: F) -> f64
where
    F: Fn(f64) -> bool,
{
    values
        .iter()
        .zip(weights)
        .filter(|&(&v, _)| predicate(v))
        .map(|(_, w)| w)
        .sum()
}

/// Values and weights of the entries with a positive value
#[must_use]
pub fn positive_subset(values: &[f64], weights: &[f64]) -> (Vec<f64>, Vec<f64>) {
    values
        .iter()
        .zip(weights)
        .filter(|&(&v, _)| v > 0.0)
        .map(|(&v, &w)| (v, w))
        .unzip()
}

/// Deciles, total and nonzero weight of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Values at [`aggregate_quantiles`]
    pub quantiles: Vec<f64>,
    /// Weighted total
    pub sum: f64,
    /// Total weight of nonzero entries
    pub nonzero: f64,
}

impl Aggregates {
    /// Summarise a variable, scaling amounts by `factor`
    ///
    /// The nonzero count is not scaled.
    #[must_use]
    pub fn compute(values: &[f64], weights: &[f64], factor: f64) -> Self {
        Self {
            quantiles: aggregate_quantiles()
                .into_iter()
                .map(|q| weighted_quantile(values, weights, q) * factor)
                .collect(),
            sum: weighted_sum(values, weights) * factor,
            nonzero: weighted_count(values, weights, |v| v != 0.0 && !v.is_nan()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unweighted_median_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let weights = [1.0; 4];
        // Positions are 0.125, 0.375, 0.625, 0.875
        assert!((weighted_quantile(&values, &weights, 0.5) - 2.5).abs() < 1e-12);
        assert_eq!(weighted_quantile(&values, &weights, 0.0), 1.0);
        assert_eq!(weighted_quantile(&values, &weights, 1.0), 4.0);
    }

    #[test]
    fn test_weights_shift_quantiles() {
        let values = [10.0, 20.0];
        let weights = [3.0, 1.0];
        // Positions are 0.375 and 0.875
        assert_eq!(weighted_quantile(&values, &weights, 0.3), 10.0);
        assert!((weighted_quantile(&values, &weights, 0.625) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_order_does_not_matter() {
        let a = weighted_quantile(&[3.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 0.4);
        let b = weighted_quantile(&[1.0, 2.0, 3.0], &[2.0, 3.0, 1.0], 0.4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_quantile_is_nan() {
        assert!(weighted_quantile(&[], &[], 0.5).is_nan());
        assert!(weighted_quantile(&[1.0], &[0.0], 0.5).is_nan());
    }

    #[test]
    fn test_aggregates() {
        let values = [0.0, 100.0, 200.0];
        let weights = [1.0, 2.0, 1.0];
        let agg = Aggregates::compute(&values, &weights, 12.0);
        assert_eq!(agg.sum, 400.0 * 12.0);
        assert_eq!(agg.nonzero, 3.0);
        assert_eq!(agg.quantiles.len(), 11);
        assert_eq!(agg.quantiles[0], 0.0);
        assert_eq!(agg.quantiles[10], 200.0 * 12.0);
        assert_eq!(quantile_label(aggregate_quantiles()[5]), "q50");
    }

    #[test]
    fn test_positive_subset() {
        let (values, weights) = positive_subset(&[0.0, 5.0, -1.0, 7.0], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values, vec![5.0, 7.0]);
        assert_eq!(weights, vec![2.0, 4.0]);
    }
}
