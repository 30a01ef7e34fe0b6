//! Weighted nearest-neighbour hot-deck matching
//!
//! Predictors are standardized with the donors' weighted mean and standard
//! deviation. For every recipient the `k` closest donors are found by
//! Euclidean distance, and one of them is drawn with probability
//! proportional to its weight.

use log::{debug, info};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;

use crate::error::{FrsError, Result};

/// Donor pool prepared for matching
#[derive(Debug, Clone)]
pub struct HotDeck {
    means: Vec<f64>,
    scales: Vec<f64>,
    /// Standardized donor predictors, one row per donor
    donors: Vec<Vec<f64>>,
    weights: Vec<f64>,
    neighbours: usize,
}

/// Weighted mean and standard deviation of one predictor
fn weighted_moments(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let total: f64 = weights.iter().sum();
    let mean = values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total;
    let variance = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum::<f64>()
        / total;
    (mean, variance.sqrt())
}

impl HotDeck {
    /// Prepare donors for matching
    ///
    /// # Arguments
    /// * `predictors` - Donor predictor columns, all of the same length
    /// * `weights` - Positive donor weights
    /// * `neighbours` - Number of nearest donors to draw from
    pub fn fit(predictors: &[Vec<f64>], weights: &[f64], neighbours: usize) -> Result<Self> {
        if neighbours == 0 {
            return Err(FrsError::Imputation(
                "Matching needs at least one neighbour".to_string(),
            ));
        }
        if weights.is_empty() {
            return Err(FrsError::Imputation("No donors to match against".to_string()));
        }
        if let Some(column) = predictors.iter().find(|c| c.len() != weights.len()) {
            return Err(FrsError::Shape(format!(
                "Donor predictor has {} rows, expected {}",
                column.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0)
            || predictors.iter().flatten().any(|v| !v.is_finite())
        {
            return Err(FrsError::Imputation(
                "Donor predictors and weights must be finite with positive weights".to_string(),
            ));
        }

        let (means, scales): (Vec<f64>, Vec<f64>) = predictors
            .iter()
            .map(|column| {
                let (mean, sd) = weighted_moments(column, weights);
                (mean, if sd > 0.0 { sd } else { 1.0 })
            })
            .unzip();

        let donors = (0..weights.len())
            .map(|row| {
                predictors
                    .iter()
                    .enumerate()
                    .map(|(j, column)| (column[row] - means[j]) / scales[j])
                    .collect()
            })
            .collect();

        debug!(
            "Prepared {} donors on {} predictors",
            weights.len(),
            predictors.len()
        );
        Ok(Self {
            means,
            scales,
            donors,
            weights: weights.to_vec(),
            neighbours: neighbours.min(weights.len()),
        })
    }

    /// Number of donors
    #[must_use]
    pub fn num_donors(&self) -> usize {
        self.donors.len()
    }

    /// Donors closest to a standardized point, nearest first
    ///
    /// Ties are broken by donor position so the result is deterministic.
    fn nearest(&self, point: &[f64]) -> Vec<usize> {
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(self.neighbours + 1);
        for (idx, donor) in self.donors.iter().enumerate() {
            let distance: f64 = donor
                .iter()
                .zip(point)
                .map(|(d, p)| (d - p).powi(2))
                .sum();
            if best.len() == self.neighbours
                && best.last().is_some_and(|&(worst, _)| distance >= worst)
            {
                continue;
            }
            let at = best.partition_point(|&(d, _)| d <= distance);
            best.insert(at, (distance, idx));
            best.truncate(self.neighbours);
        }
        best.into_iter().map(|(_, idx)| idx).collect()
    }

    /// Draw a donor for every recipient
    ///
    /// # Arguments
    /// * `recipients` - Recipient predictor columns, in the order used by `fit`
    /// * `rng` - Source of the weighted draws
    ///
    /// # Returns
    /// The donor position chosen for each recipient row
    pub fn match_donors(&self, recipients: &[Vec<f64>], rng: &mut StdRng) -> Result<Vec<usize>> {
        if recipients.len() != self.means.len() {
            return Err(FrsError::Shape(format!(
                "Expected {} predictors, got {}",
                self.means.len(),
                recipients.len()
            )));
        }
        let rows = recipients.first().map_or(0, Vec::len);
        if recipients.iter().any(|c| c.len() != rows) {
            return Err(FrsError::Shape(
                "Recipient predictors have different lengths".to_string(),
            ));
        }

        info!(
            "Matching {rows} recipients against {} donors with {} neighbours",
            self.num_donors(),
            self.neighbours
        );

        let mut matched = Vec::with_capacity(rows);
        let mut point = vec![0.0; recipients.len()];
        for row in 0..rows {
            for (j, column) in recipients.iter().enumerate() {
                let value = column[row];
                if !value.is_finite() {
                    return Err(FrsError::Imputation(format!(
                        "Recipient {row} has a missing predictor"
                    )));
                }
                point[j] = (value - self.means[j]) / self.scales[j];
            }

            let candidates = self.nearest(&point);
            let chooser = WeightedIndex::new(candidates.iter().map(|&i| self.weights[i]))
                .map_err(|e| FrsError::Imputation(format!("Cannot draw a donor: {e}")))?;
            matched.push(candidates[chooser.sample(rng)]);
        }
        Ok(matched)
    }
}
