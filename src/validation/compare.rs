//! Comparisons of generated variables against UKMOD
//!
//! Every pair gets weighted quantiles over positive values, the weighted
//! total, the weighted positive count, and two household-level checks: the
//! mean relative error among households UKMOD puts above zero, and the share
//! of households on which both agree about positivity.

use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::config::ValidationConfig;
use crate::error::Result;
use crate::models::entity::household_of_benunit;
use crate::models::{Entity, VariableSet};
use crate::reference::AggregateTable;
use crate::transform::frame::{EntityIndex, group_sum, unique_sorted};
use crate::validation::mapping::VariablePair;
use crate::validation::report::ValidationReport;
use crate::validation::stats::{
    Aggregates, aggregate_quantiles, positive_subset, quantile_label, weighted_count,
    weighted_quantile, weighted_sum,
};

/// Values of a variable with the weights of its entity
fn weighted_values(set: &VariableSet, name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let entity = set.require(name)?.entity;
    Ok((set.f64_values(name)?, set.f64_values(entity.weight_variable())?))
}

/// Household totals of a variable, keyed by household identifier
pub fn household_totals(set: &VariableSet, name: &str) -> Result<FxHashMap<i64, f64>> {
    let variable = set.require(name)?;
    let values = set.f64_values(name)?;

    let (households, totals) = match variable.entity {
        Entity::Household => (set.ids("household_id")?, values),
        entity => {
            let keys = match entity {
                Entity::Benunit => set
                    .ids("benunit_id")?
                    .into_iter()
                    .map(household_of_benunit)
                    .collect(),
                _ => set.ids("person_household_id")?,
            };
            let households = if set.contains("household_id") {
                set.ids("household_id")?
            } else {
                unique_sorted(&keys)
            };
            let index = EntityIndex::new(households.clone())?;
            let (totals, _) = group_sum(&index, &keys, &values, |_| true);
            (households, totals)
        }
    };
    Ok(households.into_iter().zip(totals).collect())
}

/// Distribution and household checks of one pair
fn compare_pair(
    generated: &VariableSet,
    reference: &VariableSet,
    pair: &VariablePair,
    quantiles: &[f64],
    report: &mut ValidationReport,
) -> Result<()> {
    let (ours, our_weights) = weighted_values(generated, &pair.name)?;
    let (theirs, their_weights) = weighted_values(reference, &pair.ukmod)?;
    let tolerances = &pair.tolerances;

    let (our_positive, our_positive_weights) = positive_subset(&ours, &our_weights);
    let (their_positive, their_positive_weights) = positive_subset(&theirs, &their_weights);
    for &q in quantiles {
        let result = weighted_quantile(&our_positive, &our_positive_weights, q);
        let target = weighted_quantile(&their_positive, &their_positive_weights, q);
        let passed = tolerances.quantile.passes(result, target);
        report.push(&pair.name, &pair.ukmod, quantile_label(q), result, target, passed);
    }

    let result = weighted_sum(&ours, &our_weights);
    let target = weighted_sum(&theirs, &their_weights);
    let passed = tolerances.aggregate.passes(result, target);
    report.push(&pair.name, &pair.ukmod, "aggregate", result, target, passed);

    let result = weighted_count(&ours, &our_weights, |v| v > 0.0);
    let target = weighted_count(&theirs, &their_weights, |v| v > 0.0);
    let passed = tolerances.aggregate.passes(result, target);
    report.push(&pair.name, &pair.ukmod, "positive_count", result, target, passed);

    let our_households = household_totals(generated, &pair.name)?;
    let their_households = household_totals(reference, &pair.ukmod)?;
    let mut matched: Vec<(f64, f64)> = their_households
        .iter()
        .filter_map(|(id, &target)| our_households.get(id).map(|&result| (result, target)))
        .collect();
    matched.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
    let unmatched = their_households.len() - matched.len();
    if unmatched > 0 {
        warn!(
            "{unmatched} UKMOD households have no generated counterpart for {}",
            pair.name
        );
    }

    let errors: Vec<f64> = matched
        .iter()
        .filter(|&&(_, target)| target > 0.0)
        .map(|&(result, target)| (result / target - 1.0).abs())
        .collect();
    let mean_error = if errors.is_empty() {
        0.0
    } else {
        errors.iter().sum::<f64>() / errors.len() as f64
    };
    report.push(
        &pair.name,
        &pair.ukmod,
        "household_mean_relative_error",
        mean_error,
        tolerances.max_mean_rel_error,
        mean_error < tolerances.max_mean_rel_error,
    );

    let agreement = if matched.is_empty() {
        1.0
    } else {
        matched
            .iter()
            .filter(|&&(result, target)| (result > 0.0) == (target > 0.0))
            .count() as f64
            / matched.len() as f64
    };
    report.push(
        &pair.name,
        &pair.ukmod,
        "household_positive_agreement",
        agreement,
        tolerances.min_nonzero_agreement,
        agreement >= tolerances.min_nonzero_agreement,
    );
    Ok(())
}

/// Deciles, total and nonzero count of one pair against the aggregate table
fn compare_aggregate_table(
    generated: &VariableSet,
    table: &AggregateTable,
    pair: &VariablePair,
    report: &mut ValidationReport,
) -> Result<()> {
    let (values, weights) = weighted_values(generated, &pair.name)?;
    let ours = Aggregates::compute(&values, &weights, 1.0);
    let theirs = table.get(&pair.ukmod)?;
    let tolerance = pair.tolerances.aggregate_table;

    for ((q, &result), &target) in aggregate_quantiles()
        .into_iter()
        .zip(&ours.quantiles)
        .zip(&theirs.quantiles)
    {
        let metric = format!("table_{}", quantile_label(q));
        let passed = tolerance.passes(result, target);
        report.push(&pair.name, &pair.ukmod, metric, result, target, passed);
    }
    report.push(
        &pair.name,
        &pair.ukmod,
        "table_sum",
        ours.sum,
        theirs.sum,
        tolerance.passes(ours.sum, theirs.sum),
    );
    report.push(
        &pair.name,
        &pair.ukmod,
        "table_nonzero",
        ours.nonzero,
        theirs.nonzero,
        tolerance.passes(ours.nonzero, theirs.nonzero),
    );
    Ok(())
}

/// Compare a generated dataset with UKMOD
///
/// # Arguments
/// * `generated` - Generated dataset, e.g. `frs`
/// * `reference` - Converted UKMOD dataset for the same year
/// * `pairs` - Variables to compare
/// * `aggregates` - Optional UKMOD aggregate table for the same year
/// * `config` - Quantiles to check
pub fn validate(
    generated: &VariableSet,
    reference: &VariableSet,
    pairs: &[VariablePair],
    aggregates: Option<&AggregateTable>,
    config: &ValidationConfig,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::new(generated.year());
    for pair in pairs {
        compare_pair(generated, reference, pair, &config.quantiles, &mut report)?;
        if let Some(table) = aggregates {
            compare_aggregate_table(generated, table, pair, &mut report)?;
        }
    }

    let failures = report.failures().count();
    info!(
        "Validation for {}: {} checks, {failures} failed",
        generated.year(),
        report.checks.len()
    );
    Ok(report)
}
