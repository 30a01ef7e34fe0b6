//! Expense variables

use crate::error::Result;
use crate::models::{Entity, VariableSet};
use crate::raw::{HOUSEHOLD_ID, PERSON_ID};
use crate::schema::FrsTable;
use crate::transform::WEEKS_IN_YEAR;
use crate::transform::frame::{group_sum, log_orphans, quantile_linear, scale};
use crate::transform::frs::MappingContext;
use crate::transform::person::weekly_registered_childcare;

/// `GVTREGNO` of Scotland, where water is charged separately
const SCOTLAND: f64 = 12.0;
/// `GVTREGNO` of Northern Ireland, which reports housing costs separately
const NORTHERN_IRELAND: f64 = 13.0;
/// Upper percentile at which personal pension contributions are capped
const PENSION_CONTRIBUTION_CAP_QUANTILE: f64 = 0.95;
/// Number of service charge columns on the household table
const SERVICE_CHARGE_COLUMNS: usize = 9;

pub(super) fn add_expenses(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    let maintenance = ctx.tables.require(FrsTable::Maintenance)?;
    let usual_flag = maintenance.numeric("MRUS")?;
    let usual = maintenance.numeric("MRUAMT")?;
    let last = maintenance.numeric("MRAMT")?;
    let paid: Vec<f64> = (0..maintenance.num_rows())
        .map(|i| if usual_flag[i] == 2.0 { usual[i] } else { last[i] })
        .collect();
    let (paid, orphans) = group_sum(&ctx.persons, &maintenance.ids(PERSON_ID)?, &paid, |_| true);
    log_orphans(maintenance.name(), orphans);
    set.insert_float("maintenance_expenses", Entity::Person, scale(&paid, WEEKS_IN_YEAR))?;

    let childcare =
        weekly_registered_childcare(ctx.tables.require(FrsTable::Childcare)?, &ctx.persons)?;
    set.insert_float("childcare_expenses", Entity::Person, scale(&childcare, WEEKS_IN_YEAR))?;

    add_pension_contributions(ctx, set)?;
    add_housing_costs(ctx, set)?;

    set.insert_float(
        "benunit_rent",
        Entity::Benunit,
        ctx.benunit.numeric_filled("BURENT", 0.0)?,
    )?;
    Ok(())
}

fn add_pension_contributions(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    let provision = ctx.tables.require(FrsTable::PensionProvision)?;
    let keys = provision.ids(PERSON_ID)?;
    let amount = provision.numeric("PENAMT")?;
    let scheme = provision.numeric("STEMPPEN")?;

    let (personal, orphans) = group_sum(&ctx.persons, &keys, amount, |row| {
        scheme[row] == 5.0 || scheme[row] == 6.0
    });
    log_orphans(provision.name(), orphans);
    set.insert_float(
        "private_pension_contributions",
        Entity::Person,
        scale(&cap_contributions(&personal, amount), WEEKS_IN_YEAR),
    )?;

    let (employer, _) = group_sum(&ctx.persons, &keys, amount, |row| {
        (1.0..=4.0).contains(&scheme[row])
    });
    set.insert_float(
        "employer_pension_contributions",
        Entity::Person,
        scale(&employer, WEEKS_IN_YEAR),
    )?;
    Ok(())
}

fn add_housing_costs(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    let region = ctx.household.numeric("GVTREGNO")?;
    let gb_costs = ctx.household("GBHSCOST")?;
    let ni_costs = ctx.household("NIHSCOST")?;
    let housing_costs: Vec<f64> = (0..ctx.households.len())
        .map(|i| {
            let cost = if region[i] == NORTHERN_IRELAND { ni_costs[i] } else { gb_costs[i] };
            cost * WEEKS_IN_YEAR
        })
        .collect();
    set.insert_float("housing_costs", Entity::Household, housing_costs)?;
    set.insert_float("rent", Entity::Household, scale(&ctx.household("HHRENT")?, WEEKS_IN_YEAR))?;
    set.insert_float(
        "mortgage_interest_repayment",
        Entity::Household,
        scale(&ctx.household("MORTINT")?, WEEKS_IN_YEAR),
    )?;

    let mortgage = ctx.tables.require(FrsTable::Mortgage)?;
    let repayment_type = mortgage.numeric("RMORT")?;
    let remaining = mortgage.numeric("RMAMT")?;
    let borrowed = mortgage.numeric("BORRAMT")?;
    let term = mortgage.numeric("MORTEND")?;
    let skipped = term.iter().filter(|&&t| t.is_nan() || t <= 0.0).count();
    if skipped > 0 {
        log::warn!("{skipped} mortgages without a positive remaining term were skipped");
    }
    let annual_capital: Vec<Option<f64>> = (0..mortgage.num_rows())
        .map(|i| capital_repayment(repayment_type[i], remaining[i], borrowed[i], term[i]))
        .collect();
    let amounts: Vec<f64> = annual_capital.iter().map(|c| c.unwrap_or(0.0)).collect();
    let (capital, orphans) = group_sum(
        &ctx.households,
        &mortgage.ids(HOUSEHOLD_ID)?,
        &amounts,
        |row| annual_capital[row].is_some(),
    );
    log_orphans(mortgage.name(), orphans);
    set.insert_float("mortgage_capital_repayment", Entity::Household, capital)?;

    let mut service_charges = vec![0.0; ctx.households.len()];
    for i in 1..=SERVICE_CHARGE_COLUMNS {
        for (total, charge) in service_charges
            .iter_mut()
            .zip(ctx.household(&format!("CHRGAMT{i}"))?)
        {
            if charge > 0.0 {
                *total += charge;
            }
        }
    }
    set.insert_float(
        "housing_service_charges",
        Entity::Household,
        scale(&service_charges, WEEKS_IN_YEAR),
    )?;

    let sewerage = ctx.household("CSEWAMT")?;
    let water = ctx.household("CWATAMTD")?;
    let combined = ctx.household("WATSEWRT")?;
    let water_charges: Vec<f64> = (0..ctx.households.len())
        .map(|i| {
            let charge = if region[i] == SCOTLAND { sewerage[i] + water[i] } else { combined[i] };
            charge * WEEKS_IN_YEAR
        })
        .collect();
    set.insert_float("water_and_sewerage_charges", Entity::Household, water_charges)?;
    Ok(())
}

/// Personal contributions clipped to `[0, p95]` of every provision amount
fn cap_contributions(personal: &[f64], amounts: &[f64]) -> Vec<f64> {
    let cap = quantile_linear(amounts, PENSION_CONTRIBUTION_CAP_QUANTILE);
    personal
        .iter()
        .map(|&v| if cap.is_nan() { v.max(0.0) } else { v.clamp(0.0, cap.max(0.0)) })
        .collect()
}

/// Capital repaid per year on one mortgage, `None` without a positive term
///
/// Repayment mortgages (`RMORT == 1`) repay the remaining amount, others the
/// amount borrowed.
fn capital_repayment(
    repayment_type: f64,
    remaining: f64,
    borrowed: f64,
    term: f64,
) -> Option<f64> {
    if term.is_nan() || term <= 0.0 {
        return None;
    }
    let principal = if repayment_type == 1.0 { remaining } else { borrowed };
    Some(principal / term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capital_repayment_divides_by_the_term() {
        assert_eq!(capital_repayment(1.0, 100_000.0, 120_000.0, 20.0), Some(5000.0));
        assert_eq!(capital_repayment(2.0, 100_000.0, 120_000.0, 20.0), Some(6000.0));
    }

    #[test]
    fn test_capital_repayment_skips_unusable_terms() {
        assert_eq!(capital_repayment(1.0, 100_000.0, 0.0, 0.0), None);
        assert_eq!(capital_repayment(1.0, 100_000.0, 0.0, -3.0), None);
        assert_eq!(capital_repayment(1.0, 100_000.0, 0.0, f64::NAN), None);
    }

    #[test]
    fn test_contributions_are_capped_at_the_95th_percentile() {
        // p95 of [0, 10, 20, 30, 1000] is 30 + 0.8 * 970
        let amounts = [0.0, 10.0, 20.0, 30.0, 1000.0];
        let capped = cap_contributions(&[1000.0, 15.0, -4.0], &amounts);
        assert!((capped[0] - 806.0).abs() < 1e-9);
        assert_eq!(capped[1], 15.0);
        assert_eq!(capped[2], 0.0);
    }

    #[test]
    fn test_contributions_without_amounts_are_only_floored() {
        assert_eq!(cap_contributions(&[-1.0, 7.0], &[]), vec![0.0, 7.0]);
    }
}
