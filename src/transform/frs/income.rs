//! Market income variables

use crate::error::Result;
use crate::models::{Entity, VariableSet};
use crate::raw::PERSON_ID;
use crate::schema::FrsTable;
use crate::transform::WEEKS_IN_YEAR;
use crate::transform::frame::{group_sum, log_orphans, scale};
use crate::transform::frs::MappingContext;
use crate::transform::person::weekly_pension_income;

/// Persons whose self-employment profit is taken from their job records
/// instead of the adult-level total, as `(year, person_id)`
pub const SELF_EMPLOYMENT_CORRECTIONS: [(i32, i64); 1] = [(2018, 806_911)];

/// Account types paying dividends
const DIVIDEND_ACCOUNTS: [i64; 7] = [7, 8, 9, 13, 22, 23, 24];
/// Account types whose interest is tax free
const TAX_FREE_SAVINGS_ACCOUNTS: [i64; 3] = [6, 14, 21];
/// Tax deducted at source, as a share of the net amount
const TAX_DEDUCTED_SHARE: f64 = 0.25;

pub(super) fn add_market_income(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    set.insert_float(
        "employment_income",
        Entity::Person,
        scale(&ctx.person("INEARNS")?, WEEKS_IN_YEAR),
    )?;

    let pension = weekly_pension_income(ctx.tables.require(FrsTable::Pension)?, &ctx.persons)?;
    set.insert_float("pension_income", Entity::Person, scale(&pension, WEEKS_IN_YEAR))?;

    set.insert_float(
        "self_employment_income",
        Entity::Person,
        scale(&self_employment(ctx)?, WEEKS_IN_YEAR),
    )?;

    add_investment_income(ctx, set)?;

    let is_head = ctx.is_household_head()?;
    let tenure = ctx.household("TENTYP2")?;
    let subrent = ctx.household("SUBRENT")?;
    let sublet: Vec<f64> = tenure
        .iter()
        .zip(&subrent)
        .map(|(&t, &rent)| if t == 5.0 || t == 6.0 { rent } else { 0.0 })
        .collect();
    let sublet = ctx.household_to_person(&sublet)?;
    let cvpay = ctx.person("CVPAY")?;
    let royalties = ctx.person("ROYYR1")?;
    let property: Vec<f64> = (0..ctx.persons.len())
        .map(|i| {
            let head_share = if is_head[i] { sublet[i] } else { 0.0 };
            (head_share + cvpay[i] + royalties[i]) * WEEKS_IN_YEAR
        })
        .collect();
    set.insert_float("property_income", Entity::Person, property)?;

    let maintenance = sum_rows(&[
        maintenance_received(ctx, "MNTUS1", "MNTUSAM1", "MNTAMT1")?,
        maintenance_received(ctx, "MNTUS2", "MNTUSAM2", "MNTAMT2")?,
    ]);
    set.insert_float("maintenance_income", Entity::Person, scale(&maintenance, WEEKS_IN_YEAR))?;

    let oddjob = ctx.tables.require(FrsTable::OddJob)?;
    let current = oddjob.numeric("OJNOW")?;
    let (odd_jobs, orphans) = group_sum(
        &ctx.persons,
        &oddjob.ids(PERSON_ID)?,
        oddjob.numeric("OJAMT")?,
        |row| current[row] == 1.0,
    );
    log_orphans(oddjob.name(), orphans);
    let mut miscellaneous = vec![odd_jobs];
    for column in ["ALLPAY2", "ROYYR2", "ROYYR3", "ROYYR4", "CHAMTERN", "CHAMTTST"] {
        miscellaneous.push(ctx.person(column)?);
    }
    set.insert_float(
        "miscellaneous_income",
        Entity::Person,
        scale(&sum_rows(&miscellaneous), WEEKS_IN_YEAR),
    )?;

    let transfers = ["APAMT", "APDAMT", "PAREAMT", "ALLPAY1", "ALLPAY3", "ALLPAY4"]
        .into_iter()
        .map(|column| ctx.person(column))
        .collect::<Result<Vec<_>>>()?;
    set.insert_float(
        "private_transfer_income",
        Entity::Person,
        scale(&sum_rows(&transfers), WEEKS_IN_YEAR),
    )?;

    set.insert_float("lump_sum_income", Entity::Person, ctx.person("REDAMT")?)?;
    Ok(())
}

/// Element-wise sum of equally long columns
fn sum_rows(columns: &[Vec<f64>]) -> Vec<f64> {
    let len = columns.first().map_or(0, Vec::len);
    (0..len).map(|i| columns.iter().map(|c| c[i]).sum()).collect()
}

/// Weekly self-employment profit, applying the job-record corrections
fn self_employment(ctx: &MappingContext<'_>) -> Result<Vec<f64>> {
    let mut profit = ctx.person("SEINCAM2")?;
    let corrections: Vec<i64> = SELF_EMPLOYMENT_CORRECTIONS
        .iter()
        .filter(|(year, _)| *year == ctx.tables.year())
        .map(|&(_, person)| person)
        .collect();
    if corrections.is_empty() {
        return Ok(profit);
    }

    let job = ctx.tables.require(FrsTable::Job)?;
    let (from_jobs, _) = group_sum(
        &ctx.persons,
        &job.ids(PERSON_ID)?,
        job.numeric("SEINCAMT")?,
        |_| true,
    );
    for person in corrections {
        if let Some(pos) = ctx.persons.position(person) {
            log::debug!("Taking self-employment profit of person {person} from job records");
            profit[pos] = from_jobs[pos];
        }
    }
    Ok(profit)
}

fn add_investment_income(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    let accounts = ctx.tables.require(FrsTable::Accounts)?;
    let keys = accounts.ids(PERSON_ID)?;
    let interest = accounts.numeric("ACCINT")?;
    let account = accounts.numeric("ACCOUNT")?;
    let invtax = accounts.numeric("INVTAX")?;
    let acctax = accounts.numeric("ACCTAX")?;
    let is_type = |row: usize, types: &[i64]| {
        account[row].is_finite() && types.contains(&(account[row].round() as i64))
    };

    let annual_sum = |keep: &dyn Fn(usize) -> bool| {
        let (sums, orphans) = group_sum(&ctx.persons, &keys, interest, keep);
        (scale(&sums, WEEKS_IN_YEAR), orphans)
    };

    let (tax_free, orphans) = annual_sum(&|row| is_type(row, &TAX_FREE_SAVINGS_ACCOUNTS));
    log_orphans(accounts.name(), orphans);
    let (dividends, _) = annual_sum(&|row| is_type(row, &DIVIDEND_ACCOUNTS));
    let (dividend_tax, _) = annual_sum(&|row| invtax[row] == 1.0);
    let (all_interest, _) = annual_sum(&|_| true);
    let (interest_tax, _) = annual_sum(&|row| acctax[row] == 1.0);

    let dividend_income: Vec<f64> = dividends
        .iter()
        .zip(&dividend_tax)
        .map(|(d, tax)| d + tax * TAX_DEDUCTED_SHARE)
        .collect();
    let savings_interest: Vec<f64> = (0..ctx.persons.len())
        .map(|i| all_interest[i] + interest_tax[i] * TAX_DEDUCTED_SHARE - dividend_income[i])
        .collect();

    set.insert_float("tax_free_savings_income", Entity::Person, tax_free)?;
    set.insert_float("dividend_income", Entity::Person, dividend_income)?;
    set.insert_float("savings_interest_income", Entity::Person, savings_interest)?;
    Ok(())
}

/// Weekly maintenance received from one source; the usual amount is used
/// when the respondent says the last payment was not usual
fn maintenance_received(
    ctx: &MappingContext<'_>,
    usual_flag: &str,
    usual_amount: &str,
    last_amount: &str,
) -> Result<Vec<f64>> {
    let flag = ctx.person(usual_flag)?;
    let usual = ctx.person(usual_amount)?;
    let last = ctx.person(last_amount)?;
    Ok((0..flag.len())
        .map(|i| {
            let amount = if flag[i] == 2.0 { usual[i] } else { last[i] };
            amount.max(0.0)
        })
        .collect())
}
