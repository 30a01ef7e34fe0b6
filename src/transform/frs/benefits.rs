//! Reported benefit receipts

use crate::error::Result;
use crate::models::{Entity, VariableSet};
use crate::raw::PERSON_ID;
use crate::schema::{BENEFIT_PROGRAMS, ESA_CODE, FrsTable, JSA_CODE};
use crate::transform::WEEKS_IN_YEAR;
use crate::transform::frame::{group_sum, log_orphans, scale};
use crate::transform::frs::MappingContext;
use crate::transform::person::{BenefitKey, benefit_keys};

/// Reported as an annual lump sum rather than weekly
const WINTER_FUEL_ALLOWANCE: &str = "winter_fuel_allowance";
/// Bereavement support codes
const BEREAVEMENT_CODES: [i64; 2] = [6, 9];

pub(super) fn add_benefit_income(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    let benefits = ctx.tables.require(FrsTable::Benefits)?;
    let keys = benefits.ids(PERSON_ID)?;
    let amounts = benefits.numeric("BENAMT")?;
    let benefit_keys = benefit_keys(benefits)?;

    let weekly = |keep: &dyn Fn(&BenefitKey) -> bool| {
        group_sum(&ctx.persons, &keys, amounts, |row| keep(&benefit_keys[row]))
    };

    let (_, orphans) = weekly(&|_| true);
    log_orphans(benefits.name(), orphans);

    for (program, code) in BENEFIT_PROGRAMS {
        let (sums, _) = weekly(&|key| key.code == code);
        let values = if program == WINTER_FUEL_ALLOWANCE {
            sums
        } else {
            scale(&sums, WEEKS_IN_YEAR)
        };
        set.insert_float(&format!("{program}_reported"), Entity::Person, values)?;
    }

    let (bereavement, _) = weekly(&|key| BEREAVEMENT_CODES.contains(&key.code));
    set.insert_float("BSP_reported", Entity::Person, scale(&bereavement, WEEKS_IN_YEAR))?;

    for (name, code) in [("JSA", JSA_CODE), ("ESA", ESA_CODE)] {
        for (variant, income_related) in [("contrib", false), ("income", true)] {
            let target = BenefitKey {
                code,
                income_related,
            };
            let (sums, _) = weekly(&|key| *key == target);
            set.insert_float(
                &format!("{name}_{variant}_reported"),
                Entity::Person,
                scale(&sums, WEEKS_IN_YEAR),
            )?;
        }
    }

    set.insert_float(
        "SSP_reported",
        Entity::Person,
        scale(&ctx.person("SSPADJ")?, WEEKS_IN_YEAR),
    )?;
    set.insert_float("student_loans", Entity::Person, ctx.person("TUBORR")?)?;

    let weekly_support = ["ADEMAAMT", "CHEMAAMT", "ACCSSAMT"]
        .into_iter()
        .map(|column| ctx.person(column))
        .collect::<Result<Vec<_>>>()?;
    let grants = [ctx.person("GRTDIR1")?, ctx.person("GRTDIR2")?];
    let student_payments: Vec<f64> = (0..ctx.persons.len())
        .map(|i| {
            weekly_support.iter().map(|c| c[i]).sum::<f64>() * WEEKS_IN_YEAR
                + grants.iter().map(|c| c[i]).sum::<f64>()
        })
        .collect();
    set.insert_float("student_payments", Entity::Person, student_payments)?;

    let rebate = ctx.household_to_person(&ctx.household("CTREBAMT")?)?;
    let is_head = ctx.is_household_head()?;
    let council_tax_benefit: Vec<f64> = rebate
        .iter()
        .zip(&is_head)
        .map(|(&amount, &head)| if head { amount * WEEKS_IN_YEAR } else { 0.0 })
        .collect();
    set.insert_float("council_tax_benefit_reported", Entity::Person, council_tax_benefit)?;
    Ok(())
}
