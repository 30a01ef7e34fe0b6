//! Identifiers and grossing weights

use rustc_hash::FxHashSet;

use crate::error::{FrsError, Result};
use crate::models::entity::{benunit_of_person, household_of_benunit, household_of_person};
use crate::models::{Entity, VariableSet, VariableValues};
use crate::transform::frame::ensure_contained;
use crate::transform::frs::MappingContext;

pub(super) fn add_id_variables(ctx: &MappingContext<'_>, set: &mut VariableSet) -> Result<()> {
    check_identifier_arithmetic(ctx)?;
    ensure_contained(&ctx.benunits, &ctx.person_benunits, "Benefit unit")?;
    ensure_contained(&ctx.households, &ctx.person_households, "Household")?;

    let benunit_households: Vec<i64> = ctx
        .benunits
        .ids()
        .iter()
        .map(|&id| household_of_benunit(id))
        .collect();
    ensure_contained(&ctx.households, &benunit_households, "Household of benefit unit")?;

    let occupied: FxHashSet<i64> = ctx.person_households.iter().copied().collect();
    let empty = ctx
        .households
        .ids()
        .iter()
        .filter(|id| !occupied.contains(id))
        .count();
    if empty > 0 {
        log::warn!("{empty} households have no person records");
    }

    set.insert("person_id", Entity::Person, VariableValues::Int(ctx.persons.ids().to_vec()))?;
    set.insert(
        "person_benunit_id",
        Entity::Person,
        VariableValues::Int(ctx.person_benunits.clone()),
    )?;
    set.insert(
        "person_household_id",
        Entity::Person,
        VariableValues::Int(ctx.person_households.clone()),
    )?;
    set.insert("benunit_id", Entity::Benunit, VariableValues::Int(ctx.benunits.ids().to_vec()))?;
    set.insert(
        "household_id",
        Entity::Household,
        VariableValues::Int(ctx.households.ids().to_vec()),
    )?;

    let household_weight = ctx.household("GROSS4")?;
    set.insert_float(
        "person_weight",
        Entity::Person,
        ctx.household_to_person(&household_weight)?,
    )?;
    set.insert_float(
        "benunit_weight",
        Entity::Benunit,
        ctx.benunit.numeric_filled("GROSS4", 0.0)?,
    )?;
    set.insert_float("household_weight", Entity::Household, household_weight)?;
    Ok(())
}

/// Person identifiers must extend their benefit unit and household
fn check_identifier_arithmetic(ctx: &MappingContext<'_>) -> Result<()> {
    for ((&person, &benunit), &household) in ctx
        .persons
        .ids()
        .iter()
        .zip(&ctx.person_benunits)
        .zip(&ctx.person_households)
    {
        if benunit_of_person(person) != benunit || household_of_person(person) != household {
            return Err(FrsError::Identifier(format!(
                "Person {person} does not belong to benefit unit {benunit} of household {household}"
            )));
        }
    }
    Ok(())
}
