//! Demographic variables

use crate::error::Result;
use crate::models::types::{EducationLevel, EmploymentStatus, Gender, MaritalStatus, code_from_f64};
use crate::models::{Entity, VariableSet, VariableValues};
use crate::transform::frs::{MappingContext, recode_labels};
use crate::transform::person::ROLE;

/// `MARITAL` code assumed where none is recorded
const DEFAULT_MARITAL_CODE: f64 = 2.0;

pub(super) fn add_personal_variables(
    ctx: &MappingContext<'_>,
    set: &mut VariableSet,
) -> Result<()> {
    let age: Vec<f64> = ctx
        .person("AGE80")?
        .iter()
        .zip(ctx.person("AGE")?)
        .map(|(a, b)| a + b)
        .collect();

    set.insert_float("age", Entity::Person, age.clone())?;
    set.insert(
        "role",
        Entity::Person,
        VariableValues::Category(ctx.person.text(ROLE)?.to_vec()),
    )?;
    set.insert(
        "gender",
        Entity::Person,
        VariableValues::Category(recode_labels::<Gender>(&ctx.person("SEX")?, "gender")),
    )?;
    set.insert(
        "is_household_head",
        Entity::Person,
        VariableValues::Bool(ctx.is_household_head()?),
    )?;
    set.insert(
        "is_benunit_head",
        Entity::Person,
        VariableValues::Bool(ctx.person("UPERSON")?.iter().map(|&v| v == 1.0).collect()),
    )?;

    // Children have no marital status recorded
    let marital: Vec<f64> = ctx
        .person("MARITAL")?
        .into_iter()
        .map(|v| if v == 0.0 { DEFAULT_MARITAL_CODE } else { v })
        .collect();
    set.insert(
        "marital_status",
        Entity::Person,
        VariableValues::Category(recode_labels::<MaritalStatus>(&marital, "marital_status")),
    )?;

    let education: Vec<String> = ctx
        .person("FTED")?
        .iter()
        .zip(ctx.person("TYPEED2")?)
        .zip(&age)
        .map(|((&fted, typeed2), &age)| {
            EducationLevel::classify(code_from_f64(fted), code_from_f64(typeed2), age)
                .label()
                .to_string()
        })
        .collect();
    set.insert("highest_education", Entity::Person, VariableValues::Category(education))?;

    set.insert(
        "employment_status",
        Entity::Person,
        VariableValues::Category(recode_labels::<EmploymentStatus>(
            &ctx.person("EMPSTATI")?,
            "employment_status",
        )),
    )?;
    Ok(())
}
