//! The `frs` dataset
//!
//! Raw survey columns mapped onto named, typed variables. Weekly amounts are
//! annualised by [`WEEKS_IN_YEAR`](crate::transform::WEEKS_IN_YEAR). Every variable is listed in
//! [`frs_variables`](crate::schema::frs_variables) and the output is checked
//! against that catalogue before it is returned.

mod benefits;
mod expenses;
mod household;
mod ids;
mod income;
mod personal;

use crate::error::Result;
use crate::models::types::{SurveyCode, labels, recode};
use crate::models::VariableSet;
use crate::raw::{BENUNIT_ID, HOUSEHOLD_ID, PERSON_ID, RawTable, RawTables};
use crate::schema::{FrsTable, check_against_catalogue, frs_variables};
use crate::transform::frame::{EntityIndex, broadcast};
use crate::transform::person::person_frame;

pub use income::SELF_EMPLOYMENT_CORRECTIONS;

/// Dataset name of the variable-mapping transform
pub const FRS: &str = "frs";

/// Tables and indices shared by the variable groups
pub(crate) struct MappingContext<'a> {
    pub tables: &'a RawTables,
    pub person: RawTable,
    pub benunit: RawTable,
    pub household: RawTable,
    pub persons: EntityIndex,
    pub benunits: EntityIndex,
    pub households: EntityIndex,
    /// Household of every person, in person order
    pub person_households: Vec<i64>,
    /// Benefit unit of every person, in person order
    pub person_benunits: Vec<i64>,
}

impl<'a> MappingContext<'a> {
    fn new(tables: &'a RawTables) -> Result<Self> {
        let person = person_frame(tables)?;
        let benunit = tables.require(FrsTable::Benunit)?.sorted_by(BENUNIT_ID)?;
        let household = tables.require(FrsTable::Household)?.sorted_by(HOUSEHOLD_ID)?;
        Ok(Self {
            tables,
            persons: EntityIndex::new(person.ids(PERSON_ID)?)?,
            benunits: EntityIndex::new(benunit.ids(BENUNIT_ID)?)?,
            households: EntityIndex::new(household.ids(HOUSEHOLD_ID)?)?,
            person_households: person.ids(HOUSEHOLD_ID)?,
            person_benunits: person.ids(BENUNIT_ID)?,
            person,
            benunit,
            household,
        })
    }

    /// Person column with missing cells as zero
    pub fn person(&self, column: &str) -> Result<Vec<f64>> {
        self.person.numeric_filled(column, 0.0)
    }

    /// Household column with missing cells as zero
    pub fn household(&self, column: &str) -> Result<Vec<f64>> {
        self.household.numeric_filled(column, 0.0)
    }

    /// Whether each person is the household reference person
    pub fn is_household_head(&self) -> Result<Vec<bool>> {
        Ok(self.person("HRPID")?.iter().map(|&v| v == 1.0).collect())
    }

    /// A household value for every person
    pub fn household_to_person(&self, values: &[f64]) -> Result<Vec<f64>> {
        broadcast(&self.households, values, &self.person_households, "Household")
    }
}

/// Recode raw cells to labels, warning about codes outside the lookup
pub(crate) fn recode_labels<T: SurveyCode>(values: &[f64], variable: &str) -> Vec<String> {
    let (codes, unknown) = recode::<T>(values);
    if unknown > 0 {
        log::warn!(
            "{unknown} of {} {variable} values have unrecognised codes",
            values.len()
        );
    }
    labels(&codes)
}

/// Build the `frs` variables for one year
///
/// # Arguments
/// * `tables` - Raw tables, at least those in [`FrsTable::ALL`]
pub fn transform(tables: &RawTables) -> Result<VariableSet> {
    let ctx = MappingContext::new(tables)?;
    let mut set = VariableSet::new(tables.year());

    ids::add_id_variables(&ctx, &mut set)?;
    personal::add_personal_variables(&ctx, &mut set)?;
    household::add_household_variables(&ctx, &mut set)?;
    income::add_market_income(&ctx, &mut set)?;
    benefits::add_benefit_income(&ctx, &mut set)?;
    expenses::add_expenses(&ctx, &mut set)?;

    check_against_catalogue(&set, &frs_variables())?;
    set.ensure_complete()?;

    log::info!(
        "Built {FRS} {} with {} variables for {} persons",
        tables.year(),
        set.len(),
        ctx.persons.len()
    );
    Ok(set)
}
