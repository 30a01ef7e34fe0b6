//! Variable definitions for the `frs` dataset
//!
//! A single source of truth for the names, entities and kinds of the
//! variables the mapping transform produces. Output is checked against it
//! before anything is written.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::{FrsError, Result};
use crate::models::{Entity, ValueKind, VariableSet};

/// Benefit programs reported per person, with their `BENEFIT` codes
pub const BENEFIT_PROGRAMS: [(&str, i64); 20] = [
    ("child_benefit", 3),
    ("income_support", 19),
    ("housing_benefit", 94),
    ("AA", 12),
    ("DLA_SC", 1),
    ("DLA_M", 2),
    ("IIDB", 15),
    ("carers_allowance", 13),
    ("SDA", 10),
    ("AFCS", 8),
    ("maternity_allowance", 21),
    ("pension_credit", 4),
    ("child_tax_credit", 91),
    ("working_tax_credit", 90),
    ("state_pension", 5),
    ("winter_fuel_allowance", 62),
    ("incapacity_benefit", 17),
    ("universal_credit", 95),
    ("PIP_M", 97),
    ("PIP_DL", 96),
];

/// `BENEFIT` code of Jobseeker's Allowance
pub const JSA_CODE: i64 = 14;
/// `BENEFIT` code of Employment and Support Allowance
pub const ESA_CODE: i64 = 16;

/// Definition of one output variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDefinition {
    /// Name in the store
    pub name: String,
    /// Short description
    pub description: String,
    /// Entity the variable is indexed by
    pub entity: Entity,
    /// Storage kind
    pub kind: ValueKind,
}

impl VariableDefinition {
    /// Create a new variable definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        entity: Entity,
        kind: ValueKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            entity,
            kind,
        }
    }
}

impl fmt::Display for VariableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.entity, self.kind)
    }
}

fn def(name: &str, entity: Entity, kind: ValueKind, description: &str) -> VariableDefinition {
    VariableDefinition::new(name, description, entity, kind)
}

/// Every variable of the `frs` dataset, in output order
#[must_use]
pub fn frs_variables() -> Vec<VariableDefinition> {
    use Entity::{Benunit, Household, Person};
    use ValueKind::{Bool, Category, Float, Int};

    let mut defs = vec![
        def("person_id", Person, Int, "Person identifier"),
        def("person_benunit_id", Person, Int, "Benefit unit of the person"),
        def("person_household_id", Person, Int, "Household of the person"),
        def("benunit_id", Benunit, Int, "Benefit unit identifier"),
        def("household_id", Household, Int, "Household identifier"),
        def("person_weight", Person, Float, "Grossing weight of the person's household"),
        def("benunit_weight", Benunit, Float, "Benefit unit grossing weight"),
        def("household_weight", Household, Float, "Household grossing weight"),
        def("age", Person, Float, "Age in years"),
        def("role", Person, Category, "Adult or child"),
        def("gender", Person, Category, "Sex"),
        def("is_household_head", Person, Bool, "Household reference person"),
        def("is_benunit_head", Person, Bool, "Head of the benefit unit"),
        def("marital_status", Person, Category, "Marital status"),
        def("highest_education", Person, Category, "Stage of education attended"),
        def("employment_status", Person, Category, "ILO employment status"),
        def("benunit_rent", Benunit, Float, "Rent paid by the benefit unit"),
        def("region", Household, Category, "Government office region"),
        def("tenure_type", Household, Category, "Tenure"),
        def("num_bedrooms", Household, Float, "Number of bedrooms"),
        def("accommodation_type", Household, Category, "Type of accommodation"),
        def("council_tax", Household, Float, "Annual council tax"),
        def("employment_income", Person, Float, "Gross earnings from employment"),
        def("pension_income", Person, Float, "Private pension income"),
        def("self_employment_income", Person, Float, "Profit from self-employment"),
        def("tax_free_savings_income", Person, Float, "Interest from tax-free accounts"),
        def("dividend_income", Person, Float, "Dividends including tax paid"),
        def("savings_interest_income", Person, Float, "Taxable savings interest"),
        def("property_income", Person, Float, "Rent from sub-letting and royalties"),
        def("maintenance_income", Person, Float, "Maintenance received"),
        def("miscellaneous_income", Person, Float, "Odd jobs and other small incomes"),
        def("private_transfer_income", Person, Float, "Allowances from outside the household"),
        def("lump_sum_income", Person, Float, "Redundancy and other lump sums"),
    ];

    for (program, _) in BENEFIT_PROGRAMS {
        defs.push(def(
            &format!("{program}_reported"),
            Person,
            Float,
            "Reported benefit receipt",
        ));
    }

    defs.extend([
        def("BSP_reported", Person, Float, "Bereavement support payments"),
        def("JSA_contrib_reported", Person, Float, "Contribution-based JSA"),
        def("JSA_income_reported", Person, Float, "Income-based JSA"),
        def("ESA_contrib_reported", Person, Float, "Contribution-based ESA"),
        def("ESA_income_reported", Person, Float, "Income-related ESA"),
        def("SSP_reported", Person, Float, "Statutory sick pay"),
        def("student_loans", Person, Float, "Student loans taken out"),
        def("student_payments", Person, Float, "Grants and allowances for students"),
        def("council_tax_benefit_reported", Person, Float, "Council tax rebate"),
        def("maintenance_expenses", Person, Float, "Maintenance paid"),
        def("childcare_expenses", Person, Float, "Registered childcare paid for"),
        def("private_pension_contributions", Person, Float, "Personal pension contributions"),
        def("employer_pension_contributions", Person, Float, "Workplace pension contributions"),
        def("housing_costs", Household, Float, "Gross housing costs"),
        def("rent", Household, Float, "Household rent"),
        def("mortgage_interest_repayment", Household, Float, "Mortgage interest"),
        def("mortgage_capital_repayment", Household, Float, "Mortgage principal repaid"),
        def("housing_service_charges", Household, Float, "Service charges"),
        def("water_and_sewerage_charges", Household, Float, "Water and sewerage"),
    ]);

    defs
}

/// Check a generated set against a catalogue
///
/// Every defined variable must be present with the declared entity and kind,
/// and nothing outside the catalogue may appear.
pub fn check_against_catalogue(set: &VariableSet, defs: &[VariableDefinition]) -> Result<()> {
    let mut defined = FxHashSet::default();
    for definition in defs {
        defined.insert(definition.name.as_str());
        let variable = set.get(&definition.name).ok_or_else(|| {
            FrsError::Shape(format!("Variable {} was not generated", definition.name))
        })?;
        if variable.entity != definition.entity || variable.values.kind() != definition.kind {
            return Err(FrsError::Shape(format!(
                "Variable {} generated as ({}, {}), defined as {definition}",
                definition.name,
                variable.entity,
                variable.values.kind()
            )));
        }
    }

    if let Some(extra) = set.names().find(|name| !defined.contains(name)) {
        return Err(FrsError::Shape(format!(
            "Variable {extra} is not in the catalogue"
        )));
    }
    Ok(())
}
