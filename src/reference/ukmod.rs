//! UKMOD microdata as reference datasets
//!
//! UKMOD reads and writes tab-delimited person-level files with monthly
//! amounts. Inputs and outputs are converted into the columnar store with
//! FRS-compatible identifiers and annual amounts, and a summary table of
//! deciles, totals and nonzero counts is kept for quick comparisons.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::util::{safe_create_file, safe_read_to_string};
use crate::error::{FrsError, Result};
use crate::models::entity::{ID_RADIX, benunit_id, person_id};
use crate::models::{Entity, VariableSet, VariableValues};
use crate::raw::{PERSON_ID, RawColumn, RawTable};
use crate::transform::MONTHS_IN_YEAR;
use crate::transform::frame::EntityIndex;
use crate::utils::io::read_table_file;
use crate::utils::logging::StepTimer;
use crate::validation::stats::Aggregates;

/// Dataset name of the converted UKMOD input
pub const UKMOD_INPUT: &str = "ukmod_input";
/// Dataset name of the converted UKMOD output
pub const UKMOD_OUTPUT: &str = "ukmod_output";
/// Dataset name of the UKMOD aggregate table
pub const UKMOD_AGG: &str = "ukmod_agg";

/// UKMOD grossing weight
pub const WEIGHT_COLUMN: &str = "dwt";

/// Monthly amounts in the UKMOD input file
pub const MONTHLY_INPUT_VARIABLES: [&str; 10] = [
    "yem", "ypp", "yse", "ypr", "yiynt", "tpcpe", "xhcrt", "xhcmomi", "xhc", "xcc",
];

const HOUSEHOLD_COLUMN: &str = "IDORIGHH";
const BENUNIT_COLUMN: &str = "IDORIGBENUNIT";
const PERSON_COLUMN: &str = "IDORIGPERSON";

/// Which amounts of a UKMOD file are monthly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyColumns {
    /// Only [`MONTHLY_INPUT_VARIABLES`]
    InputVariables,
    /// Every column except identifiers and the weight
    AllAmounts,
}

impl MonthlyColumns {
    fn is_monthly(self, column: &str) -> bool {
        match self {
            Self::InputVariables => MONTHLY_INPUT_VARIABLES.contains(&column),
            Self::AllAmounts => !is_identifier_column(column) && column != WEIGHT_COLUMN,
        }
    }
}

/// UKMOD identifier columns all start with `id`
#[must_use]
pub fn is_identifier_column(column: &str) -> bool {
    column.starts_with("id")
}

/// Read a UKMOD file with FRS identifiers, sorted by person
fn read_ukmod(path: &Path) -> Result<RawTable> {
    let batch = read_table_file(path)?;
    let mut raw = RawTable::from_record_batch("ukmod", &batch)?;

    let households = raw.ids(HOUSEHOLD_COLUMN)?;
    let benunits = raw.ids(BENUNIT_COLUMN)?;
    let persons = raw.ids(PERSON_COLUMN)?;
    let person_ids: Vec<f64> = (0..raw.num_rows())
        .map(|i| person_id(benunit_id(households[i], benunits[i]), persons[i]) as f64)
        .collect();
    raw.insert(PERSON_ID, RawColumn::Numeric(person_ids))?;
    raw.sorted_by(PERSON_ID)
}

/// Convert a UKMOD file into a person-level variable set
///
/// Identifiers follow the FRS arithmetic: `person_id = idorighh * 100 +
/// idorigbenunit * 10 + idorigperson`. Variable names are lower case and
/// monthly amounts are multiplied by 12.
///
/// # Arguments
/// * `path` - Tab-delimited UKMOD file
/// * `year` - Year the file describes
/// * `monthly` - Which columns hold monthly amounts
pub fn ukmod_variables(path: &Path, year: i32, monthly: MonthlyColumns) -> Result<VariableSet> {
    let timer = StepTimer::start("converting UKMOD file", path);

    let raw = read_ukmod(path)?;
    let persons = raw.ids(PERSON_ID)?;
    EntityIndex::new(persons.clone())?;

    let mut set = VariableSet::new(year);
    set.insert(
        "person_benunit_id",
        Entity::Person,
        VariableValues::Int(persons.iter().map(|id| id / ID_RADIX).collect()),
    )?;
    set.insert(
        "person_household_id",
        Entity::Person,
        VariableValues::Int(persons.iter().map(|id| id / (ID_RADIX * ID_RADIX)).collect()),
    )?;
    set.insert("person_id", Entity::Person, VariableValues::Int(persons))?;
    set.insert_float(
        "person_weight",
        Entity::Person,
        raw.numeric(&WEIGHT_COLUMN.to_uppercase())?.to_vec(),
    )?;

    for (column, values) in raw.iter() {
        if column == PERSON_ID {
            continue;
        }
        let name = column.to_lowercase();
        let values = match values {
            RawColumn::Numeric(v) if monthly.is_monthly(&name) => {
                VariableValues::Float(v.iter().map(|x| x * MONTHS_IN_YEAR).collect())
            }
            RawColumn::Numeric(v) => VariableValues::Float(v.clone()),
            RawColumn::Text(v) => VariableValues::Category(v.clone()),
        };
        set.insert(name, Entity::Person, values)?;
    }

    timer.finish(set.len(), "variables");
    Ok(set)
}

/// Convert the UKMOD input file
pub fn ukmod_input(path: &Path, year: i32) -> Result<VariableSet> {
    ukmod_variables(path, year, MonthlyColumns::InputVariables)
}

/// Convert the UKMOD output file
pub fn ukmod_output(path: &Path, year: i32) -> Result<VariableSet> {
    ukmod_variables(path, year, MonthlyColumns::AllAmounts)
}

/// Annual deciles, totals and nonzero counts of every UKMOD amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    /// Year the table describes
    pub year: i32,
    /// Summary per variable, by lower-case UKMOD name
    pub variables: BTreeMap<String, Aggregates>,
}

impl AggregateTable {
    /// Summarise a UKMOD file, weighting by `dwt`
    ///
    /// Identifier and text columns are skipped.
    pub fn from_ukmod_file(path: &Path, year: i32) -> Result<Self> {
        let batch = read_table_file(path)?;
        let raw = RawTable::from_record_batch("ukmod", &batch)?;
        let weights = raw.numeric(&WEIGHT_COLUMN.to_uppercase())?;

        let mut variables = BTreeMap::new();
        for (column, values) in raw.iter() {
            let name = column.to_lowercase();
            if is_identifier_column(&name) || name == WEIGHT_COLUMN {
                continue;
            }
            if let RawColumn::Numeric(values) = values {
                variables.insert(name, Aggregates::compute(values, weights, MONTHS_IN_YEAR));
            }
        }
        info!("Summarised {} UKMOD variables for {year}", variables.len());
        Ok(Self { year, variables })
    }

    /// Summary of one variable
    pub fn get(&self, name: &str) -> Result<&Aggregates> {
        self.variables.get(name).ok_or_else(|| {
            FrsError::Store(format!("No aggregates for {name} in {}", self.year))
        })
    }

    /// Write the table as JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = safe_create_file(path, "writing UKMOD aggregates")?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Read a table written by [`AggregateTable::write`]
    pub fn read(path: &Path) -> Result<Self> {
        let contents = safe_read_to_string(path, "reading UKMOD aggregates")?;
        Ok(serde_json::from_str(&contents)?)
    }
}
