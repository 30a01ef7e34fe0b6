//! The `base_frs` dataset
//!
//! Raw survey columns joined onto one row per person, benefit unit and
//! household. Person columns are prefixed `P_`, benefit unit columns `B_`
//! and household columns `H_`. Multi-row person tables are summed, and
//! accounts and benefits are pivoted into one column per code.

use rand::prelude::*;
use rand_distr::StandardNormal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::GenerationOptions;
use crate::error::{FrsError, Result};
use crate::models::types::code_from_f64;
use crate::models::{Entity, VariableSet, VariableValues};
use crate::raw::{BENUNIT_ID, HOUSEHOLD_ID, PERSON_ID, RawColumn, RawTable, RawTables};
use crate::schema::{BENUNIT, FrsTable, PERSON, SERNUM};
use crate::transform::frame::{
    EntityIndex, ensure_contained, group_sum, log_orphans, pivot_sum, scale,
};
use crate::transform::person::{
    benefit_keys, person_frame, weekly_pension_income, weekly_registered_childcare,
};
use crate::transform::WEEKS_IN_YEAR;

/// Dataset name of the base transform
pub const BASE_FRS: &str = "base_frs";

const IDENTIFIER_COLUMNS: [&str; 6] =
    [SERNUM, BENUNIT, PERSON, PERSON_ID, BENUNIT_ID, HOUSEHOLD_ID];

/// Build the `base_frs` variables for one year
///
/// # Arguments
/// * `tables` - Raw tables, at least those in [`FrsTable::BASE`]
/// * `options` - Seed for council tax sampling
pub fn transform(tables: &RawTables, options: &GenerationOptions) -> Result<VariableSet> {
    let mut set = VariableSet::new(tables.year());

    let person = person_frame(tables)?;
    let persons = EntityIndex::new(person.ids(PERSON_ID)?)?;
    let mut person_columns = PersonColumns::new(&person);

    add_account_interest(tables.require(FrsTable::Accounts)?, &persons, &mut person_columns)?;
    add_benefit_amounts(tables.require(FrsTable::Benefits)?, &persons, &mut person_columns)?;
    for table in [FrsTable::Job, FrsTable::Childcare] {
        add_summed_columns(tables.require(table)?, &persons, &mut person_columns)?;
    }

    person_columns.write(&mut set)?;

    let childcare = weekly_registered_childcare(tables.require(FrsTable::Childcare)?, &persons)?;
    set.insert_float("childcare_cost", Entity::Person, scale(&childcare, WEEKS_IN_YEAR))?;
    let pension = weekly_pension_income(tables.require(FrsTable::Pension)?, &persons)?;
    set.insert_float("pension_income", Entity::Person, scale(&pension, WEEKS_IN_YEAR))?;

    let benunit = tables.require(FrsTable::Benunit)?.sorted_by(BENUNIT_ID)?;
    let benunits = EntityIndex::new(benunit.ids(BENUNIT_ID)?)?;
    ensure_contained(&benunits, &person.ids(BENUNIT_ID)?, "Benefit unit")?;
    write_prefixed(&benunit, "B_", Entity::Benunit, &mut set)?;

    let household = tables.require(FrsTable::Household)?.sorted_by(HOUSEHOLD_ID)?;
    let households = EntityIndex::new(household.ids(HOUSEHOLD_ID)?)?;
    ensure_contained(&households, &person.ids(HOUSEHOLD_ID)?, "Household")?;
    let council_tax = sample_council_tax(&household, options.seed)?;
    write_prefixed(&household, "H_", Entity::Household, &mut set)?;
    set.replace("H_CTANNUAL", VariableValues::Float(council_tax))?;

    log::info!(
        "Built {BASE_FRS} {} with {} persons, {} benefit units, {} households",
        tables.year(),
        persons.len(),
        benunits.len(),
        households.len()
    );
    Ok(set)
}

/// Person columns collected before writing, so later tables can see which
/// names earlier ones already took
struct PersonColumns {
    columns: Vec<(String, VariableValues)>,
    taken: FxHashSet<String>,
}

impl PersonColumns {
    fn new(person: &RawTable) -> Self {
        let mut this = Self {
            columns: Vec::new(),
            taken: FxHashSet::default(),
        };
        for (name, column) in person.iter() {
            this.push(name, raw_values(name, column));
        }
        this
    }

    fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    fn push(&mut self, name: &str, values: VariableValues) {
        self.taken.insert(name.to_string());
        self.columns.push((name.to_string(), values));
    }

    fn write(self, set: &mut VariableSet) -> Result<()> {
        for (name, values) in self.columns {
            set.insert(format!("P_{name}"), Entity::Person, values)?;
        }
        Ok(())
    }
}

fn raw_values(name: &str, column: &RawColumn) -> VariableValues {
    match column {
        RawColumn::Numeric(values) if matches!(name, PERSON_ID | BENUNIT_ID | HOUSEHOLD_ID) => {
            VariableValues::Int(values.iter().map(|&v| v as i64).collect())
        }
        RawColumn::Numeric(values) => VariableValues::Float(
            values
                .iter()
                .map(|&v| if v.is_nan() { 0.0 } else { v })
                .collect(),
        ),
        RawColumn::Text(values) => VariableValues::Category(values.clone()),
    }
}

fn add_account_interest(
    accounts: &RawTable,
    persons: &EntityIndex,
    columns: &mut PersonColumns,
) -> Result<()> {
    let keys = accounts.ids(PERSON_ID)?;
    let codes: Vec<i64> = accounts
        .numeric("ACCOUNT")?
        .iter()
        .map(|&c| code_from_f64(c))
        .collect();
    let (pivot, orphans) = pivot_sum(persons, &keys, &codes, accounts.numeric("ACCINT")?);
    log_orphans(accounts.name(), orphans);

    for (code, values) in pivot {
        columns.push(
            &format!("ACCINT_ACCOUNT_CODE_{code}"),
            VariableValues::Float(values),
        );
    }
    Ok(())
}

fn add_benefit_amounts(
    benefits: &RawTable,
    persons: &EntityIndex,
    columns: &mut PersonColumns,
) -> Result<()> {
    let keys = benefits.ids(PERSON_ID)?;
    let benefit_keys = benefit_keys(benefits)?;
    let (pivot, orphans) = pivot_sum(persons, &keys, &benefit_keys, benefits.numeric("BENAMT")?);
    log_orphans(benefits.name(), orphans);

    for (key, values) in pivot {
        columns.push(
            &format!("BENAMT_BENEFIT_CODE_{}", key.column_code()),
            VariableValues::Float(values),
        );
    }
    Ok(())
}

/// Sum every numeric column not already present in the person frame
///
/// Returns the number of rows whose person is not in the frame.
fn add_summed_columns(
    table: &RawTable,
    persons: &EntityIndex,
    columns: &mut PersonColumns,
) -> Result<usize> {
    let keys = table.ids(PERSON_ID)?;
    let orphans = keys.iter().filter(|&&key| persons.position(key).is_none()).count();
    for (name, column) in table.iter() {
        if columns.contains(name) || IDENTIFIER_COLUMNS.contains(&name) {
            continue;
        }
        match column {
            RawColumn::Numeric(values) => {
                let (sums, _) = group_sum(persons, &keys, values, |_| true);
                columns.push(name, VariableValues::Float(sums));
            }
            RawColumn::Text(_) => {
                log::debug!("Skipping text column {name} of {}", table.name());
            }
        }
    }
    log_orphans(table.name(), orphans);
    Ok(orphans)
}

fn write_prefixed(
    table: &RawTable,
    prefix: &str,
    entity: Entity,
    set: &mut VariableSet,
) -> Result<()> {
    for (name, column) in table.iter() {
        set.insert(format!("{prefix}{name}"), entity, raw_values(name, column))?;
    }
    Ok(())
}

/// Grouping key of the council tax distribution; missing codes form groups
type CouncilTaxGroup = (Option<i64>, Option<i64>);

fn group_key(region: f64, band: f64) -> CouncilTaxGroup {
    let code = |v: f64| (!v.is_nan()).then(|| v.round() as i64);
    (code(region), code(band))
}

/// Mean and sample standard deviation of reported council tax per group
///
/// Groups with fewer than two reports have NaN deviation.
fn council_tax_distribution(
    regions: &[f64],
    bands: &[f64],
    amounts: &[f64],
) -> FxHashMap<CouncilTaxGroup, (f64, f64)> {
    let mut groups: FxHashMap<CouncilTaxGroup, Vec<f64>> = FxHashMap::default();
    for ((&region, &band), &amount) in regions.iter().zip(bands).zip(amounts) {
        let values = groups.entry(group_key(region, band)).or_default();
        if !amount.is_nan() {
            values.push(amount);
        }
    }

    groups
        .into_iter()
        .map(|(key, values)| {
            let n = values.len() as f64;
            let mean = if values.is_empty() {
                f64::NAN
            } else {
                values.iter().sum::<f64>() / n
            };
            let std = if values.len() < 2 {
                f64::NAN
            } else {
                (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            };
            (key, (mean, std))
        })
        .collect()
}

/// Replace missing or zero council tax with draws from the household's
/// (region, band) distribution
///
/// One standard normal value is drawn for every household in order, so a
/// fixed seed reproduces the same draws. Draws that are still undefined
/// take the mean over all households.
fn sample_council_tax(household: &RawTable, seed: Option<u64>) -> Result<Vec<f64>> {
    let regions = household.numeric("GVTREGNO")?;
    let bands = household.numeric("CTBAND")?;
    let reported = household.numeric("CTANNUAL")?;
    let distribution = council_tax_distribution(regions, bands, reported);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut sampled = 0;
    let mut council_tax: Vec<f64> = (0..household.num_rows())
        .map(|i| {
            let z: f64 = rng.sample(StandardNormal);
            let amount = if reported[i].is_nan() { 0.0 } else { reported[i] };
            if amount == 0.0 {
                sampled += 1;
                let (mean, std) = distribution
                    .get(&group_key(regions[i], bands[i]))
                    .copied()
                    .unwrap_or((f64::NAN, f64::NAN));
                z * std + mean
            } else {
                amount
            }
        })
        .collect();

    let defined: Vec<f64> = council_tax.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() && !council_tax.is_empty() {
        return Err(FrsError::Imputation(
            "No household has a usable council tax amount".to_string(),
        ));
    }
    let average = defined.iter().sum::<f64>() / defined.len().max(1) as f64;
    let mut fallback = 0;
    for value in &mut council_tax {
        if value.is_nan() {
            *value = average;
            fallback += 1;
        }
    }

    log::info!(
        "Sampled council tax for {sampled} of {} households ({fallback} from the overall mean)",
        council_tax.len()
    );
    Ok(council_tax)
}
