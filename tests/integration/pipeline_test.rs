use frs_data::config::{GenerationOptions, StorageConfig};
use frs_data::dataset::{BaseFrs, Dataset, Frs};
use frs_data::models::entity::{benunit_of_person, household_of_person};
use frs_data::models::{Entity, VariableSet, VariableValues};
use frs_data::raw::{MemorySource, RawSurveySource};
use frs_data::schema::FrsTable;
use frs_data::transform::{base, frs};
use frs_data::FrsError;

use crate::utils::{SELF_EMPLOYED_SERIAL, YEAR, fixture_source, survey_source};

fn mapped(mut source: MemorySource, year: i32) -> VariableSet {
    let tables = source.load(year, &FrsTable::ALL).unwrap();
    frs::transform(&tables).unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
    }
}

#[test]
fn test_frs_identifiers_follow_the_survey_keys() {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::ALL).unwrap();
    let set = frs::transform(&tables).unwrap();

    let persons = set.ids("person_id").unwrap();
    assert_eq!(persons, vec![111, 112, 113, 211, 311]);
    assert_eq!(set.ids("benunit_id").unwrap(), vec![11, 21, 31]);
    assert_eq!(set.ids("household_id").unwrap(), vec![1, 2, 3]);

    let benunits = set.ids("person_benunit_id").unwrap();
    let households = set.ids("person_household_id").unwrap();
    for ((person, benunit), household) in persons.iter().zip(&benunits).zip(&households) {
        assert_eq!(benunit_of_person(*person), *benunit);
        assert_eq!(household_of_person(*person), *household);
    }
}

#[test]
fn test_frs_person_values() {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::ALL).unwrap();
    let set = frs::transform(&tables).unwrap();

    assert_eq!(
        set.f64_values("person_weight").unwrap(),
        vec![1000.0, 1000.0, 1000.0, 2000.0, 3000.0]
    );
    assert_eq!(set.f64_values("age").unwrap(), vec![40.0, 38.0, 8.0, 70.0, 25.0]);
    assert_eq!(
        set.f64_values("employment_income").unwrap(),
        vec![26_000.0, 15_600.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(set.f64_values("pension_income").unwrap()[3], 5200.0);
    assert_eq!(set.entity_len(Entity::Person), Some(5));
    assert_eq!(set.entity_len(Entity::Benunit), Some(3));
    assert_eq!(set.entity_len(Entity::Household), Some(3));
    assert!(set.variables_with_missing_values().is_empty());
}

#[test]
fn test_frs_council_tax_is_filled_from_the_group_mean() {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::ALL).unwrap();
    let set = frs::transform(&tables).unwrap();

    assert_eq!(
        set.f64_values("council_tax").unwrap(),
        vec![1500.0, 900.0, 900.0]
    );
}

#[test]
fn test_base_frs_prefixes_columns_by_entity() {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::BASE).unwrap();
    let set = base::transform(&tables, &GenerationOptions::seeded(7)).unwrap();

    assert_eq!(set.require("P_INEARNS").unwrap().entity, Entity::Person);
    assert_eq!(set.require("B_GROSS4").unwrap().entity, Entity::Benunit);
    assert_eq!(set.require("H_GVTREGNO").unwrap().entity, Entity::Household);
    assert!(
        set.f64_values("H_CTANNUAL")
            .unwrap()
            .iter()
            .all(|v| v.is_finite())
    );
    assert!(matches!(
        set.require("P_person_id").unwrap().values,
        VariableValues::Int(_)
    ));
}

#[test]
fn test_missing_table_is_reported() {
    let mut source = frs_data::raw::MemorySource::new();
    let result = source.load(YEAR, &FrsTable::ALL);
    assert!(matches!(result, Err(FrsError::MissingTable { year, .. }) if year == YEAR));
}

#[test]
fn test_frs_dataset_round_trips_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path());
    let dataset = Frs::new(&storage);

    let mut source = fixture_source();
    let path = dataset.generate(&mut source, YEAR).unwrap();
    assert!(path.exists());
    assert_eq!(dataset.years().unwrap(), vec![YEAR]);

    let tables = source.load(YEAR, &FrsTable::ALL).unwrap();
    let expected = frs::transform(&tables).unwrap();
    let loaded = dataset.load(YEAR).unwrap();

    assert_eq!(loaded.len(), expected.len());
    for variable in expected.iter() {
        let stored = loaded.require(&variable.name).unwrap();
        assert_eq!(stored, variable, "{} changed in the store", variable.name);
    }
}

#[test]
fn test_seeded_base_frs_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = BaseFrs::new(&StorageConfig::new(dir.path().join("a")));
    let second = BaseFrs::new(&StorageConfig::new(dir.path().join("b")));
    let options = GenerationOptions::seeded(42);

    let a = first.generate(&mut fixture_source(), YEAR, &options).unwrap();
    let b = second.generate(&mut fixture_source(), YEAR, &options).unwrap();
    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn test_reported_jsa_and_esa_are_split_by_income_flag() {
    let set = mapped(fixture_source(), YEAR);

    assert_eq!(
        set.f64_values("JSA_contrib_reported").unwrap(),
        vec![2080.0, 0.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(
        set.f64_values("JSA_income_reported").unwrap(),
        vec![0.0, 0.0, 0.0, 0.0, 3640.0]
    );
    assert_eq!(
        set.f64_values("ESA_income_reported").unwrap(),
        vec![0.0, 1560.0, 0.0, 0.0, 0.0]
    );
    assert!(
        set.f64_values("ESA_contrib_reported")
            .unwrap()
            .iter()
            .all(|&v| v == 0.0)
    );
}

#[test]
fn test_winter_fuel_allowance_is_not_annualised() {
    let set = mapped(fixture_source(), YEAR);

    assert_eq!(
        set.f64_values("winter_fuel_allowance_reported").unwrap(),
        vec![0.0, 0.0, 0.0, 200.0, 0.0]
    );
    assert_eq!(set.f64_values("state_pension_reported").unwrap()[3], 7800.0);
}

#[test]
fn test_base_frs_pivots_income_related_benefits_apart() {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::BASE).unwrap();
    let set = base::transform(&tables, &GenerationOptions::seeded(7)).unwrap();

    assert_eq!(
        set.f64_values("P_BENAMT_BENEFIT_CODE_1014").unwrap(),
        vec![0.0, 0.0, 0.0, 0.0, 70.0]
    );
    assert_eq!(
        set.f64_values("P_BENAMT_BENEFIT_CODE_14").unwrap(),
        vec![40.0, 0.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(
        set.f64_values("P_BENAMT_BENEFIT_CODE_1016").unwrap(),
        vec![0.0, 30.0, 0.0, 0.0, 0.0]
    );
    assert!(!set.contains("P_BENAMT_BENEFIT_CODE_16"));
}

#[test]
fn test_mortgage_capital_skips_terms_without_years_left() {
    let set = mapped(fixture_source(), YEAR);

    assert_eq!(
        set.f64_values("mortgage_capital_repayment").unwrap(),
        vec![5000.0, 0.0, 0.0]
    );
}

#[test]
fn test_pension_contributions_by_scheme() {
    let set = mapped(fixture_source(), YEAR);

    // Provision amounts have p95 685, which caps person 112; negatives floor at 0
    assert_close(
        &set.f64_values("private_pension_contributions").unwrap(),
        &[1560.0, 35_620.0, 0.0, 0.0, 0.0],
    );
    assert_close(
        &set.f64_values("employer_pension_contributions").unwrap(),
        &[0.0, 2080.0, 0.0, 1300.0, 0.0],
    );
}

#[test]
fn test_regional_housing_and_water_costs() {
    let set = mapped(fixture_source(), YEAR);

    // Scotland sums sewerage and water, elsewhere the combined charge is used
    assert_eq!(
        set.f64_values("water_and_sewerage_charges").unwrap(),
        vec![364.0, 0.0, 260.0]
    );
    // Northern Ireland reports housing costs in NIHSCOST
    assert_eq!(
        set.f64_values("housing_costs").unwrap(),
        vec![9360.0, 2080.0, 5720.0]
    );
}

#[test]
fn test_self_employment_correction_uses_job_records() {
    let corrected = mapped(survey_source(2018, 8069.0), 2018);
    assert_eq!(corrected.ids("person_id").unwrap()[4], 806_911);
    assert_eq!(
        corrected.f64_values("self_employment_income").unwrap(),
        vec![0.0, 0.0, 0.0, 0.0, 13_000.0]
    );

    for (year, serial) in [(2018, SELF_EMPLOYED_SERIAL), (2019, 8069.0)] {
        let set = mapped(survey_source(year, serial), year);
        assert_eq!(
            set.f64_values("self_employment_income").unwrap()[4],
            10_400.0,
            "{year} {serial}"
        );
    }
}
