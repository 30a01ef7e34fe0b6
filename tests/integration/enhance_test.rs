use std::path::Path;

use rustc_hash::FxHashSet;

use frs_data::config::{ImputationConfig, StorageConfig};
use frs_data::dataset::{Dataset, Frs, FrsEnhanced};
use frs_data::enhance::{LCFS, WAS, enhance};
use frs_data::models::{Entity, VariableSet};
use frs_data::raw::RawSurveySource;
use frs_data::schema::FrsTable;
use frs_data::transform::frs;
use frs_data::FrsError;

use crate::utils::{YEAR, fixture_source, write_donor_table};

const SPI_DONORS: [[f64; 8]; 3] = [
    [45.0, 120_000.0, 0.0, 0.0, 500.0, 2000.0, 0.0, 10.0],
    [60.0, 0.0, 80_000.0, 10_000.0, 100.0, 5000.0, 1000.0, 10.0],
    [30.0, 90_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0],
];

/// Write spi, was and lcfs donor tables into a directory
fn write_donors(dir: &Path) -> ImputationConfig {
    write_donor_table(
        &dir.join("spi.tab"),
        &[
            "age",
            "employment_income",
            "self_employment_income",
            "pension_income",
            "savings_interest_income",
            "dividend_income",
            "property_income",
            "weight",
        ],
        &SPI_DONORS.iter().map(|row| row.to_vec()).collect::<Vec<_>>(),
    );

    let mut was_header = vec![
        "employment_income",
        "self_employment_income",
        "pension_income",
        "savings_interest_income",
        "dividend_income",
        "num_bedrooms",
    ];
    was_header.extend(WAS.targets);
    was_header.push("weight");
    let was_rows: Vec<Vec<f64>> = (1..=4)
        .map(|i| {
            let scale = f64::from(i);
            let mut row = vec![20_000.0 * scale, 0.0, 0.0, 100.0, 0.0, scale];
            row.extend((0..WAS.targets.len()).map(|t| 1000.0 * scale + t as f64));
            row.push(5.0);
            row
        })
        .collect();
    write_donor_table(&dir.join("was.tab"), &was_header, &was_rows);

    let mut lcfs_header = vec![
        "employment_income",
        "self_employment_income",
        "pension_income",
        "num_bedrooms",
    ];
    lcfs_header.extend(LCFS.targets);
    lcfs_header.push("weight");
    let lcfs_rows: Vec<Vec<f64>> = (1..=3)
        .map(|i| {
            let scale = f64::from(i);
            let mut row = vec![15_000.0 * scale, 0.0, 1000.0, scale];
            row.extend((0..LCFS.targets.len()).map(|t| 50.0 * scale + t as f64));
            row.push(2.0);
            row
        })
        .collect();
    write_donor_table(&dir.join("lcfs.tab"), &lcfs_header, &lcfs_rows);

    ImputationConfig {
        neighbours: 2,
        seed: Some(1),
        ..ImputationConfig::from_directory(dir, "tab")
    }
}

fn fixture_frs() -> VariableSet {
    let mut source = fixture_source();
    let tables = source.load(YEAR, &FrsTable::ALL).unwrap();
    frs::transform(&tables).unwrap()
}

#[test]
fn test_enhancement_doubles_the_population() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_donors(dir.path());
    let original = fixture_frs();
    let enhanced = enhance(&original, &config).unwrap();

    assert_eq!(enhanced.entity_len(Entity::Person), Some(10));
    assert_eq!(enhanced.entity_len(Entity::Benunit), Some(6));
    assert_eq!(enhanced.entity_len(Entity::Household), Some(6));

    let ids = enhanced.ids("person_id").unwrap();
    let unique: FxHashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());

    for name in ["person_weight", "benunit_weight", "household_weight"] {
        let before: f64 = original.f64_values(name).unwrap().iter().sum();
        let after: f64 = enhanced.f64_values(name).unwrap().iter().sum();
        assert!((before - after).abs() < 1e-9, "{name} total changed");
    }
    assert!(enhanced.variables_with_missing_values().is_empty());
}

#[test]
fn test_only_adults_receive_high_incomes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_donors(dir.path());
    let original = fixture_frs();
    let enhanced = enhance(&original, &config).unwrap();

    let before = original.f64_values("employment_income").unwrap();
    let after = enhanced.f64_values("employment_income").unwrap();
    assert_eq!(&after[..5], before.as_slice());

    let ages = original.f64_values("age").unwrap();
    let donor_values: Vec<f64> = SPI_DONORS.iter().map(|row| row[1]).collect();
    for (i, age) in ages.iter().enumerate() {
        if *age < 16.0 {
            assert_eq!(after[5 + i], before[i]);
        } else {
            assert!(donor_values.contains(&after[5 + i]));
        }
    }
}

#[test]
fn test_wealth_and_consumption_are_appended_per_household() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_donors(dir.path());
    let enhanced = enhance(&fixture_frs(), &config).unwrap();

    for name in WAS.targets.iter().chain(LCFS.targets) {
        let variable = enhanced.require(name).unwrap();
        assert_eq!(variable.entity, Entity::Household);
        assert_eq!(variable.values.len(), 6);
    }
    let savings = enhanced.f64_values("savings").unwrap();
    assert!(savings.iter().all(|v| [1006.0, 2006.0, 3006.0, 4006.0].contains(v)));
}

#[test]
fn test_seeded_enhancement_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_donors(dir.path());
    let frs = fixture_frs();

    let first = enhance(&frs, &config).unwrap();
    let second = enhance(&frs, &config).unwrap();
    for variable in first.iter() {
        assert_eq!(second.require(&variable.name).unwrap(), variable);
    }
}

#[test]
fn test_missing_donors_fail_before_the_frs_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path().join("store"));
    let config = ImputationConfig::from_directory(dir.path().join("donors"), "tab");

    let frs = Frs::new(&storage);
    let result = FrsEnhanced::new(&storage).generate(&frs, &mut fixture_source(), YEAR, &config);
    assert!(matches!(result, Err(FrsError::MissingInput { .. })));
    assert!(frs.years().unwrap().is_empty());
}

#[test]
fn test_enhanced_dataset_is_stored_with_its_base() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_donors(dir.path());
    let storage = StorageConfig::new(dir.path().join("store"));

    let frs = Frs::new(&storage);
    let enhanced = FrsEnhanced::new(&storage);
    enhanced
        .generate(&frs, &mut fixture_source(), YEAR, &config)
        .unwrap();

    assert_eq!(frs.years().unwrap(), vec![YEAR]);
    assert_eq!(enhanced.years().unwrap(), vec![YEAR]);
    let loaded = enhanced.load(YEAR).unwrap();
    assert_eq!(loaded.entity_len(Entity::Person), Some(10));
    assert!(loaded.contains("gross_financial_wealth"));
}
