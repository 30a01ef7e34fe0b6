use std::path::{Path, PathBuf};

use frs_data::config::{StorageConfig, ValidationConfig};
use frs_data::dataset::{Dataset, Frs, UkmodAggregates, UkmodInput};
use frs_data::models::VariableSet;
use frs_data::validation::{ValidationReport, parse_variable_map, validate};

use crate::utils::{YEAR, fixture_source};

const VARIABLE_MAP: &str = "
employment_income: yem
pension_income:
  ukmod: ypp
  max_rel_error: 0.1
";

/// Write a UKMOD input file describing the generated persons, with monthly
/// amounts scaled by `factor`
fn write_ukmod_file(frs: &VariableSet, path: &Path, factor: f64) {
    let persons = frs.ids("person_id").unwrap();
    let weights = frs.f64_values("person_weight").unwrap();
    let employment = frs.f64_values("employment_income").unwrap();
    let pension = frs.f64_values("pension_income").unwrap();

    let mut contents = String::from("idorighh\tidorigbenunit\tidorigperson\tdwt\tyem\typp\n");
    for i in 0..persons.len() {
        let id = persons[i];
        contents.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            id / 100,
            id / 10 % 10,
            id % 10,
            weights[i],
            employment[i] * factor / 12.0,
            pension[i] * factor / 12.0,
        ));
    }
    std::fs::write(path, contents).unwrap();
}

/// Generate the FRS and a UKMOD input for it, returning both
fn generate(
    storage: &StorageConfig,
    dir: &Path,
    factor: f64,
) -> (VariableSet, VariableSet, PathBuf) {
    let frs = Frs::new(storage);
    frs.generate(&mut fixture_source(), YEAR).unwrap();
    let generated = frs.load(YEAR).unwrap();

    let tabfile = dir.join(format!("uk_{YEAR}.txt"));
    write_ukmod_file(&generated, &tabfile, factor);
    let input = UkmodInput::new(storage);
    input.generate(&tabfile, YEAR).unwrap();
    (generated, input.load(YEAR).unwrap(), tabfile)
}

fn run(generated: &VariableSet, reference: &VariableSet) -> ValidationReport {
    let config = ValidationConfig::default();
    let pairs = parse_variable_map(VARIABLE_MAP, &config).unwrap();
    validate(generated, reference, &pairs, None, &config).unwrap()
}

#[test]
fn test_matching_reference_passes() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path().join("store"));
    let (generated, reference, _) = generate(&storage, dir.path(), 1.0);

    let report = run(&generated, &reference);
    assert_eq!(report.year, YEAR);
    assert_eq!(report.checks.len(), 26);
    assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
}

#[test]
fn test_inflated_reference_fails_the_totals() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path().join("store"));
    let (generated, reference, _) = generate(&storage, dir.path(), 1.5);

    let report = run(&generated, &reference);
    assert!(!report.passed());
    let failed: Vec<(&str, &str)> = report
        .failures()
        .map(|c| (c.variable.as_str(), c.metric.as_str()))
        .collect();
    assert!(failed.contains(&("employment_income", "aggregate")));
    assert!(failed.contains(&("pension_income", "aggregate")));
    assert!(failed.contains(&("employment_income", "household_mean_relative_error")));
    assert!(!failed.contains(&("employment_income", "positive_count")));
    assert!(!failed.contains(&("employment_income", "household_positive_agreement")));
}

#[test]
fn test_aggregate_table_checks_are_added() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path().join("store"));
    let (generated, reference, tabfile) = generate(&storage, dir.path(), 1.0);

    let aggregates = UkmodAggregates::new(&storage);
    aggregates.generate(&tabfile, YEAR).unwrap();
    let table = aggregates.load(YEAR).unwrap();

    let config = ValidationConfig::default();
    let pairs = parse_variable_map(VARIABLE_MAP, &config).unwrap();
    let report = validate(&generated, &reference, &pairs, Some(&table), &config).unwrap();

    assert_eq!(report.checks.len(), 26 + 2 * 13);
    assert!(
        report
            .checks
            .iter()
            .any(|c| c.metric == "table_sum" && c.variable == "employment_income")
    );
    assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
}

#[test]
fn test_report_is_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::new(dir.path().join("store"));
    let (generated, reference, _) = generate(&storage, dir.path(), 1.0);
    let report = run(&generated, &reference);

    let path = dir.path().join("report.json");
    report.write(&path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["year"], YEAR);
    assert_eq!(json["checks"].as_array().unwrap().len(), report.checks.len());
    assert_eq!(json["checks"][0]["reference"], "yem");
}
