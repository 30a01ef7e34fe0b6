//! Enhancement of the FRS with imputations from auxiliary surveys
//!
//! High incomes are matched from the SPI at person level and blended in as
//! a second, reweighted copy of the population. Wealth (WAS) and consumption
//! (LCFS) are then matched at household level onto the blended population
//! and appended as new variables. Rows are never reordered or dropped.

pub mod clone_blend;
pub mod donor;
pub mod hot_deck;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use crate::config::ImputationConfig;
use crate::error::util::require_file;
use crate::error::{FrsError, Result};
use crate::models::{Entity, VariableSet, VariableValues};
use crate::transform::frame::{EntityIndex, group_sum, log_orphans};

pub use clone_blend::clone_and_blend;
pub use donor::{DonorSurvey, DonorTable, LCFS, Predictor, SPI, WAS};
pub use hot_deck::HotDeck;

/// Dataset name of the enhanced FRS
pub const FRS_ENHANCED: &str = "frs_enhanced";

/// Youngest age matched against high-income donors
pub const ADULT_AGE: f64 = 16.0;

/// Add the imputed variables to an FRS dataset
///
/// Every donor file is checked before any matching starts.
///
/// # Arguments
/// * `frs` - The mapped FRS dataset
/// * `config` - Donor files and matching parameters
pub fn enhance(frs: &VariableSet, config: &ImputationConfig) -> Result<VariableSet> {
    config.validate()?;
    for (survey, path) in [
        (&SPI, &config.spi_path),
        (&WAS, &config.was_path),
        (&LCFS, &config.lcfs_path),
    ] {
        require_file(path, &format!("{} donor table", survey.name))?;
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!("Imputing high incomes from the SPI");
    let spi = SPI.load(&config.spi_path)?;
    let high_incomes = impute_person_targets(frs, &SPI, &spi, config.neighbours, &mut rng)?;
    let mut enhanced = clone_and_blend(frs, &high_incomes, config.high_income_weight)?;

    info!("Imputing wealth from the WAS");
    let was = WAS.load(&config.was_path)?;
    impute_household_targets(&mut enhanced, &WAS, &was, config.neighbours, &mut rng)?;

    info!("Imputing consumption from the LCFS");
    let lcfs = LCFS.load(&config.lcfs_path)?;
    impute_household_targets(&mut enhanced, &LCFS, &lcfs, config.neighbours, &mut rng)?;

    enhanced.ensure_complete()?;
    Ok(enhanced)
}

/// Fail unless the survey is matched at the given entity level
fn ensure_entity(survey: &DonorSurvey, entity: Entity) -> Result<()> {
    if survey.entity == entity {
        Ok(())
    } else {
        Err(FrsError::Imputation(format!(
            "The {} survey matches {} records, not {entity} records",
            survey.name, survey.entity
        )))
    }
}

/// Matched donor values for adults, original values for everyone else
///
/// Returns alternative arrays keyed by target name, ready to be blended.
fn impute_person_targets(
    frs: &VariableSet,
    survey: &DonorSurvey,
    donors: &DonorTable,
    neighbours: usize,
    rng: &mut StdRng,
) -> Result<FxHashMap<String, VariableValues>> {
    ensure_entity(survey, Entity::Person)?;
    let age = frs.f64_values("age")?;
    let adults: Vec<usize> = (0..age.len()).filter(|&i| age[i] >= ADULT_AGE).collect();

    let mut alternatives = FxHashMap::default();
    if adults.is_empty() {
        warn!("No adults to match against {} donors", survey.name);
        return Ok(alternatives);
    }

    let recipients = survey
        .predictors
        .iter()
        .map(|p| {
            let values = frs.f64_values(p.name())?;
            Ok(adults.iter().map(|&i| values[i]).collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let deck = HotDeck::fit(&donors.predictors, &donors.weights, neighbours)?;
    let matched = deck.match_donors(&recipients, rng)?;

    for (target, donor_values) in survey.targets.iter().zip(&donors.targets) {
        let mut values = frs.f64_values(target)?;
        for (&person, &donor) in adults.iter().zip(&matched) {
            values[person] = donor_values[donor];
        }
        alternatives.insert((*target).to_string(), VariableValues::Float(values));
    }
    Ok(alternatives)
}

/// Household predictors, summing person variables within each household
fn household_predictors(set: &VariableSet, survey: &DonorSurvey) -> Result<Vec<Vec<f64>>> {
    let households = EntityIndex::new(set.ids(Entity::Household.id_variable())?)?;
    let person_households = set.ids("person_household_id")?;

    survey
        .predictors
        .iter()
        .map(|predictor| {
            let variable = set.require(predictor.name())?;
            let values = set.f64_values(predictor.name())?;
            match (predictor, variable.entity) {
                (Predictor::Own(_), Entity::Household) => Ok(values),
                (Predictor::PersonSum(_), Entity::Person) => {
                    let (sums, orphans) =
                        group_sum(&households, &person_households, &values, |_| true);
                    log_orphans("person", orphans);
                    Ok(sums)
                }
                (_, entity) => Err(FrsError::Imputation(format!(
                    "Predictor {} of the {} survey is a {entity} variable",
                    predictor.name(),
                    survey.name
                ))),
            }
        })
        .collect()
}

/// Append matched donor targets as household variables
fn impute_household_targets(
    set: &mut VariableSet,
    survey: &DonorSurvey,
    donors: &DonorTable,
    neighbours: usize,
    rng: &mut StdRng,
) -> Result<()> {
    ensure_entity(survey, Entity::Household)?;
    let recipients = household_predictors(set, survey)?;
    let deck = HotDeck::fit(&donors.predictors, &donors.weights, neighbours)?;
    let matched = deck.match_donors(&recipients, rng)?;

    for (target, donor_values) in survey.targets.iter().zip(&donors.targets) {
        let values = matched.iter().map(|&donor| donor_values[donor]).collect();
        set.insert_float(target, Entity::Household, values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn households() -> VariableSet {
        let mut set = VariableSet::new(2019);
        set.insert("person_id", Entity::Person, VariableValues::Int(vec![111, 112, 211]))
            .unwrap();
        set.insert(
            "person_household_id",
            Entity::Person,
            VariableValues::Int(vec![1, 1, 2]),
        )
        .unwrap();
        set.insert("household_id", Entity::Household, VariableValues::Int(vec![1, 2]))
            .unwrap();
        set.insert_float("employment_income", Entity::Person, vec![10.0, 5.0, 100.0])
            .unwrap();
        set.insert_float("num_bedrooms", Entity::Household, vec![2.0, 4.0])
            .unwrap();
        set
    }

    const TEST_SURVEY: DonorSurvey = DonorSurvey {
        name: "test",
        entity: Entity::Household,
        predictors: &[
            Predictor::PersonSum("employment_income"),
            Predictor::Own("num_bedrooms"),
        ],
        targets: &["savings"],
        weight: "weight",
    };

    #[test]
    fn test_household_predictors_sum_persons() {
        let predictors = household_predictors(&households(), &TEST_SURVEY).unwrap();
        assert_eq!(predictors, vec![vec![15.0, 100.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_household_targets_are_appended() {
        let mut set = households();
        let donors = DonorTable {
            predictors: vec![vec![15.0, 100.0], vec![2.0, 4.0]],
            targets: vec![vec![1_000.0, 50_000.0]],
            weights: vec![1.0, 1.0],
        };
        let mut rng = StdRng::seed_from_u64(3);
        impute_household_targets(&mut set, &TEST_SURVEY, &donors, 1, &mut rng).unwrap();
        assert_eq!(
            set.require("savings").unwrap().values,
            VariableValues::Float(vec![1_000.0, 50_000.0])
        );
    }

    #[test]
    fn test_person_predictor_must_have_the_right_entity() {
        const WRONG: DonorSurvey = DonorSurvey {
            predictors: &[Predictor::Own("employment_income")],
            ..TEST_SURVEY
        };
        assert!(household_predictors(&households(), &WRONG).is_err());
    }

    #[test]
    fn test_surveys_are_matched_at_their_own_entity() {
        let donors = DonorTable {
            predictors: vec![vec![15.0], vec![2.0]],
            targets: vec![vec![1_000.0]],
            weights: vec![1.0],
        };
        let mut rng = StdRng::seed_from_u64(3);

        let mut set = households();
        let err = impute_household_targets(&mut set, &SPI, &donors, 1, &mut rng).unwrap_err();
        assert!(matches!(err, FrsError::Imputation(_)));
        assert!(!set.contains("gross_income"));

        let err = impute_person_targets(&households(), &TEST_SURVEY, &donors, 1, &mut rng)
            .unwrap_err();
        assert!(matches!(err, FrsError::Imputation(_)));
    }

    #[test]
    fn test_missing_donor_files_fail_before_matching() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImputationConfig::from_directory(dir.path(), "tab");
        let err = enhance(&households(), &config).unwrap_err();
        assert!(matches!(err, FrsError::MissingInput { .. }));
    }
}
