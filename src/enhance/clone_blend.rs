//! Clone-and-blend of two weighted copies of a dataset
//!
//! The original records and an alternative copy are stacked into one
//! population. Identifiers are moved into disjoint ranges and weights are
//! split so the combined total is unchanged.

use rustc_hash::FxHashMap;

use crate::error::{FrsError, Result};
use crate::models::entity::ID_RADIX;
use crate::models::{VariableSet, VariableValues};

/// Last identifier digit of the alternative copy
pub const ALTERNATIVE_DIGIT: i64 = 1;

fn is_identifier(name: &str) -> bool {
    name.ends_with("_id")
}

fn is_weight(name: &str) -> bool {
    name.ends_with("_weight")
}

fn offset_ids(values: &VariableValues, digit: i64) -> Result<VariableValues> {
    match values {
        VariableValues::Int(ids) => Ok(VariableValues::Int(
            ids.iter().map(|id| id * ID_RADIX + digit).collect(),
        )),
        other => Err(FrsError::Shape(format!(
            "Identifiers must be integers, found {}",
            other.kind()
        ))),
    }
}

fn scale_weights(values: &VariableValues, share: f64) -> Result<VariableValues> {
    match values {
        VariableValues::Float(weights) => Ok(VariableValues::Float(
            weights.iter().map(|w| w * share).collect(),
        )),
        other => Err(FrsError::Shape(format!(
            "Weights must be floating point, found {}",
            other.kind()
        ))),
    }
}

/// Stack a dataset with an alternative copy of itself
///
/// `*_id` variables become `id * 10` in the original rows and `id * 10 + 1`
/// in the copy. `*_weight` variables are scaled by `1 - weight` and `weight`.
/// Variables named in `overrides` take the given values in the copy, every
/// other variable is duplicated.
///
/// # Arguments
/// * `data` - The original dataset
/// * `overrides` - Alternative values for the copy, keyed by variable name
/// * `weight` - Share of the total weight given to the copy, in `[0, 1]`
pub fn clone_and_blend(
    data: &VariableSet,
    overrides: &FxHashMap<String, VariableValues>,
    weight: f64,
) -> Result<VariableSet> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(FrsError::Config(format!(
            "Blend weight must lie in [0, 1], got {weight}"
        )));
    }
    if let Some(unknown) = overrides.keys().find(|name| !data.contains(name)) {
        return Err(FrsError::Shape(format!(
            "Cannot override {unknown}, it is not in the dataset"
        )));
    }

    let mut blended = VariableSet::new(data.year());
    for variable in data.iter() {
        let name = variable.name.as_str();
        let alternative = overrides.get(name).unwrap_or(&variable.values);
        if alternative.kind() != variable.values.kind()
            || alternative.len() != variable.values.len()
        {
            return Err(FrsError::Shape(format!(
                "Override for {name} must hold {} {} values",
                variable.values.len(),
                variable.values.kind()
            )));
        }

        let values = if is_identifier(name) {
            offset_ids(&variable.values, 0)?.concat(&offset_ids(alternative, ALTERNATIVE_DIGIT)?)?
        } else if is_weight(name) {
            scale_weights(&variable.values, 1.0 - weight)?
                .concat(&scale_weights(alternative, weight)?)?
        } else {
            variable.values.concat(alternative)?
        };
        blended.insert(name, variable.entity, values)?;
    }
    Ok(blended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;

    fn sample() -> VariableSet {
        let mut set = VariableSet::new(2019);
        set.insert("person_id", Entity::Person, VariableValues::Int(vec![111, 112]))
            .unwrap();
        set.insert("household_id", Entity::Household, VariableValues::Int(vec![1]))
            .unwrap();
        set.insert_float("person_weight", Entity::Person, vec![100.0, 100.0])
            .unwrap();
        set.insert_float("household_weight", Entity::Household, vec![100.0])
            .unwrap();
        set.insert_float("employment_income", Entity::Person, vec![20_000.0, 0.0])
            .unwrap();
        set.insert(
            "region",
            Entity::Household,
            VariableValues::Category(vec!["WALES".to_string()]),
        )
        .unwrap();
        set
    }

    #[test]
    fn test_ids_are_partitioned_and_weights_split() {
        let data = sample();
        let overrides = FxHashMap::from_iter([(
            "employment_income".to_string(),
            VariableValues::Float(vec![250_000.0, 0.0]),
        )]);
        let blended = clone_and_blend(&data, &overrides, 0.25).unwrap();

        assert_eq!(
            blended.require("person_id").unwrap().values,
            VariableValues::Int(vec![1110, 1120, 1111, 1121])
        );
        assert_eq!(
            blended.require("household_weight").unwrap().values,
            VariableValues::Float(vec![75.0, 25.0])
        );
        assert_eq!(
            blended.require("employment_income").unwrap().values,
            VariableValues::Float(vec![20_000.0, 0.0, 250_000.0, 0.0])
        );
        assert_eq!(
            blended.require("region").unwrap().values,
            VariableValues::Category(vec!["WALES".to_string(), "WALES".to_string()])
        );
        assert_eq!(blended.entity_len(Entity::Person), Some(4));
    }

    #[test]
    fn test_total_weight_is_conserved() {
        let data = sample();
        for w in [0.0, 0.3, 1.0] {
            let blended = clone_and_blend(&data, &FxHashMap::default(), w).unwrap();
            let weights = blended.f64_values("person_weight").unwrap();
            let (original, copy) = weights.split_at(2);
            assert!((original.iter().sum::<f64>() - 200.0 * (1.0 - w)).abs() < 1e-9);
            assert!((copy.iter().sum::<f64>() - 200.0 * w).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_blends_are_rejected() {
        let data = sample();
        let err = clone_and_blend(&data, &FxHashMap::default(), 1.5).unwrap_err();
        assert!(matches!(err, FrsError::Config(_)));

        let unknown = FxHashMap::from_iter([(
            "wealth".to_string(),
            VariableValues::Float(vec![1.0, 2.0]),
        )]);
        let err = clone_and_blend(&data, &unknown, 0.5).unwrap_err();
        assert!(matches!(err, FrsError::Shape(ref m) if m.contains("wealth")));

        let short = FxHashMap::from_iter([(
            "employment_income".to_string(),
            VariableValues::Float(vec![1.0]),
        )]);
        let err = clone_and_blend(&data, &short, 0.5).unwrap_err();
        assert!(matches!(err, FrsError::Shape(_)));
    }
}
