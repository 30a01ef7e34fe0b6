//! Household characteristics and council tax

use rustc_hash::FxHashMap;

use crate::error::{FrsError, Result};
use crate::models::types::{AccommodationType, Region, TenureType};
use crate::models::{Entity, VariableSet, VariableValues};
use crate::transform::frs::{MappingContext, recode_labels};

pub(super) fn add_household_variables(
    ctx: &MappingContext<'_>,
    set: &mut VariableSet,
) -> Result<()> {
    set.insert(
        "region",
        Entity::Household,
        VariableValues::Category(recode_labels::<Region>(
            ctx.household.numeric("GVTREGNO")?,
            "region",
        )),
    )?;
    set.insert(
        "tenure_type",
        Entity::Household,
        VariableValues::Category(recode_labels::<TenureType>(
            ctx.household.numeric("PTENTYP2")?,
            "tenure_type",
        )),
    )?;
    set.insert_float("num_bedrooms", Entity::Household, ctx.household("BEDROOM6")?)?;
    set.insert(
        "accommodation_type",
        Entity::Household,
        VariableValues::Category(recode_labels::<AccommodationType>(
            ctx.household.numeric("TYPEACC")?,
            "accommodation_type",
        )),
    )?;

    set.insert_float(
        "council_tax",
        Entity::Household,
        impute_council_tax(
            ctx.household.numeric("GVTREGNO")?,
            ctx.household.numeric("CTBAND")?,
            ctx.household.numeric("CTANNUAL")?,
        )?,
    )?;
    Ok(())
}

/// Fill missing council tax with the non-negative mean of the household's
/// (region, band) group, then with the mean over all households
pub(crate) fn impute_council_tax(
    regions: &[f64],
    bands: &[f64],
    reported: &[f64],
) -> Result<Vec<f64>> {
    let key = |region: f64, band: f64| {
        let code = |v: f64| (!v.is_nan()).then(|| v.round() as i64);
        (code(region), code(band))
    };

    let mut totals: FxHashMap<(Option<i64>, Option<i64>), (f64, usize)> = FxHashMap::default();
    for ((&region, &band), &amount) in regions.iter().zip(bands).zip(reported) {
        let entry = totals.entry(key(region, band)).or_insert((0.0, 0));
        if !amount.is_nan() {
            entry.0 += amount;
            entry.1 += 1;
        }
    }

    let mut council_tax: Vec<f64> = reported
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            if !amount.is_nan() {
                return amount;
            }
            match totals.get(&key(regions[i], bands[i])) {
                Some(&(total, n)) if n > 0 => (total / n as f64).max(0.0),
                _ => f64::NAN,
            }
        })
        .collect();

    let defined: Vec<f64> = council_tax.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() && !council_tax.is_empty() {
        return Err(FrsError::Imputation(
            "No household reports council tax".to_string(),
        ));
    }
    let average = defined.iter().sum::<f64>() / defined.len().max(1) as f64;
    for value in &mut council_tax {
        if value.is_nan() {
            *value = average;
        }
    }
    Ok(council_tax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_council_tax_takes_group_mean() {
        let nan = f64::NAN;
        let ct = impute_council_tax(
            &[1.0, 1.0, 1.0, 2.0],
            &[3.0, 3.0, 3.0, 5.0],
            &[1000.0, 1400.0, nan, nan],
        )
        .unwrap();
        assert_eq!(ct[2], 1200.0);
        // No reports in its group: overall mean of what is known by then
        assert!((ct[3] - 3600.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_mean_is_not_negative() {
        let ct = impute_council_tax(&[1.0, 1.0], &[1.0, 1.0], &[-50.0, f64::NAN]).unwrap();
        assert_eq!(ct, vec![-50.0, 0.0]);
    }
}
