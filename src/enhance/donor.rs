//! Auxiliary donor surveys
//!
//! Each survey names the predictors it shares with the FRS, the targets it
//! contributes and its weight column. Donor column names match the variable
//! names they stand for.

use std::path::Path;

use crate::error::util::require_file;
use crate::error::{FrsError, Result};
use crate::models::Entity;
use crate::raw::RawTable;
use crate::utils::io::read_table_file;
use crate::utils::logging::{StepTimer, warn_input};

/// Where a recipient predictor comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    /// A variable of the matching entity
    Own(&'static str),
    /// A person variable summed over each household
    PersonSum(&'static str),
}

impl Predictor {
    /// Variable name, also the donor column name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Own(name) | Self::PersonSum(name) => name,
        }
    }
}

/// An auxiliary survey used as a donor pool
#[derive(Debug, Clone, Copy)]
pub struct DonorSurvey {
    /// Short survey name
    pub name: &'static str,
    /// Entity at which donors are matched
    pub entity: Entity,
    /// Predictors shared with the recipients
    pub predictors: &'static [Predictor],
    /// Variables copied from the matched donor
    pub targets: &'static [&'static str],
    /// Donor weight column
    pub weight: &'static str,
}

/// Survey of Personal Incomes: high incomes by person
pub const SPI: DonorSurvey = DonorSurvey {
    name: "spi",
    entity: Entity::Person,
    predictors: &[
        Predictor::Own("age"),
        Predictor::Own("employment_income"),
        Predictor::Own("self_employment_income"),
        Predictor::Own("pension_income"),
    ],
    targets: &[
        "employment_income",
        "self_employment_income",
        "pension_income",
        "savings_interest_income",
        "dividend_income",
        "property_income",
    ],
    weight: "weight",
};

/// Wealth and Assets Survey: household wealth
pub const WAS: DonorSurvey = DonorSurvey {
    name: "was",
    entity: Entity::Household,
    predictors: &[
        Predictor::PersonSum("employment_income"),
        Predictor::PersonSum("self_employment_income"),
        Predictor::PersonSum("pension_income"),
        Predictor::PersonSum("savings_interest_income"),
        Predictor::PersonSum("dividend_income"),
        Predictor::Own("num_bedrooms"),
    ],
    targets: &[
        "main_residence_value",
        "other_residential_property_value",
        "non_residential_property_value",
        "corporate_wealth",
        "gross_financial_wealth",
        "net_financial_wealth",
        "savings",
    ],
    weight: "weight",
};

/// Living Costs and Food Survey: household consumption
pub const LCFS: DonorSurvey = DonorSurvey {
    name: "lcfs",
    entity: Entity::Household,
    predictors: &[
        Predictor::PersonSum("employment_income"),
        Predictor::PersonSum("self_employment_income"),
        Predictor::PersonSum("pension_income"),
        Predictor::Own("num_bedrooms"),
    ],
    targets: &[
        "food_and_non_alcoholic_beverages_consumption",
        "alcohol_and_tobacco_consumption",
        "clothing_and_footwear_consumption",
        "housing_water_and_electricity_consumption",
        "household_furnishings_consumption",
        "health_consumption",
        "transport_consumption",
        "communication_consumption",
        "recreation_consumption",
        "education_consumption",
        "restaurants_and_hotels_consumption",
        "miscellaneous_consumption",
    ],
    weight: "weight",
};

/// Donor records of one survey, complete cases only
#[derive(Debug, Clone)]
pub struct DonorTable {
    /// Predictor columns, in survey order
    pub predictors: Vec<Vec<f64>>,
    /// Target columns, in survey order
    pub targets: Vec<Vec<f64>>,
    /// Donor weights
    pub weights: Vec<f64>,
}

impl DonorTable {
    /// Number of donors
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no donors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl DonorSurvey {
    /// Read the donor table of this survey
    ///
    /// Rows with a missing value or a non-positive weight are dropped with a
    /// warning. A table with no usable rows is an error.
    pub fn load(&self, path: &Path) -> Result<DonorTable> {
        let timer = StepTimer::start(format!("loading {} donors", self.name), path);
        require_file(path, &format!("{} donor table", self.name))?;

        let batch = read_table_file(path)?;
        let raw = RawTable::from_record_batch(self.name, &batch)?;
        let column = |name: &str| raw.numeric(&name.to_uppercase());

        let predictors = self
            .predictors
            .iter()
            .map(|p| column(p.name()).map(<[f64]>::to_vec))
            .collect::<Result<Vec<_>>>()?;
        let targets = self
            .targets
            .iter()
            .map(|t| column(t).map(<[f64]>::to_vec))
            .collect::<Result<Vec<_>>>()?;
        let weights = column(self.weight)?;

        let keep: Vec<usize> = (0..raw.num_rows())
            .filter(|&row| {
                weights[row] > 0.0
                    && predictors.iter().chain(&targets).all(|c| c[row].is_finite())
            })
            .collect();
        let dropped = raw.num_rows() - keep.len();
        if dropped > 0 {
            warn_input(
                &format!("Dropped {dropped} incomplete {} donor records", self.name),
                Some(path),
            );
        }
        if keep.is_empty() {
            return Err(FrsError::Imputation(format!(
                "No usable donor records in the {} table",
                self.name
            )));
        }

        let select = |c: &Vec<f64>| keep.iter().map(|&row| c[row]).collect::<Vec<f64>>();
        let table = DonorTable {
            predictors: predictors.iter().map(select).collect(),
            targets: targets.iter().map(select).collect(),
            weights: keep.iter().map(|&row| weights[row]).collect(),
        };
        timer.finish(table.len(), "donor records");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_donors_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcfs.tab");
        let mut header: Vec<&str> = LCFS.predictors.iter().map(Predictor::name).collect();
        header.extend(LCFS.targets);
        header.push("weight");

        let width = header.len();
        let row = |fill: &str, weight: &str| {
            let mut cells = vec![fill; width - 1];
            cells.push(weight);
            cells.join("\t")
        };
        let contents = format!(
            "{}\n{}\n{}\n{}\n",
            header.join("\t"),
            row("1", "10"),
            row("", "10"),
            row("2", "0"),
        );
        std::fs::write(&path, contents).unwrap();

        let donors = LCFS.load(&path).unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors.predictors.len(), LCFS.predictors.len());
        assert_eq!(donors.targets[0], vec![1.0]);
    }

    #[test]
    fn test_missing_donor_file_is_reported() {
        let err = SPI.load(Path::new("/nonexistent/spi.tab")).unwrap_err();
        assert!(matches!(err, FrsError::MissingInput { .. }));
    }
}
