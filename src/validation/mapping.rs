//! Variable pairs between generated datasets and UKMOD
//!
//! The mapping file is YAML, one entry per generated variable:
//!
//! ```yaml
//! employment_income: yem
//! pension_income:
//!   ukmod: ypp
//!   min_quantile_abs_error: 50
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::ValidationConfig;
use crate::error::Result;
use crate::error::util::safe_read_to_string;
use crate::validation::tolerance::{Tolerance, Tolerances};

/// Tolerance fields a mapping entry may override
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedEntry {
    /// UKMOD variable name
    pub ukmod: String,
    pub min_quantile_abs_error: Option<f64>,
    pub max_quantile_rel_error: Option<f64>,
    pub max_rel_error: Option<f64>,
    pub max_mean_rel_error: Option<f64>,
    pub min_nonzero_agreement: Option<f64>,
    pub max_aggregate_rel_error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum MappingEntry {
    Name(String),
    Detailed(DetailedEntry),
}

impl MappingEntry {
    fn into_detailed(self) -> DetailedEntry {
        match self {
            Self::Name(ukmod) => DetailedEntry {
                ukmod,
                ..Default::default()
            },
            Self::Detailed(entry) => entry,
        }
    }
}

/// A generated variable, its UKMOD counterpart and the limits to check
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePair {
    /// Generated variable name
    pub name: String,
    /// UKMOD variable name
    pub ukmod: String,
    /// Limits for this pair
    pub tolerances: Tolerances,
}

impl VariablePair {
    /// Pair using the default limits
    #[must_use]
    pub fn new(name: &str, ukmod: &str, defaults: &ValidationConfig) -> Self {
        Self::from_entry(
            name.to_string(),
            DetailedEntry {
                ukmod: ukmod.to_string(),
                ..Default::default()
            },
            defaults,
        )
    }

    fn from_entry(name: String, entry: DetailedEntry, defaults: &ValidationConfig) -> Self {
        let tolerances = Tolerances {
            quantile: Tolerance::absolute_or_relative(
                entry
                    .min_quantile_abs_error
                    .unwrap_or(defaults.min_quantile_abs_error),
                entry
                    .max_quantile_rel_error
                    .unwrap_or(defaults.max_quantile_rel_error),
            ),
            aggregate: Tolerance::relative(entry.max_rel_error.unwrap_or(defaults.max_rel_error)),
            max_mean_rel_error: entry
                .max_mean_rel_error
                .unwrap_or(defaults.max_mean_rel_error),
            min_nonzero_agreement: entry
                .min_nonzero_agreement
                .unwrap_or(defaults.min_nonzero_agreement),
            aggregate_table: Tolerance::relative(
                entry
                    .max_aggregate_rel_error
                    .unwrap_or(defaults.max_aggregate_rel_error),
            ),
        };
        Self {
            name,
            ukmod: entry.ukmod,
            tolerances,
        }
    }
}

/// Parse a mapping document, in variable name order
pub fn parse_variable_map(yaml: &str, defaults: &ValidationConfig) -> Result<Vec<VariablePair>> {
    let entries: BTreeMap<String, MappingEntry> = serde_yaml::from_str(yaml)?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| VariablePair::from_entry(name, entry.into_detailed(), defaults))
        .collect())
}

/// Read a mapping file
pub fn load_variable_map(path: &Path, defaults: &ValidationConfig) -> Result<Vec<VariablePair>> {
    parse_variable_map(&safe_read_to_string(path, "reading variable map")?, defaults)
}
