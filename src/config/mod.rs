//! Configuration for dataset generation, storage and validation.

use std::path::{Path, PathBuf};

use crate::error::{FrsError, Result};

/// Environment variable naming the storage root
pub const STORAGE_ENV_VAR: &str = "FRS_DATA_STORAGE";

/// Storage root used when the environment variable is unset
pub const DEFAULT_STORAGE_ROOT: &str = "data";

/// File extension of the columnar store
pub const STORE_EXTENSION: &str = "parquet";

/// Name and location of one dataset's per-year output files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Dataset name, used as the file name prefix
    pub name: String,
    /// Directory holding the dataset files
    pub storage_root: PathBuf,
}

impl DatasetConfig {
    /// Create a new dataset configuration
    pub fn new(name: impl Into<String>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage_root: storage_root.into(),
        }
    }

    /// Path of the columnar store for a year
    #[must_use]
    pub fn file(&self, year: i32) -> PathBuf {
        self.file_with_extension(year, STORE_EXTENSION)
    }

    /// Path of a side file for a year with a different extension
    #[must_use]
    pub fn file_with_extension(&self, year: i32, extension: &str) -> PathBuf {
        self.storage_root
            .join(format!("{}_{}.{}", self.name, year, extension))
    }

    /// Years for which a store file exists, ascending
    pub fn available_years(&self) -> Result<Vec<i32>> {
        self.available_years_with_extension(STORE_EXTENSION)
    }

    /// Years for which a file with the given extension exists, ascending
    pub fn available_years_with_extension(&self, extension: &str) -> Result<Vec<i32>> {
        if !self.storage_root.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}_", self.name);
        let suffix = format!(".{extension}");
        let mut years = Vec::new();
        for entry in std::fs::read_dir(&self.storage_root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(year) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .and_then(|year| year.parse::<i32>().ok())
            {
                years.push(year);
            }
        }
        years.sort_unstable();
        Ok(years)
    }
}

/// Root directory for every dataset produced by the pipeline
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding all dataset files
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = std::env::var(STORAGE_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_ROOT));
        Self { root }
    }
}

impl StorageConfig {
    /// Use an explicit storage root
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Dataset configuration for a named dataset under this root
    #[must_use]
    pub fn dataset(&self, name: &str) -> DatasetConfig {
        DatasetConfig::new(name, &self.root)
    }
}

/// Options shared by the stochastic generation stages
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Seed for random imputation; `None` draws from the OS
    pub seed: Option<u64>,
}

impl GenerationOptions {
    /// Options with a fixed seed
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

/// Donor surveys and parameters for the enhancement stage
#[derive(Debug, Clone)]
pub struct ImputationConfig {
    /// Survey of Personal Incomes donor table
    pub spi_path: PathBuf,
    /// Wealth and Assets Survey donor table
    pub was_path: PathBuf,
    /// Living Costs and Food Survey donor table
    pub lcfs_path: PathBuf,
    /// Number of nearest donors to draw from
    pub neighbours: usize,
    /// Weight given to the high-income copy when blending
    pub high_income_weight: f64,
    /// Seed for donor selection
    pub seed: Option<u64>,
}

impl ImputationConfig {
    /// Donor tables expected as `spi`, `was` and `lcfs` files in one directory
    pub fn from_directory(dir: impl AsRef<Path>, extension: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            spi_path: dir.join(format!("spi.{extension}")),
            was_path: dir.join(format!("was.{extension}")),
            lcfs_path: dir.join(format!("lcfs.{extension}")),
            neighbours: 5,
            high_income_weight: 0.5,
            seed: None,
        }
    }

    /// Check the parameters are usable
    pub fn validate(&self) -> Result<()> {
        if self.neighbours == 0 {
            return Err(FrsError::Config(
                "Imputation needs at least one neighbour".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.high_income_weight) {
            return Err(FrsError::Config(format!(
                "High-income blend weight must lie in [0, 1], got {}",
                self.high_income_weight
            )));
        }
        Ok(())
    }
}

/// Default tolerances for comparisons against the reference model
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Quantiles checked over positive values
    pub quantiles: Vec<f64>,
    /// Absolute quantile error accepted regardless of relative error
    pub min_quantile_abs_error: f64,
    /// Relative quantile error accepted
    pub max_quantile_rel_error: f64,
    /// Relative error accepted for aggregates and counts
    pub max_rel_error: f64,
    /// Mean relative household error accepted among positive households
    pub max_mean_rel_error: f64,
    /// Share of households that must agree on positivity
    pub min_nonzero_agreement: f64,
    /// Relative error accepted against the reference aggregate table
    pub max_aggregate_rel_error: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quantiles: (1..=9).map(|i| f64::from(i) / 10.0).collect(),
            min_quantile_abs_error: 25.0,
            max_quantile_rel_error: 0.05,
            max_rel_error: 0.05,
            max_mean_rel_error: 0.05,
            min_nonzero_agreement: 0.99,
            max_aggregate_rel_error: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_file_is_derived_from_name_and_year() {
        let config = DatasetConfig::new("frs", "/tmp/store");
        assert_eq!(config.file(2018), PathBuf::from("/tmp/store/frs_2018.parquet"));
        assert_eq!(
            config.file_with_extension(2018, "json"),
            PathBuf::from("/tmp/store/frs_2018.json")
        );
    }

    #[test]
    fn test_available_years_ignores_other_datasets() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "frs_2019.parquet",
            "frs_2018.parquet",
            "base_frs_2018.parquet",
            "frs_x.parquet",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let config = DatasetConfig::new("frs", dir.path());
        assert_eq!(config.available_years().unwrap(), vec![2018, 2019]);
    }

    #[test]
    fn test_imputation_config_validation() {
        let mut config = ImputationConfig::from_directory("/aux", "tab");
        assert!(config.validate().is_ok());
        config.high_income_weight = 1.5;
        assert!(config.validate().is_err());
        config.high_income_weight = 0.5;
        config.neighbours = 0;
        assert!(config.validate().is_err());
    }
}
