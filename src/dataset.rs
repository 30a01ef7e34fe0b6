//! Generated datasets and their per-year store files
//!
//! Each dataset owns a [`DatasetConfig`] that fixes where its files live.
//! Generating a year overwrites that year's file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use log::info;

use crate::config::{DatasetConfig, GenerationOptions, ImputationConfig, StorageConfig};
use crate::enhance::{FRS_ENHANCED, enhance};
use crate::error::util::require_file;
use crate::error::Result;
use crate::models::VariableSet;
use crate::raw::RawSurveySource;
use crate::reference::{
    AggregateTable, UKMOD_AGG, UKMOD_INPUT, UKMOD_OUTPUT, ukmod_input, ukmod_output,
};
use crate::schema::FrsTable;
use crate::store::{StoreReader, write_store};
use crate::transform::base::{self, BASE_FRS};
use crate::transform::frs::{self, FRS};
use crate::utils::logging::progress::{create_stage_progress_bar, finish_progress_bar};

/// Extension of the aggregate table files
pub const AGGREGATE_EXTENSION: &str = "json";

/// A dataset stored as one columnar file per year
pub trait Dataset {
    /// Where the dataset's files live
    fn config(&self) -> &DatasetConfig;

    /// Dataset name
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Store path for a year
    fn file(&self, year: i32) -> PathBuf {
        self.config().file(year)
    }

    /// Years already generated
    fn years(&self) -> Result<Vec<i32>> {
        self.config().available_years()
    }

    /// Read every variable of a year
    fn load(&self, year: i32) -> Result<VariableSet> {
        StoreReader::open(&self.file(year))?.load(year)
    }
}

macro_rules! dataset {
    ($(#[$doc:meta])* $name:ident, $dataset:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            config: DatasetConfig,
        }

        impl $name {
            /// Dataset stored under a storage root
            #[must_use]
            pub fn new(storage: &StorageConfig) -> Self {
                Self {
                    config: storage.dataset($dataset),
                }
            }
        }

        impl Dataset for $name {
            fn config(&self) -> &DatasetConfig {
                &self.config
            }
        }
    };
}

dataset!(
    /// Raw person, benefit unit and household columns with council tax imputed
    BaseFrs,
    BASE_FRS
);
dataset!(
    /// Model variables mapped from the raw survey
    Frs,
    FRS
);
dataset!(
    /// FRS with imputed high incomes, wealth and consumption
    FrsEnhanced,
    FRS_ENHANCED
);
dataset!(
    /// UKMOD input microdata in annual amounts
    UkmodInput,
    UKMOD_INPUT
);
dataset!(
    /// UKMOD output microdata in annual amounts
    UkmodOutput,
    UKMOD_OUTPUT
);

/// Write a generated set and finish the stage bar
fn write_generated(
    dataset: &impl Dataset,
    set: &VariableSet,
    pb: &ProgressBar,
    start: Instant,
) -> Result<PathBuf> {
    pb.set_message(format!("Writing {}", dataset.name()));
    let path = dataset.file(set.year());
    write_store(&path, dataset.name(), set)?;
    pb.inc(1);
    finish_progress_bar(pb, Some("Done"));
    info!(
        "Generated {} for {} in {:.2?}",
        dataset.name(),
        set.year(),
        start.elapsed()
    );
    Ok(path)
}

impl BaseFrs {
    /// Generate a year from the raw survey
    pub fn generate(
        &self,
        source: &mut dyn RawSurveySource,
        year: i32,
        options: &GenerationOptions,
    ) -> Result<PathBuf> {
        let start = Instant::now();
        let pb = create_stage_progress_bar(3, Some("Loading raw tables"));
        let tables = source.load(year, &FrsTable::BASE)?;
        pb.inc(1);

        pb.set_message("Joining tables");
        let set = base::transform(&tables, options)?;
        pb.inc(1);
        write_generated(self, &set, &pb, start)
    }
}

impl Frs {
    /// Generate a year from the raw survey
    pub fn generate(&self, source: &mut dyn RawSurveySource, year: i32) -> Result<PathBuf> {
        let start = Instant::now();
        let pb = create_stage_progress_bar(3, Some("Loading raw tables"));
        let tables = source.load(year, &FrsTable::ALL)?;
        pb.inc(1);

        pb.set_message("Mapping variables");
        let set = frs::transform(&tables)?;
        pb.inc(1);
        write_generated(self, &set, &pb, start)
    }
}

impl FrsEnhanced {
    /// Generate a year, regenerating the FRS it builds on
    ///
    /// Donor files are checked before the FRS is regenerated.
    pub fn generate(
        &self,
        frs: &Frs,
        source: &mut dyn RawSurveySource,
        year: i32,
        imputation: &ImputationConfig,
    ) -> Result<PathBuf> {
        let start = Instant::now();
        imputation.validate()?;
        for path in [&imputation.spi_path, &imputation.was_path, &imputation.lcfs_path] {
            require_file(path, "imputation donor table")?;
        }

        frs.generate(source, year)?;
        let pb = create_stage_progress_bar(3, Some("Loading FRS"));
        let base = frs.load(year)?;
        pb.inc(1);

        pb.set_message("Imputing");
        let set = enhance(&base, imputation)?;
        pb.inc(1);
        write_generated(self, &set, &pb, start)
    }
}

impl UkmodInput {
    /// Convert a UKMOD input file for a year
    pub fn generate(&self, tabfile: &Path, year: i32) -> Result<PathBuf> {
        let start = Instant::now();
        let pb = create_stage_progress_bar(2, Some("Reading UKMOD input"));
        let set = ukmod_input(tabfile, year)?;
        pb.inc(1);
        write_generated(self, &set, &pb, start)
    }
}

impl UkmodOutput {
    /// Convert a UKMOD output file for a year
    pub fn generate(&self, tabfile: &Path, year: i32) -> Result<PathBuf> {
        let start = Instant::now();
        let pb = create_stage_progress_bar(2, Some("Reading UKMOD output"));
        let set = ukmod_output(tabfile, year)?;
        pb.inc(1);
        write_generated(self, &set, &pb, start)
    }
}

/// Summary table of the UKMOD input, stored as JSON per year
#[derive(Debug, Clone)]
pub struct UkmodAggregates {
    config: DatasetConfig,
}

impl UkmodAggregates {
    /// Dataset stored under a storage root
    #[must_use]
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            config: storage.dataset(UKMOD_AGG),
        }
    }

    /// Table path for a year
    #[must_use]
    pub fn file(&self, year: i32) -> PathBuf {
        self.config.file_with_extension(year, AGGREGATE_EXTENSION)
    }

    /// Years already generated
    pub fn years(&self) -> Result<Vec<i32>> {
        self.config.available_years_with_extension(AGGREGATE_EXTENSION)
    }

    /// Summarise a UKMOD file for a year
    pub fn generate(&self, tabfile: &Path, year: i32) -> Result<PathBuf> {
        let table = AggregateTable::from_ukmod_file(tabfile, year)?;
        let path = self.file(year);
        table.write(&path)?;
        info!("Generated {UKMOD_AGG} for {year}");
        Ok(path)
    }

    /// Read the table of a year
    pub fn load(&self, year: i32) -> Result<AggregateTable> {
        AggregateTable::read(&self.file(year))
    }
}
