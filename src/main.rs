//! Command-line driver for dataset generation and validation
//!
//! ```bash
//! frs-data frs --raw ./raw --year 2018
//! frs-data ukmod-input --tabfile uk_2018_std.txt --year 2018
//! frs-data validate --year 2018 --map variable_ukmod_map.yml
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use frs_data::config::{
    DEFAULT_STORAGE_ROOT, GenerationOptions, ImputationConfig, STORAGE_ENV_VAR, StorageConfig,
    ValidationConfig,
};
use frs_data::dataset::{
    BaseFrs, Dataset, Frs, FrsEnhanced, UkmodAggregates, UkmodInput, UkmodOutput,
};
use frs_data::raw::{FrsDirectorySource, RawSurveySource};
use frs_data::validation::{load_variable_map, validate};

/// Build FRS microdata for tax-benefit microsimulation
#[derive(Parser, Debug)]
#[command(name = "frs-data", version, about)]
struct Cli {
    /// Directory holding the generated datasets
    #[arg(long, env = STORAGE_ENV_VAR, default_value = DEFAULT_STORAGE_ROOT, global = true)]
    storage: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the raw tables and impute council tax
    BaseFrs {
        /// Raw survey directory, one subdirectory per year
        #[arg(long)]
        raw: PathBuf,
        #[arg(long)]
        year: i32,
        /// Seed for council tax sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Map the raw survey to model variables
    Frs {
        #[arg(long)]
        raw: PathBuf,
        #[arg(long)]
        year: i32,
    },
    /// Regenerate the FRS and add imputed incomes, wealth and consumption
    FrsEnhanced {
        #[arg(long)]
        raw: PathBuf,
        #[arg(long)]
        year: i32,
        /// Directory holding the spi, was and lcfs donor tables
        #[arg(long)]
        donors: PathBuf,
        /// Extension of the donor tables
        #[arg(long, default_value = "tab")]
        donor_extension: String,
        #[arg(long, default_value_t = 5)]
        neighbours: usize,
        /// Share of the weight given to the high-income copy
        #[arg(long, default_value_t = 0.5)]
        high_income_weight: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Convert a UKMOD input file
    UkmodInput {
        #[arg(long)]
        tabfile: PathBuf,
        #[arg(long)]
        year: i32,
    },
    /// Convert a UKMOD output file
    UkmodOutput {
        #[arg(long)]
        tabfile: PathBuf,
        #[arg(long)]
        year: i32,
    },
    /// Summarise a UKMOD file into deciles, totals and nonzero counts
    UkmodAgg {
        #[arg(long)]
        tabfile: PathBuf,
        #[arg(long)]
        year: i32,
    },
    /// Compare a generated dataset with UKMOD
    Validate {
        #[arg(long)]
        year: i32,
        #[arg(long, value_enum, default_value_t = Generated::Frs)]
        dataset: Generated,
        #[arg(long, value_enum, default_value_t = Reference::Input)]
        reference: Reference,
        /// YAML map of variable pairs
        #[arg(long)]
        map: PathBuf,
        /// Also compare against the UKMOD aggregate table
        #[arg(long)]
        aggregates: bool,
        /// Write the report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// List the years generated for each dataset
    Years,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Generated {
    BaseFrs,
    Frs,
    FrsEnhanced,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Reference {
    Input,
    Output,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let storage = StorageConfig::new(&cli.storage);

    match cli.command {
        Command::BaseFrs { raw, year, seed } => {
            let mut source = FrsDirectorySource::new(&raw)?;
            let path = BaseFrs::new(&storage).generate(
                &mut source,
                year,
                &GenerationOptions { seed },
            )?;
            source.close()?;
            info!("Wrote {}", path.display());
        }
        Command::Frs { raw, year } => {
            let mut source = FrsDirectorySource::new(&raw)?;
            let path = Frs::new(&storage).generate(&mut source, year)?;
            source.close()?;
            info!("Wrote {}", path.display());
        }
        Command::FrsEnhanced {
            raw,
            year,
            donors,
            donor_extension,
            neighbours,
            high_income_weight,
            seed,
        } => {
            let imputation = ImputationConfig {
                neighbours,
                high_income_weight,
                seed,
                ..ImputationConfig::from_directory(&donors, &donor_extension)
            };
            let mut source = FrsDirectorySource::new(&raw)?;
            let path = FrsEnhanced::new(&storage).generate(
                &Frs::new(&storage),
                &mut source,
                year,
                &imputation,
            )?;
            source.close()?;
            info!("Wrote {}", path.display());
        }
        Command::UkmodInput { tabfile, year } => {
            let path = UkmodInput::new(&storage).generate(&tabfile, year)?;
            info!("Wrote {}", path.display());
        }
        Command::UkmodOutput { tabfile, year } => {
            let path = UkmodOutput::new(&storage).generate(&tabfile, year)?;
            info!("Wrote {}", path.display());
        }
        Command::UkmodAgg { tabfile, year } => {
            let path = UkmodAggregates::new(&storage).generate(&tabfile, year)?;
            info!("Wrote {}", path.display());
        }
        Command::Validate {
            year,
            dataset,
            reference,
            map,
            aggregates,
            report,
        } => {
            let config = ValidationConfig::default();
            let pairs = load_variable_map(&map, &config)?;
            let generated = match dataset {
                Generated::BaseFrs => BaseFrs::new(&storage).load(year),
                Generated::Frs => Frs::new(&storage).load(year),
                Generated::FrsEnhanced => FrsEnhanced::new(&storage).load(year),
            }
            .with_context(|| format!("Loading the generated dataset for {year}"))?;
            let reference = match reference {
                Reference::Input => UkmodInput::new(&storage).load(year),
                Reference::Output => UkmodOutput::new(&storage).load(year),
            }
            .with_context(|| format!("Loading the UKMOD dataset for {year}"))?;
            let table = if aggregates {
                Some(UkmodAggregates::new(&storage).load(year)?)
            } else {
                None
            };

            let result = validate(&generated, &reference, &pairs, table.as_ref(), &config)?;
            for check in result.failures() {
                warn!(
                    "{} vs {} {}: {} against {}",
                    check.variable, check.reference, check.metric, check.result, check.target
                );
            }
            if let Some(path) = report {
                result.write(&path)?;
                info!("Wrote report to {}", path.display());
            }
            if !result.passed() {
                bail!("{} validation checks failed", result.failures().count());
            }
            info!("All {} validation checks passed", result.checks.len());
        }
        Command::Years => {
            let datasets: [(&str, Vec<i32>); 6] = [
                ("base_frs", BaseFrs::new(&storage).years()?),
                ("frs", Frs::new(&storage).years()?),
                ("frs_enhanced", FrsEnhanced::new(&storage).years()?),
                ("ukmod_input", UkmodInput::new(&storage).years()?),
                ("ukmod_output", UkmodOutput::new(&storage).years()?),
                ("ukmod_agg", UkmodAggregates::new(&storage).years()?),
            ];
            for (name, years) in datasets {
                println!("{name}: {years:?}");
            }
        }
    }
    Ok(())
}
