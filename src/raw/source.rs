//! Sources of raw survey tables
//!
//! The transforms only see [`RawTables`]. Where the tables come from is
//! behind the [`RawSurveySource`] trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::util::validate_directory;
use crate::error::{FrsError, Result};
use crate::raw::table::{RawTable, RawTables};
use crate::schema::FrsTable;
use crate::utils::io::{TABLE_EXTENSIONS, find_table_file, read_table_file};
use crate::utils::logging::{StepTimer, warn_input};

/// Provider of per-year raw survey tables
pub trait RawSurveySource {
    /// Years for which tables are available, ascending
    fn available_years(&self) -> Result<Vec<i32>>;

    /// Load the requested tables for a year
    ///
    /// Implementations must check every table is available before reading
    /// any of them, and check each table's required columns.
    fn load(&mut self, year: i32, tables: &[FrsTable]) -> Result<RawTables>;

    /// Release any resources held by the source
    fn close(&mut self) -> Result<()>;
}

/// Check required columns, fill optional ones and derive identifiers
pub fn prepare_table(table: FrsTable, year: i32, data: &mut RawTable) -> Result<()> {
    data.check_required(table)?;
    let added = data.fill_optional(table)?;
    if !added.is_empty() {
        warn_input(
            &format!(
                "Table {table} ({year}) lacks optional columns {}, read as zero",
                added.join(", ")
            ),
            None,
        );
    }
    data.derive_identifiers()
}

/// Survey extracts stored as `<root>/<year>/<table>.<ext>`
///
/// Tables may be Parquet or tab-delimited text with a header row.
#[derive(Debug, Clone)]
pub struct FrsDirectorySource {
    root: PathBuf,
    closed: bool,
}

impl FrsDirectorySource {
    /// Open a directory of survey releases
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        validate_directory(&root, "raw survey data")?;
        Ok(Self {
            root,
            closed: false,
        })
    }

    /// Directory holding one year's tables
    #[must_use]
    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(FrsError::Config(format!(
                "Raw survey source at {} has been closed",
                self.root.display()
            )))
        } else {
            Ok(())
        }
    }
}

impl RawSurveySource for FrsDirectorySource {
    fn available_years(&self) -> Result<Vec<i32>> {
        self.ensure_open()?;
        let mut years = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(year) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i32>().ok())
            {
                years.push(year);
            }
        }
        years.sort_unstable();
        Ok(years)
    }

    fn load(&mut self, year: i32, tables: &[FrsTable]) -> Result<RawTables> {
        self.ensure_open()?;
        let dir = self.year_dir(year);
        validate_directory(&dir, &format!("raw survey tables for {year}"))?;

        // Every file must exist before any is read
        let mut files = Vec::with_capacity(tables.len());
        for &table in tables {
            let path = find_table_file(&dir, table.name()).ok_or_else(|| {
                log::error!(
                    "No {} file in {} (looked for {})",
                    table,
                    dir.display(),
                    TABLE_EXTENSIONS.join(", ")
                );
                FrsError::MissingTable {
                    table: table.name().to_string(),
                    year,
                }
            })?;
            files.push((table, path));
        }

        let mut loaded = RawTables::new(year);
        for (table, path) in files {
            let timer = StepTimer::start(format!("loading {table} {year}"), &path);
            let batch = read_table_file(&path)?;
            let mut data = RawTable::from_record_batch(table.name(), &batch)?;
            prepare_table(table, year, &mut data)?;
            timer.finish(data.num_rows(), "records");
            loaded.insert(table, data);
        }
        Ok(loaded)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        log::debug!("Closed raw survey source {}", self.root.display());
        Ok(())
    }
}

/// Raw tables held in memory, keyed by year
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    years: BTreeMap<i32, BTreeMap<FrsTable, RawTable>>,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table for a year
    pub fn insert(&mut self, year: i32, table: FrsTable, data: RawTable) {
        self.years.entry(year).or_default().insert(table, data);
    }
}

impl RawSurveySource for MemorySource {
    fn available_years(&self) -> Result<Vec<i32>> {
        Ok(self.years.keys().copied().collect())
    }

    fn load(&mut self, year: i32, tables: &[FrsTable]) -> Result<RawTables> {
        let available = self.years.get(&year);
        for &table in tables {
            if available.is_none_or(|t| !t.contains_key(&table)) {
                return Err(FrsError::MissingTable {
                    table: table.name().to_string(),
                    year,
                });
            }
        }

        let mut loaded = RawTables::new(year);
        if let Some(available) = available {
            for &table in tables {
                if let Some(data) = available.get(&table) {
                    let mut data = data.clone();
                    prepare_table(table, year, &mut data)?;
                    loaded.insert(table, data);
                }
            }
        }
        Ok(loaded)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
