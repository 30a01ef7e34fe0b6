//! In-memory representation of one raw survey table
//!
//! Raw tables are column-oriented. Numeric columns hold `f64` with NaN for
//! missing cells; anything that does not parse as a number is kept as text.

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::{FrsError, Result};
use crate::models::entity::{benunit_id, person_id};
use crate::schema::{BENUNIT, FrsTable, PERSON, SERNUM};
use crate::utils::arrow::{array_to_f64, array_to_strings};

/// Derived household identifier column
pub const HOUSEHOLD_ID: &str = "household_id";
/// Derived benefit unit identifier column
pub const BENUNIT_ID: &str = "benunit_id";
/// Derived person identifier column
pub const PERSON_ID: &str = "person_id";

/// One column of a raw table
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    /// Numbers, NaN where missing
    Numeric(Vec<f64>),
    /// Free text
    Text(Vec<String>),
}

impl RawColumn {
    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    fn missing(&self, len: usize) -> Self {
        match self {
            Self::Numeric(_) => Self::Numeric(vec![f64::NAN; len]),
            Self::Text(_) => Self::Text(vec![String::new(); len]),
        }
    }

    fn append(&mut self, other: &Self) -> Result<()> {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.extend_from_slice(b),
            (Self::Text(a), Self::Text(b)) => a.extend(b.iter().cloned()),
            (Self::Text(a), Self::Numeric(b)) => a.extend(b.iter().map(|x| {
                if x.is_nan() {
                    String::new()
                } else {
                    x.to_string()
                }
            })),
            (Self::Numeric(_), Self::Text(_)) => {
                return Err(FrsError::Shape(
                    "Cannot append text to a numeric column".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A raw survey table held column by column
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    name: String,
    names: Vec<String>,
    columns: Vec<RawColumn>,
    lookup: FxHashMap<String, usize>,
    num_rows: usize,
}

impl RawTable {
    /// Create an empty table with a fixed number of rows
    pub fn new(name: impl Into<String>, num_rows: usize) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            columns: Vec::new(),
            lookup: FxHashMap::default(),
            num_rows,
        }
    }

    /// Build a table from named columns
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<(String, RawColumn)>,
    ) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut table = Self::new(name, num_rows);
        for (column, values) in columns {
            table.insert(column, values)?;
        }
        Ok(table)
    }

    /// Convert a record batch, upper-casing column names
    pub fn from_record_batch(name: impl Into<String>, batch: &RecordBatch) -> Result<Self> {
        let mut table = Self::new(name, batch.num_rows());
        let schema = batch.schema();
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let column = match array_to_f64(array)? {
                Some(values) => RawColumn::Numeric(values),
                None => RawColumn::Text(array_to_strings(array)?),
            };
            table.insert(field.name().to_uppercase(), column)?;
        }
        Ok(table)
    }

    /// Table name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Column names in order
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column exists
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.lookup.contains_key(column)
    }

    /// Look up a column
    #[must_use]
    pub fn column(&self, column: &str) -> Option<&RawColumn> {
        self.lookup.get(column).map(|&idx| &self.columns[idx])
    }

    /// Columns with their names, in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawColumn)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Add a column, failing if the name is taken or the length is wrong
    pub fn insert(&mut self, column: impl Into<String>, values: RawColumn) -> Result<()> {
        let column = column.into();
        if self.lookup.contains_key(&column) {
            return Err(FrsError::Shape(format!(
                "Column {column} appears twice in {}",
                self.name
            )));
        }
        if values.len() != self.num_rows {
            return Err(FrsError::Shape(format!(
                "Column {column} of {} has {} rows, expected {}",
                self.name,
                values.len(),
                self.num_rows
            )));
        }
        self.lookup.insert(column.clone(), self.columns.len());
        self.names.push(column);
        self.columns.push(values);
        Ok(())
    }

    /// Remove a column if present
    pub fn drop_column(&mut self, column: &str) -> Option<RawColumn> {
        let idx = self.lookup.remove(column)?;
        self.names.remove(idx);
        let removed = self.columns.remove(idx);
        for (i, name) in self.names.iter().enumerate().skip(idx) {
            self.lookup.insert(name.clone(), i);
        }
        Some(removed)
    }

    /// Numeric column, NaN where missing
    pub fn numeric(&self, column: &str) -> Result<&[f64]> {
        match self.column(column) {
            Some(RawColumn::Numeric(values)) => Ok(values),
            Some(RawColumn::Text(_)) => Err(FrsError::Shape(format!(
                "Column {column} of {} is not numeric",
                self.name
            ))),
            None => Err(FrsError::missing_column(&self.name, column)),
        }
    }

    /// Numeric column with missing cells replaced
    pub fn numeric_filled(&self, column: &str, fill: f64) -> Result<Vec<f64>> {
        Ok(self
            .numeric(column)?
            .iter()
            .map(|&v| if v.is_nan() { fill } else { v })
            .collect())
    }

    /// Numeric column with missing cells as zero, or all zeros when absent
    pub fn numeric_or_zero(&self, column: &str) -> Result<Vec<f64>> {
        if self.has_column(column) {
            self.numeric_filled(column, 0.0)
        } else {
            Ok(vec![0.0; self.num_rows])
        }
    }

    /// Text column
    pub fn text(&self, column: &str) -> Result<&[String]> {
        match self.column(column) {
            Some(RawColumn::Text(values)) => Ok(values),
            Some(RawColumn::Numeric(_)) => Err(FrsError::Shape(format!(
                "Column {column} of {} is not text",
                self.name
            ))),
            None => Err(FrsError::missing_column(&self.name, column)),
        }
    }

    /// Integer identifiers; a missing or fractional cell is an error
    pub fn ids(&self, column: &str) -> Result<Vec<i64>> {
        self.numeric(column)?
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                if v.is_finite() && v.fract() == 0.0 {
                    Ok(v as i64)
                } else {
                    Err(FrsError::Identifier(format!(
                        "Row {row} of {} has invalid {column} value {v}",
                        self.name
                    )))
                }
            })
            .collect()
    }

    /// Append the identifier columns derivable from the survey numbers
    ///
    /// `household_id` needs `SERNUM`, `benunit_id` also `BENUNIT`, and
    /// `person_id` also `PERSON`. Already derived columns are left alone.
    pub fn derive_identifiers(&mut self) -> Result<()> {
        if !self.has_column(SERNUM) || self.has_column(HOUSEHOLD_ID) {
            return Ok(());
        }
        let households = self.ids(SERNUM)?;
        let to_f64 = |ids: &[i64]| RawColumn::Numeric(ids.iter().map(|&id| id as f64).collect());

        let benunits = if self.has_column(BENUNIT) {
            let local = self.ids(BENUNIT)?;
            Some(
                households
                    .iter()
                    .zip(&local)
                    .map(|(&h, &b)| benunit_id(h, b))
                    .collect::<Vec<_>>(),
            )
        } else {
            None
        };
        let persons = match (&benunits, self.has_column(PERSON)) {
            (Some(benunits), true) => {
                let local = self.ids(PERSON)?;
                Some(
                    benunits
                        .iter()
                        .zip(&local)
                        .map(|(&b, &p)| person_id(b, p))
                        .collect::<Vec<_>>(),
                )
            }
            _ => None,
        };

        self.insert(HOUSEHOLD_ID, to_f64(&households))?;
        if let Some(benunits) = benunits {
            self.insert(BENUNIT_ID, to_f64(&benunits))?;
        }
        if let Some(persons) = persons {
            self.insert(PERSON_ID, to_f64(&persons))?;
        }
        Ok(())
    }

    /// New table holding the given rows, in the given order
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            lookup: self.lookup.clone(),
            num_rows: rows.len(),
        }
    }

    /// Rows sorted ascending by a numeric column, stable for ties
    pub fn sorted_by(&self, column: &str) -> Result<Self> {
        let keys = self.numeric(column)?;
        let mut rows: Vec<usize> = (0..self.num_rows).collect();
        rows.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
        Ok(self.take(&rows))
    }

    /// Stack two tables, taking the union of their columns
    ///
    /// Columns missing from one side are filled with NaN (or empty text).
    pub fn concat(&self, other: &Self) -> Result<Self> {
        let mut merged: Vec<(String, RawColumn)> = Vec::new();
        let total = self.num_rows + other.num_rows;

        for (name, column) in self.iter() {
            let mut values = column.clone();
            match other.column(name) {
                Some(theirs) => values.append(theirs)?,
                None => values.append(&column.missing(other.num_rows))?,
            }
            merged.push((name.to_string(), values));
        }
        for (name, column) in other.iter() {
            if self.has_column(name) {
                continue;
            }
            let mut values = column.missing(self.num_rows);
            values.append(column)?;
            merged.push((name.to_string(), values));
        }

        let mut table = Self::new(self.name.clone(), total);
        for (name, values) in merged {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Check the catalogue's required columns are present
    pub fn check_required(&self, table: FrsTable) -> Result<()> {
        match table
            .required_columns()
            .iter()
            .find(|column| !self.has_column(column))
        {
            Some(column) => Err(FrsError::missing_column(table.name(), *column)),
            None => Ok(()),
        }
    }

    /// Add zero-filled columns for absent optional columns
    ///
    /// Returns the names of the columns that were added.
    pub fn fill_optional(&mut self, table: FrsTable) -> Result<Vec<&'static str>> {
        let mut added = Vec::new();
        for &column in table.optional_columns() {
            if !self.has_column(column) {
                self.insert(column, RawColumn::Numeric(vec![0.0; self.num_rows]))?;
                added.push(column);
            }
        }
        Ok(added)
    }
}

/// All raw tables loaded for one survey year
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    year: i32,
    tables: BTreeMap<FrsTable, RawTable>,
}

impl RawTables {
    /// Create an empty collection for a year
    #[must_use]
    pub fn new(year: i32) -> Self {
        Self {
            year,
            tables: BTreeMap::new(),
        }
    }

    /// Survey year
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Add or replace a table
    pub fn insert(&mut self, table: FrsTable, data: RawTable) {
        self.tables.insert(table, data);
    }

    /// Look up a table
    #[must_use]
    pub fn get(&self, table: FrsTable) -> Option<&RawTable> {
        self.tables.get(&table)
    }

    /// Look up a table, failing if it was not loaded
    pub fn require(&self, table: FrsTable) -> Result<&RawTable> {
        self.get(table).ok_or_else(|| FrsError::MissingTable {
            table: table.name().to_string(),
            year: self.year,
        })
    }

    /// Tables present
    pub fn tables(&self) -> impl Iterator<Item = FrsTable> + '_ {
        self.tables.keys().copied()
    }
}
