//! Reading variables back from a store file

use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::util::safe_open_file;
use crate::error::{FrsError, Result};
use crate::models::{Entity, Variable, VariableSet, VariableValues};
use crate::store::{DATASET_KEY, ENTITY_KEY, YEAR_KEY, split_key, variable_key};
use crate::utils::logging::StepTimer;

/// Decode zero-padded labels
pub fn decode_labels(array: &ArrayRef) -> Result<Vec<String>> {
    let binary = array
        .as_fixed_size_binary_opt()
        .ok_or_else(|| FrsError::Store("Labels are not fixed-width bytes".to_string()))?;
    (0..binary.len())
        .map(|i| {
            let bytes = binary.value(i);
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
            String::from_utf8(bytes[..end].to_vec())
                .map_err(|e| FrsError::Store(format!("Label is not UTF-8: {e}")))
        })
        .collect()
}

/// An opened store file
#[derive(Debug, Clone)]
pub struct StoreReader {
    path: PathBuf,
    dataset: Option<String>,
    year: Option<i32>,
    batch: RecordBatch,
}

impl StoreReader {
    /// Open and read a store file
    pub fn open(path: &Path) -> Result<Self> {
        let timer = StepTimer::start("opening dataset", path);

        let file = safe_open_file(path, "reading dataset")?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let mut dataset = None;
        let mut year = None;
        if let Some(pairs) = builder.metadata().file_metadata().key_value_metadata() {
            for pair in pairs {
                match (pair.key.as_str(), pair.value.as_deref()) {
                    (DATASET_KEY, Some(value)) => dataset = Some(value.to_string()),
                    (YEAR_KEY, Some(value)) => year = value.parse::<i32>().ok(),
                    _ => {}
                }
            }
        }

        let schema = builder.schema().clone();
        let batches = builder
            .build()?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let batch = arrow::compute::concat_batches(&schema, &batches)?;
        if batch.num_columns() > 0 && batch.num_rows() != 1 {
            return Err(FrsError::Store(format!(
                "Expected a single row in {}, found {}",
                path.display(),
                batch.num_rows()
            )));
        }

        timer.finish(batch.num_columns(), "variables");
        Ok(Self {
            path: path.to_path_buf(),
            dataset,
            year,
            batch,
        })
    }

    /// Path of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dataset name recorded in the file
    #[must_use]
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Year recorded in the file
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// All `<variable>/<year>` keys, in file order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Distinct years among the keys, ascending
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .keys()
            .iter()
            .filter_map(|key| split_key(key).map(|(_, year)| year))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Whether a variable is stored for a year
    #[must_use]
    pub fn contains(&self, name: &str, year: i32) -> bool {
        self.batch.schema().index_of(&variable_key(name, year)).is_ok()
    }

    /// Read one variable
    pub fn get(&self, name: &str, year: i32) -> Result<Variable> {
        let key = variable_key(name, year);
        let schema = self.batch.schema();
        let index = schema
            .index_of(&key)
            .map_err(|_| FrsError::Store(format!("No variable {key} in {}", self.path.display())))?;
        decode_column(name, schema.field(index), self.batch.column(index))
    }

    /// Read every variable stored for a year, in file order
    pub fn load(&self, year: i32) -> Result<VariableSet> {
        let mut set = VariableSet::new(year);
        let schema = self.batch.schema();
        for (field, column) in schema.fields().iter().zip(self.batch.columns()) {
            match split_key(field.name()) {
                Some((name, key_year)) if key_year == year => {
                    let variable = decode_column(name, field, column)?;
                    set.insert(variable.name, variable.entity, variable.values)?;
                }
                _ => {}
            }
        }
        Ok(set)
    }
}

fn decode_column(name: &str, field: &Field, column: &ArrayRef) -> Result<Variable> {
    let entity = field
        .metadata()
        .get(ENTITY_KEY)
        .and_then(|key| Entity::from_key(key))
        .ok_or_else(|| FrsError::Store(format!("Variable {name} has no entity")))?;

    let list = column
        .as_list_opt::<i32>()
        .ok_or_else(|| FrsError::Store(format!("Variable {name} is not stored as a list")))?;
    if list.is_empty() {
        return Err(FrsError::Store(format!("Variable {name} has no values")));
    }
    let values = list.value(0);

    let values = match values.data_type() {
        DataType::Float64 => {
            VariableValues::Float(values.as_primitive::<Float64Type>().values().to_vec())
        }
        DataType::Int64 => {
            VariableValues::Int(values.as_primitive::<Int64Type>().values().to_vec())
        }
        DataType::Boolean => VariableValues::Bool(
            values
                .as_boolean()
                .iter()
                .map(|v| v.unwrap_or(false))
                .collect(),
        ),
        DataType::FixedSizeBinary(_) => VariableValues::Category(decode_labels(&values)?),
        other => {
            return Err(FrsError::Store(format!(
                "Variable {name} has unsupported type {other:?}"
            )));
        }
    };

    Ok(Variable {
        name: name.to_string(),
        entity,
        values,
    })
}
