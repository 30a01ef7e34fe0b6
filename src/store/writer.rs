//! Writing variable sets to a single-row Parquet file

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, FixedSizeBinaryArray, Float64Array, Int64Array, ListArray,
};
use arrow::buffer::{Buffer, OffsetBuffer};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use crate::error::util::safe_create_file;
use crate::error::{FrsError, Result};
use crate::models::{Variable, VariableSet, VariableValues};
use crate::store::{DATASET_KEY, ENTITY_KEY, KIND_KEY, YEAR_KEY, variable_key};
use crate::utils::logging::StepTimer;

/// Name of the list item field of every column
pub(crate) const ITEM_FIELD: &str = "item";

/// Fixed-width, zero-padded bytes of a set of labels
///
/// The width is the longest label, at least one byte.
pub fn encode_labels(labels: &[String]) -> Result<FixedSizeBinaryArray> {
    let width = labels.iter().map(String::len).max().unwrap_or(0).max(1);
    let mut bytes = Vec::with_capacity(width * labels.len());
    for label in labels {
        bytes.extend_from_slice(label.as_bytes());
        bytes.resize(bytes.len() + width - label.len(), 0);
    }
    let width = i32::try_from(width)
        .map_err(|_| FrsError::Store(format!("Label width {width} is too large")))?;
    Ok(FixedSizeBinaryArray::try_new(
        width,
        Buffer::from_vec(bytes),
        None,
    )?)
}

fn column_for(variable: &Variable, year: i32) -> Result<(Field, ArrayRef)> {
    let values: ArrayRef = match &variable.values {
        VariableValues::Float(v) => Arc::new(Float64Array::from(v.clone())),
        VariableValues::Int(v) => Arc::new(Int64Array::from(v.clone())),
        VariableValues::Bool(v) => Arc::new(BooleanArray::from(v.clone())),
        VariableValues::Category(v) => Arc::new(encode_labels(v)?),
    };

    let item = Arc::new(Field::new(ITEM_FIELD, values.data_type().clone(), false));
    let list = ListArray::try_new(
        item.clone(),
        OffsetBuffer::from_lengths([values.len()]),
        values,
        None,
    )?;

    let metadata = HashMap::from([
        (ENTITY_KEY.to_string(), variable.entity.key().to_string()),
        (KIND_KEY.to_string(), variable.values.kind().to_string()),
    ]);
    let field = Field::new(variable_key(&variable.name, year), DataType::List(item), false)
        .with_metadata(metadata);
    Ok((field, Arc::new(list)))
}

/// Write a variable set, replacing any existing file
///
/// Every variable becomes one column named `<variable>/<year>` holding a
/// single list. The dataset name and year are stored as file metadata.
///
/// # Arguments
/// * `path` - Destination file
/// * `dataset` - Dataset name recorded in the file
/// * `set` - Variables to write
pub fn write_store(path: &Path, dataset: &str, set: &VariableSet) -> Result<()> {
    let timer = StepTimer::start(format!("writing {dataset} {}", set.year()), path);

    let mut fields = Vec::with_capacity(set.len());
    let mut columns = Vec::with_capacity(set.len());
    for variable in set.iter() {
        let (field, column) = column_for(variable, set.year())?;
        fields.push(field);
        columns.push(column);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = if columns.is_empty() {
        RecordBatch::new_empty(schema.clone())
    } else {
        RecordBatch::try_new(schema.clone(), columns)?
    };

    let properties = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue::new(DATASET_KEY.to_string(), dataset.to_string()),
            KeyValue::new(YEAR_KEY.to_string(), set.year().to_string()),
        ]))
        .build();

    let file = safe_create_file(path, "writing dataset")?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(properties))?;
    writer.write(&batch)?;
    writer.close()?;

    timer.finish(set.len(), "variables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_labels_are_zero_padded_to_longest() {
        let labels = vec!["LONDON".to_string(), "WALES".to_string()];
        let encoded = encode_labels(&labels).unwrap();
        assert_eq!(encoded.value_length(), 6);
        assert_eq!(encoded.value(0), b"LONDON");
        assert_eq!(encoded.value(1), b"WALES\0");
    }

    #[test]
    fn test_empty_labels_encode() {
        let encoded = encode_labels(&[]).unwrap();
        assert_eq!(encoded.len(), 0);
        assert_eq!(encoded.value_length(), 1);
    }
}
