//! Conversion of Arrow arrays to plain Rust vectors

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::kernels::cast::{CastOptions, cast, cast_with_options};
use arrow::datatypes::{DataType, Float64Type};

use crate::error::{FrsError, Result};

/// Whether an Arrow type converts losslessly enough to f64
#[must_use]
pub fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _)
    )
}

/// Convert an array to f64 values, with nulls as NaN
///
/// # Returns
/// * `Ok(Some(values))` - numeric data, or strings that all parse as numbers
/// * `Ok(None)` - string data that is not numeric
/// * `Err` - an array type that cannot be represented
pub fn array_to_f64(array: &ArrayRef) -> Result<Option<Vec<f64>>> {
    let data_type = array.data_type();

    let converted = match data_type {
        DataType::Null => return Ok(Some(vec![f64::NAN; array.len()])),
        DataType::Float64 => array.clone(),
        dt if is_numeric(dt) => cast(array, &DataType::Float64)?,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let trimmed = trim_strings(array)?;
            let options = CastOptions {
                safe: false,
                ..Default::default()
            };
            match cast_with_options(&trimmed, &DataType::Float64, &options) {
                Ok(converted) => converted,
                Err(_) => return Ok(None),
            }
        }
        other => {
            return Err(FrsError::Shape(format!(
                "Unsupported column type {other:?}"
            )));
        }
    };

    let values = converted
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| FrsError::Shape("Cast to Float64 produced another type".to_string()))?;

    Ok(Some(
        values.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
    ))
}

/// Convert an array to strings, with nulls as empty strings
pub fn array_to_strings(array: &ArrayRef) -> Result<Vec<String>> {
    let converted = cast(array, &DataType::Utf8)?;
    let strings = converted
        .as_string_opt::<i32>()
        .ok_or_else(|| FrsError::Shape("Cast to Utf8 produced another type".to_string()))?;

    Ok(strings
        .iter()
        .map(|v| v.map(str::to_string).unwrap_or_default())
        .collect())
}

/// Blank strings become nulls so they read as missing numbers
fn trim_strings(array: &ArrayRef) -> Result<ArrayRef> {
    let strings = array_to_strings(array)?;
    let trimmed: arrow::array::StringArray = strings
        .iter()
        .map(|s| {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s) }
        })
        .collect();
    Ok(std::sync::Arc::new(trimmed))
}
