//! Column access helpers over polars frames

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

/// Check if dtype is numeric
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if dtype holds text (categorical in the analysis sense)
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

/// Look up a column, mapping absence to `InvalidColumn`
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| PipelineError::InvalidColumn(name.to_string()))
}

/// Look up a column that must be numeric
pub fn require_numeric<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    let column = require_column(df, name)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(PipelineError::TypeMismatch(format!(
            "column '{}' has dtype {}, expected a numeric column",
            name,
            column.dtype()
        )));
    }
    Ok(column)
}

/// Cast a numeric column to `Float64`, keeping nulls
pub fn column_as_f64(column: &Column) -> Result<Float64Chunked> {
    if !is_numeric_dtype(column.dtype()) {
        return Err(PipelineError::TypeMismatch(format!(
            "column '{}' has dtype {}, expected a numeric column",
            column.name(),
            column.dtype()
        )));
    }
    let casted = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(casted.f64()?.clone())
}

/// Names of all numeric columns, in frame order
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Extract named numeric columns into a row-major `Array2<f64>`.
/// Nulls are rejected: the model stages expect cleaned input.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = require_column(df, col_name)?;
            let ca = column_as_f64(column)?;
            if ca.null_count() > 0 {
                return Err(PipelineError::invalid_parameter(
                    col_name,
                    format!("{} missing values", ca.null_count()),
                    "missing values must be handled before model fitting",
                ));
            }
            Ok(ca.into_no_null_iter().collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Most frequent value of a sequence, ignoring `None`.
///
/// Ties go to the value whose first occurrence comes earliest.
/// Returns the value with its count, or `None` if every entry is missing.
pub fn most_frequent<T, I>(values: I) -> Option<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<T>>,
{
    // value -> (count, first position)
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (pos, value) in values.into_iter().enumerate() {
        if let Some(v) = value {
            counts.entry(v).or_insert((0, pos)).0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(value, (count, _))| (value, count))
}
