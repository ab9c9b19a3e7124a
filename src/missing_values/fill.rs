//! Fill strategies

use super::MissingValueStrategy;
use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::utils::{column_as_f64, is_numeric_dtype, is_text_dtype, most_frequent};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Constant used by [`FillMethod::Constant`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Number(n) => write!(f, "{}", n),
            FillValue::Text(s) => f.write_str(s),
        }
    }
}

/// How nulls are replaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    /// Column mean (numeric columns only)
    Mean,
    /// Column median (numeric columns only)
    Median,
    /// Most frequent value (every column)
    Mode,
    /// Fixed value (every column)
    Constant(FillValue),
}

impl FromStr for FillMethod {
    type Err = PipelineError;

    /// Accepts `mean`, `median`, `mode` and `constant=<value>`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some((method, value)) = trimmed.split_once('=') {
            if method.trim().eq_ignore_ascii_case("constant") {
                let value = value.trim();
                let fill = match value.parse::<f64>() {
                    Ok(n) => FillValue::Number(n),
                    Err(_) => FillValue::Text(value.to_string()),
                };
                return Ok(FillMethod::Constant(fill));
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "mean" => Ok(FillMethod::Mean),
            "median" => Ok(FillMethod::Median),
            "mode" => Ok(FillMethod::Mode),
            "constant" => Err(PipelineError::invalid_parameter(
                "method",
                s,
                "constant fill needs a value, use constant=<value>",
            )),
            _ => Err(PipelineError::invalid_parameter(
                "method",
                s,
                "expected one of mean, median, mode, constant=<value>",
            )),
        }
    }
}

/// Replace nulls column by column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillMissingValues {
    pub method: FillMethod,
}

impl Default for FillMissingValues {
    fn default() -> Self {
        Self::new(FillMethod::Mean)
    }
}

impl FillMissingValues {
    pub fn new(method: FillMethod) -> Self {
        Self { method }
    }

    fn fill_column(&self, column: &Column) -> Result<Option<Series>> {
        if column.null_count() == 0 {
            return Ok(None);
        }
        let dtype = column.dtype();
        match &self.method {
            FillMethod::Mean | FillMethod::Median => {
                if !is_numeric_dtype(dtype) {
                    return Ok(None);
                }
                let ca = column_as_f64(column)?;
                let stat = if self.method == FillMethod::Mean {
                    ca.mean()
                } else {
                    ca.median()
                };
                Ok(stat.map(|v| fill_f64(&ca, v)))
            }
            FillMethod::Mode => fill_mode(column),
            FillMethod::Constant(FillValue::Number(v)) => {
                if is_numeric_dtype(dtype) {
                    Ok(Some(fill_f64(&column_as_f64(column)?, *v)))
                } else {
                    fill_text(column, &v.to_string()).map(Some)
                }
            }
            FillMethod::Constant(FillValue::Text(s)) => fill_text(column, s).map(Some),
        }
    }
}

fn fill_f64(ca: &Float64Chunked, value: f64) -> Series {
    let filled: Float64Chunked = ca
        .into_iter()
        .map(|opt| Some(opt.unwrap_or(value)))
        .collect();
    filled.with_name(ca.name().clone()).into_series()
}

/// Casts the column to text when needed, then fills
fn fill_text(column: &Column, value: &str) -> Result<Series> {
    let as_text = column.as_materialized_series().cast(&DataType::String)?;
    let filled: StringChunked = as_text
        .str()?
        .into_iter()
        .map(|opt| Some(opt.unwrap_or(value)))
        .collect();
    Ok(filled.with_name(column.name().clone()).into_series())
}

/// Most frequent value per column; the column keeps its dtype except text fills
fn fill_mode(column: &Column) -> Result<Option<Series>> {
    let dtype = column.dtype();
    let series = column.as_materialized_series();
    if is_numeric_dtype(dtype) {
        let ca = column_as_f64(column)?;
        let Some((bits, _)) = most_frequent(ca.into_iter().map(|v| v.map(f64::to_bits))) else {
            return Ok(None);
        };
        let filled = fill_f64(&ca, f64::from_bits(bits));
        return Ok(Some(filled.cast(dtype)?));
    }
    if is_text_dtype(dtype) {
        let ca = series.str()?;
        let Some((mode, _)) = most_frequent(ca.into_iter().map(|v| v.map(str::to_string))) else {
            return Ok(None);
        };
        return fill_text(column, &mode).map(Some);
    }
    if dtype == &DataType::Boolean {
        let ca = series.bool()?;
        let Some((mode, _)) = most_frequent(ca.into_iter()) else {
            return Ok(None);
        };
        let filled: BooleanChunked = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        return Ok(Some(filled.with_name(column.name().clone()).into_series()));
    }

    // dates, categoricals and the like go through their text form
    let Ok(as_text) = series.cast(&DataType::String) else {
        debug!(column = %column.name(), dtype = %dtype, "Mode fill skipped, column has no text form");
        return Ok(None);
    };
    let Some((mode, _)) = most_frequent(as_text.str()?.into_iter().map(|v| v.map(str::to_string)))
    else {
        return Ok(None);
    };
    Ok(Some(fill_text(column, &mode)?.cast(dtype)?))
}

impl Strategy for FillMissingValues {
    fn name(&self) -> &'static str {
        "fill_missing_values"
    }
}

impl MissingValueStrategy for FillMissingValues {
    fn handle(&self, df: &DataFrame) -> Result<DataFrame> {
        info!(method = ?self.method, "Filling missing values");
        let mut result = df.clone();
        let mut filled_columns = 0usize;
        for column in df.get_columns() {
            if let Some(series) = self.fill_column(column)? {
                result.with_column(series)?;
                filled_columns += 1;
            }
        }
        info!(filled_columns, "Missing values filled");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "LotFrontage" => &[Some(60.0), None, Some(80.0), Some(100.0)],
            "GarageCars" => &[Some(2i64), Some(1), None, Some(2)],
            "Alley" => &[Some("Grvl"), None, Some("Pave"), Some("Grvl")],
        )
        .unwrap()
    }

    #[test]
    fn test_mean_fill() {
        let out = FillMissingValues::new(FillMethod::Mean)
            .handle(&sample_df())
            .unwrap();
        let col = out.column("LotFrontage").unwrap().f64().unwrap();
        assert!((col.get(1).unwrap() - 80.0).abs() < 1e-12);
        // Integer column becomes Float64 with the mean of [2, 1, 2]
        let cars = out.column("GarageCars").unwrap().f64().unwrap();
        assert!((cars.get(2).unwrap() - 5.0 / 3.0).abs() < 1e-12);
        // Text column untouched
        assert_eq!(out.column("Alley").unwrap().null_count(), 1);
    }

    #[test]
    fn test_median_fill() {
        let out = FillMissingValues::new(FillMethod::Median)
            .handle(&sample_df())
            .unwrap();
        let col = out.column("LotFrontage").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(80.0));
    }

    #[test]
    fn test_mode_fill_keeps_dtype() {
        let out = FillMissingValues::new(FillMethod::Mode)
            .handle(&sample_df())
            .unwrap();
        let cars = out.column("GarageCars").unwrap().i64().unwrap();
        assert_eq!(cars.get(2), Some(2));
        let alley = out.column("Alley").unwrap().str().unwrap();
        assert_eq!(alley.get(1), Some("Grvl"));
    }

    #[test]
    fn test_mode_tie_takes_first_seen() {
        let df = df!("x" => &[Some(3.0), Some(1.0), None, Some(1.0), Some(3.0)]).unwrap();
        let out = FillMissingValues::new(FillMethod::Mode).handle(&df).unwrap();
        assert_eq!(out.column("x").unwrap().f64().unwrap().get(2), Some(3.0));
    }

    #[test]
    fn test_mode_fill_boolean_column() {
        let df = df!("Central Air" => &[Some(true), Some(true), None, Some(false)]).unwrap();
        let out = FillMissingValues::new(FillMethod::Mode).handle(&df).unwrap();
        let air = out.column("Central Air").unwrap();
        assert_eq!(air.dtype(), &DataType::Boolean);
        assert_eq!(air.null_count(), 0);
        assert_eq!(air.bool().unwrap().get(2), Some(true));
    }

    #[test]
    fn test_mode_fill_other_dtypes_round_trip() {
        let sold = Series::new("Yr Sold".into(), &[Some(2008i32), None, Some(2010), Some(2010)])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![sold.into()]).unwrap();
        let out = FillMissingValues::new(FillMethod::Mode).handle(&df).unwrap();
        let col = out.column("Yr Sold").unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
        assert_eq!(col.null_count(), 0);
        assert_eq!(
            col.as_materialized_series().cast(&DataType::Int32).unwrap().i32().unwrap().get(1),
            Some(2010)
        );
    }

    #[test]
    fn test_constant_fill() {
        let out = FillMissingValues::new(FillMethod::Constant(FillValue::Number(0.0)))
            .handle(&sample_df())
            .unwrap();
        assert_eq!(out.column("LotFrontage").unwrap().f64().unwrap().get(1), Some(0.0));
        assert_eq!(out.column("Alley").unwrap().str().unwrap().get(1), Some("0"));

        let out = FillMissingValues::new(FillMethod::Constant(FillValue::Text("None".into())))
            .handle(&sample_df())
            .unwrap();
        assert_eq!(out.column("Alley").unwrap().str().unwrap().get(1), Some("None"));
        assert_eq!(out.column("LotFrontage").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_all_null_column_stays() {
        let df = df!("x" => &[None::<f64>, None]).unwrap();
        let out = FillMissingValues::new(FillMethod::Mode).handle(&df).unwrap();
        assert_eq!(out.column("x").unwrap().null_count(), 2);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("mean".parse::<FillMethod>().unwrap(), FillMethod::Mean);
        assert_eq!(" Median ".parse::<FillMethod>().unwrap(), FillMethod::Median);
        assert_eq!(
            "constant=0".parse::<FillMethod>().unwrap(),
            FillMethod::Constant(FillValue::Number(0.0))
        );
        assert_eq!(
            "constant=NA".parse::<FillMethod>().unwrap(),
            FillMethod::Constant(FillValue::Text("NA".into()))
        );
        assert!(matches!(
            "interpolate".parse::<FillMethod>(),
            Err(PipelineError::InvalidParameter { .. })
        ));
        assert!("constant".parse::<FillMethod>().is_err());
    }

    #[test]
    fn test_method_json() {
        let method: FillMethod = serde_json::from_str(r#"{"constant":"NA"}"#).unwrap();
        assert_eq!(method, FillMethod::Constant(FillValue::Text("NA".into())));
        let method: FillMethod = serde_json::from_str(r#""median""#).unwrap();
        assert_eq!(method, FillMethod::Median);
    }
}
