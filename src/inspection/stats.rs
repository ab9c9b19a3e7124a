//! Descriptive statistics for a single column

use crate::error::Result;
use crate::utils::{column_as_f64, most_frequent};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Numeric column summary (the numeric half of a `describe`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Compute statistics from a numeric column, ignoring nulls
    pub fn from_column(column: &Column) -> Result<Self> {
        let ca = column_as_f64(column)?;
        Ok(Self {
            name: column.name().to_string(),
            count: ca.len() - ca.null_count(),
            mean: ca.mean(),
            std: ca.std(1),
            min: ca.min(),
            q1: ca.quantile(0.25, QuantileMethod::Linear)?,
            median: ca.median(),
            q3: ca.quantile(0.75, QuantileMethod::Linear)?,
            max: ca.max(),
        })
    }
}

/// Text column summary (the categorical half of a `describe`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub name: String,
    pub count: usize,
    pub unique: usize,
    /// Most frequent value; ties go to the first one encountered
    pub top: Option<String>,
    pub freq: usize,
}

impl CategoricalSummary {
    /// Compute statistics from any column, treating values as text
    pub fn from_column(column: &Column) -> Result<Self> {
        let as_text = column.as_materialized_series().cast(&DataType::String)?;
        let ca = as_text.str()?;

        let mut distinct = std::collections::HashSet::new();
        for v in ca.into_iter().flatten() {
            distinct.insert(v);
        }
        let (top, freq) = match most_frequent(ca.into_iter()) {
            Some((value, count)) => (Some(value.to_string()), count),
            None => (None, 0),
        };

        Ok(Self {
            name: column.name().to_string(),
            count: ca.len() - ca.null_count(),
            unique: distinct.len(),
            top,
            freq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_summary() {
        let column = Column::new("price".into(), &[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        let summary = NumericSummary::from_column(&column).unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.mean.unwrap() - 2.5).abs() < 1e-12);
        assert!((summary.median.unwrap() - 2.5).abs() < 1e-12);
        assert!((summary.q1.unwrap() - 1.75).abs() < 1e-12);
        assert!((summary.q3.unwrap() - 3.25).abs() < 1e-12);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(4.0));
    }

    #[test]
    fn test_categorical_summary() {
        let column = Column::new("zone".into(), &[Some("RM"), Some("RL"), Some("RL"), None, Some("RM")]);
        let summary = CategoricalSummary::from_column(&column).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.unique, 2);
        assert_eq!(summary.top.as_deref(), Some("RM"));
        assert_eq!(summary.freq, 2);
    }
}
