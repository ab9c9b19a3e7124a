//! Missing-value overview

use super::{Chart, ChartRenderer};
use crate::error::Result;
use polars::prelude::*;
use tracing::info;

/// Maximum number of row bands in the missing-cell heatmap
const MAX_ROW_BANDS: usize = 40;

/// Two-step template: identify, then visualize
pub trait MissingValuesAnalysis {
    /// Run both steps in order and return the per-column missing counts
    fn analyze(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<Vec<(String, usize)>> {
        let counts = self.identify_missing_values(df, renderer)?;
        self.visualize_missing_values(df, renderer)?;
        Ok(counts)
    }

    /// Report columns with at least one missing value
    fn identify_missing_values(
        &self,
        df: &DataFrame,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<Vec<(String, usize)>>;

    fn visualize_missing_values(&self, _df: &DataFrame, _renderer: &mut dyn ChartRenderer) -> Result<()> {
        Ok(())
    }
}

/// Count table plus a heatmap of missing cells
#[derive(Debug, Clone, Default)]
pub struct SimpleMissingValuesAnalysis;

impl SimpleMissingValuesAnalysis {
    /// Missing fraction per (row band, column).
    ///
    /// Rows are grouped into at most 40 contiguous bands so large frames fit
    /// on screen. A frame with 40 rows or fewer keeps one band per row.
    pub fn missing_matrix(&self, df: &DataFrame) -> (Vec<String>, Vec<Vec<f64>>) {
        let height = df.height();
        let n_bands = height.min(MAX_ROW_BANDS);
        let mut labels = Vec::with_capacity(n_bands);
        let mut values = Vec::with_capacity(n_bands);
        if n_bands == 0 {
            return (labels, values);
        }

        let masks: Vec<BooleanChunked> = df
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series().is_null())
            .collect();

        for band in 0..n_bands {
            let start = band * height / n_bands;
            let end = (band + 1) * height / n_bands;
            labels.push(if end - start == 1 {
                start.to_string()
            } else {
                format!("{}-{}", start, end - 1)
            });
            let row: Vec<f64> = masks
                .iter()
                .map(|mask| {
                    let missing = (start..end).filter(|&i| mask.get(i) == Some(true)).count();
                    missing as f64 / (end - start) as f64
                })
                .collect();
            values.push(row);
        }
        (labels, values)
    }
}

impl MissingValuesAnalysis for SimpleMissingValuesAnalysis {
    fn identify_missing_values(
        &self,
        df: &DataFrame,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<Vec<(String, usize)>> {
        let counts: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        info!(columns_with_missing = counts.len(), "Identified missing values");

        renderer.render(&Chart::Table {
            title: "Missing Values Count by Column".to_string(),
            rows: counts
                .iter()
                .map(|(name, n)| (name.clone(), n.to_string()))
                .collect(),
        })?;
        Ok(counts)
    }

    fn visualize_missing_values(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()> {
        let (row_labels, values) = self.missing_matrix(df);
        renderer.render(&Chart::Heatmap {
            title: "Missing Values Heatmap".to_string(),
            row_labels,
            col_labels: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            values,
            annotate: false,
        })
    }
}
