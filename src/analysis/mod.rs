//! Exploratory analysis
//!
//! Read-only diagnostics that describe a frame visually:
//! - Univariate distributions (histogram, category counts)
//! - Bivariate relationships (scatter, box plot per category)
//! - Multivariate structure (correlation heatmap, pairwise grid)
//! - Missing-value overview (per-column counts, missing-cell heatmap)
//!
//! Strategies build [`Chart`] values and hand them to a [`ChartRenderer`].
//! Charts are display-only; nothing is written to disk.

mod bivariate;
mod missing_values;
mod multivariate;
mod render;
mod univariate;

pub use bivariate::{
    BivariateAnalysisStrategy, BivariateAnalyzer, CategoricalVsNumericalAnalysis,
    NumericalVsNumericalAnalysis,
};
pub use missing_values::{MissingValuesAnalysis, SimpleMissingValuesAnalysis};
pub use multivariate::{correlation_matrix, MultivariateAnalysis, SimpleMultivariateAnalysis};
pub use render::TerminalRenderer;
pub use univariate::{
    CategoricalUnivariateAnalysis, NumericalUnivariateAnalysis, UnivariateAnalysisStrategy,
    UnivariateAnalyzer,
};

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One histogram bin covering `[lower, upper)` (the last bin is closed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary of one category in a box plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub label: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

impl BoxStats {
    /// Five-number summary of `values`, quartiles linearly interpolated
    pub(crate) fn from_values(label: String, values: Vec<f64>) -> Result<Self> {
        let ca = Float64Chunked::from_vec("values".into(), values);
        let quantile = |q: f64| -> Result<f64> {
            Ok(ca.quantile(q, QuantileMethod::Linear)?.unwrap_or(f64::NAN))
        };
        Ok(Self {
            label,
            min: ca.min().unwrap_or(f64::NAN),
            q1: quantile(0.25)?,
            median: quantile(0.5)?,
            q3: quantile(0.75)?,
            max: ca.max().unwrap_or(f64::NAN),
            count: ca.len(),
        })
    }
}

/// Renderable chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Chart {
    /// Frequency distribution of a numeric feature
    Histogram {
        title: String,
        x_label: String,
        bins: Vec<HistogramBin>,
    },
    /// Count per category
    Bar {
        title: String,
        x_label: String,
        bars: Vec<(String, usize)>,
    },
    /// Point cloud of two numeric features
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// Distribution of a numeric feature per category
    BoxPlot {
        title: String,
        x_label: String,
        y_label: String,
        boxes: Vec<BoxStats>,
    },
    /// Matrix of values; `NaN` cells are undefined
    Heatmap {
        title: String,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        values: Vec<Vec<f64>>,
        annotate: bool,
    },
    /// Key/value listing
    Table {
        title: String,
        rows: Vec<(String, String)>,
    },
    /// Several charts shown together
    Grid { title: String, charts: Vec<Chart> },
}

impl Chart {
    /// Chart title
    pub fn title(&self) -> &str {
        match self {
            Chart::Histogram { title, .. }
            | Chart::Bar { title, .. }
            | Chart::Scatter { title, .. }
            | Chart::BoxPlot { title, .. }
            | Chart::Heatmap { title, .. }
            | Chart::Table { title, .. }
            | Chart::Grid { title, .. } => title,
        }
    }
}

/// Displays charts
pub trait ChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()>;
}

/// Collects charts instead of drawing them
impl ChartRenderer for Vec<Chart> {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        self.push(chart.clone());
        Ok(())
    }
}

/// Equal-width histogram over finite values
pub(crate) fn histogram(values: &[f64], n_bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || n_bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == n_bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}
