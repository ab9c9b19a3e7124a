//! Correlation structure across all numeric features

use super::{histogram, Chart, ChartRenderer};
use crate::error::Result;
use crate::utils::{column_as_f64, numeric_column_names, require_column};
use ndarray::Array2;
use polars::prelude::cov::pearson_corr;
use polars::prelude::*;
use tracing::info;

/// Pearson correlation matrix of the numeric columns of `df`.
///
/// Each pair uses the rows where both values are present. Pairs with fewer
/// than two complete rows or zero variance are `NaN`.
pub fn correlation_matrix(df: &DataFrame) -> Result<(Vec<String>, Array2<f64>)> {
    let names = numeric_column_names(df);
    let columns: Vec<Float64Chunked> = names
        .iter()
        .map(|name| column_as_f64(require_column(df, name)?))
        .collect::<Result<_>>()?;

    let n = names.len();
    let mut corr = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        for j in i..n {
            let r = pairwise_pearson(&columns[i], &columns[j])?;
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    Ok((names, corr))
}

fn pairwise_pearson(a: &Float64Chunked, b: &Float64Chunked) -> Result<f64> {
    let complete = &a.is_not_null() & &b.is_not_null();
    let (a, b) = (a.filter(&complete)?, b.filter(&complete)?);
    if a.len() < 2 {
        return Ok(f64::NAN);
    }
    Ok(pearson_corr(&a, &b)
        .filter(|r| r.is_finite())
        .map_or(f64::NAN, |r| r.clamp(-1.0, 1.0)))
}

/// Two-step template: correlation heatmap, then pairwise grid
pub trait MultivariateAnalysis {
    /// Run both steps in order
    fn analyze(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()> {
        info!(columns = df.width(), "Running multivariate analysis");
        self.generate_correlation_heatmap(df, renderer)?;
        self.generate_pairplot(df, renderer)
    }

    fn generate_correlation_heatmap(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()>;

    fn generate_pairplot(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()>;
}

/// Annotated correlation heatmap and a scatter grid with histograms on the diagonal
#[derive(Debug, Clone)]
pub struct SimpleMultivariateAnalysis {
    diagonal_bins: usize,
}

impl Default for SimpleMultivariateAnalysis {
    fn default() -> Self {
        Self { diagonal_bins: 10 }
    }
}

impl SimpleMultivariateAnalysis {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MultivariateAnalysis for SimpleMultivariateAnalysis {
    fn generate_correlation_heatmap(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()> {
        let (names, corr) = correlation_matrix(df)?;
        let values = corr.rows().into_iter().map(|row| row.to_vec()).collect();
        renderer.render(&Chart::Heatmap {
            title: "Correlation Heatmap".to_string(),
            row_labels: names.clone(),
            col_labels: names,
            values,
            annotate: true,
        })
    }

    fn generate_pairplot(&self, df: &DataFrame, renderer: &mut dyn ChartRenderer) -> Result<()> {
        let names = numeric_column_names(df);
        let columns: Vec<Float64Chunked> = names
            .iter()
            .map(|name| column_as_f64(require_column(df, name)?))
            .collect::<Result<_>>()?;

        let mut charts = Vec::with_capacity(names.len() * names.len());
        for (i, y_name) in names.iter().enumerate() {
            for (j, x_name) in names.iter().enumerate() {
                if i == j {
                    let values: Vec<f64> = columns[i].iter().flatten().collect();
                    charts.push(Chart::Histogram {
                        title: x_name.clone(),
                        x_label: x_name.clone(),
                        bins: histogram(&values, self.diagonal_bins),
                    });
                } else {
                    let points = columns[j]
                        .iter()
                        .zip(columns[i].iter())
                        .filter_map(|(x, y)| Some((x?, y?)))
                        .collect();
                    charts.push(Chart::Scatter {
                        title: format!("{} vs {}", x_name, y_name),
                        x_label: x_name.clone(),
                        y_label: y_name.clone(),
                        points,
                    });
                }
            }
        }

        renderer.render(&Chart::Grid {
            title: "Pair plot of selected features".to_string(),
            charts,
        })
    }
}
