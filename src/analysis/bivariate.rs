//! Relationships between two features

use super::{BoxStats, Chart, ChartRenderer};
use crate::error::Result;
use crate::strategy::Strategy;
use crate::utils::{column_as_f64, is_numeric_dtype, require_column, require_numeric};
use polars::prelude::*;
use tracing::{info, Span};

/// Trait for bivariate analysis strategies
pub trait BivariateAnalysisStrategy: Strategy {
    /// Render the relationship between `feature1` (x) and `feature2` (y)
    fn analyze(
        &self,
        df: &DataFrame,
        feature1: &str,
        feature2: &str,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<()>;
}

/// Scatter plot of two numeric features
#[derive(Debug, Clone, Default)]
pub struct NumericalVsNumericalAnalysis;

impl NumericalVsNumericalAnalysis {
    /// Rows where both values are present
    pub fn chart(&self, df: &DataFrame, feature1: &str, feature2: &str) -> Result<Chart> {
        let x = column_as_f64(require_numeric(df, feature1)?)?;
        let y = column_as_f64(require_numeric(df, feature2)?)?;
        let points = x
            .into_iter()
            .zip(y.into_iter())
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect();

        Ok(Chart::Scatter {
            title: format!("{} vs {}", feature1, feature2),
            x_label: feature1.to_string(),
            y_label: feature2.to_string(),
            points,
        })
    }
}

impl Strategy for NumericalVsNumericalAnalysis {
    fn name(&self) -> &'static str {
        "numerical_vs_numerical"
    }
}

impl BivariateAnalysisStrategy for NumericalVsNumericalAnalysis {
    fn analyze(
        &self,
        df: &DataFrame,
        feature1: &str,
        feature2: &str,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<()> {
        renderer.render(&self.chart(df, feature1, feature2)?)
    }
}

/// Box plot of a numeric feature for each category of another feature.
///
/// The category feature may have any dtype. Numeric categories (e.g. an
/// ordinal quality score) are ordered by value, text categories by first
/// appearance.
#[derive(Debug, Clone, Default)]
pub struct CategoricalVsNumericalAnalysis;

impl CategoricalVsNumericalAnalysis {
    pub fn chart(&self, df: &DataFrame, feature1: &str, feature2: &str) -> Result<Chart> {
        let category_col = require_column(df, feature1)?;
        let values = column_as_f64(require_numeric(df, feature2)?)?;

        let numeric_categories = is_numeric_dtype(category_col.dtype());
        let sort_keys = if numeric_categories {
            Some(column_as_f64(category_col)?)
        } else {
            None
        };
        let labels = category_col.as_materialized_series().cast(&DataType::String)?;
        let labels = labels.str()?;

        // (label, sort key, values) in first-appearance order
        let mut groups: Vec<(String, f64, Vec<f64>)> = Vec::new();
        for (i, (label, value)) in labels.into_iter().zip(values.into_iter()).enumerate() {
            let (Some(label), Some(value)) = (label, value) else {
                continue;
            };
            match groups.iter_mut().find(|(l, _, _)| l == label) {
                Some((_, _, vals)) => vals.push(value),
                None => {
                    let key = sort_keys
                        .as_ref()
                        .and_then(|k| k.get(i))
                        .unwrap_or(groups.len() as f64);
                    groups.push((label.to_string(), key, vec![value]));
                }
            }
        }
        if numeric_categories {
            groups.sort_by(|a, b| a.1.total_cmp(&b.1));
        }

        let boxes = groups
            .into_iter()
            .map(|(label, _, vals)| BoxStats::from_values(label, vals))
            .collect::<Result<_>>()?;

        Ok(Chart::BoxPlot {
            title: format!("{} vs {}", feature1, feature2),
            x_label: feature1.to_string(),
            y_label: feature2.to_string(),
            boxes,
        })
    }
}

impl Strategy for CategoricalVsNumericalAnalysis {
    fn name(&self) -> &'static str {
        "categorical_vs_numerical"
    }
}

impl BivariateAnalysisStrategy for CategoricalVsNumericalAnalysis {
    fn analyze(
        &self,
        df: &DataFrame,
        feature1: &str,
        feature2: &str,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<()> {
        renderer.render(&self.chart(df, feature1, feature2)?)
    }
}

/// Context holding the active bivariate strategy
pub struct BivariateAnalyzer {
    strategy: Box<dyn BivariateAnalysisStrategy>,
    span: Span,
}

impl BivariateAnalyzer {
    pub fn new<S: BivariateAnalysisStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("bivariate_analysis"))
    }

    pub fn with_span<S: BivariateAnalysisStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            strategy: Box::new(strategy),
            span,
        })
    }

    pub fn set_strategy<S: BivariateAnalysisStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching bivariate strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn execute_strategy(
        &self,
        df: &DataFrame,
        feature1: &str,
        feature2: &str,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<()> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), feature1, feature2, "Analyzing feature pair");
        self.strategy.analyze(df, feature1, feature2, renderer)
    }
}
