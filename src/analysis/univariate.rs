//! Single-feature distributions

use super::{histogram, Chart, ChartRenderer};
use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::utils::{column_as_f64, require_column, require_numeric};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{info, Span};

/// Trait for univariate analysis strategies
pub trait UnivariateAnalysisStrategy: Strategy {
    /// Render the distribution of `feature`
    fn analyze(&self, df: &DataFrame, feature: &str, renderer: &mut dyn ChartRenderer) -> Result<()>;
}

/// Histogram of a numeric feature
#[derive(Debug, Clone)]
pub struct NumericalUnivariateAnalysis {
    bins: usize,
}

impl Default for NumericalUnivariateAnalysis {
    fn default() -> Self {
        Self { bins: 30 }
    }
}

impl NumericalUnivariateAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of histogram bins
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Build the histogram chart without rendering it
    pub fn chart(&self, df: &DataFrame, feature: &str) -> Result<Chart> {
        let column = require_numeric(df, feature)?;
        let values: Vec<f64> = column_as_f64(column)?.into_iter().flatten().collect();
        Ok(Chart::Histogram {
            title: format!("Distribution of {}", feature),
            x_label: feature.to_string(),
            bins: histogram(&values, self.bins),
        })
    }
}

impl Strategy for NumericalUnivariateAnalysis {
    fn name(&self) -> &'static str {
        "numerical_univariate"
    }

    fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(PipelineError::invalid_parameter("bins", 0, "must be positive"));
        }
        Ok(())
    }
}

impl UnivariateAnalysisStrategy for NumericalUnivariateAnalysis {
    fn analyze(&self, df: &DataFrame, feature: &str, renderer: &mut dyn ChartRenderer) -> Result<()> {
        renderer.render(&self.chart(df, feature)?)
    }
}

/// Count of each category of a feature
#[derive(Debug, Clone, Default)]
pub struct CategoricalUnivariateAnalysis;

impl CategoricalUnivariateAnalysis {
    /// Build the count chart without rendering it.
    /// Bars are ordered by descending count, ties by first appearance.
    pub fn chart(&self, df: &DataFrame, feature: &str) -> Result<Chart> {
        let column = require_column(df, feature)?;
        let as_text = column.as_materialized_series().cast(&DataType::String)?;

        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in as_text.str()?.into_iter().flatten() {
            match counts.get_mut(value) {
                Some(count) => *count += 1,
                None => {
                    order.push(value.to_string());
                    counts.insert(value.to_string(), 1);
                }
            }
        }

        let mut bars: Vec<(String, usize)> = order
            .into_iter()
            .map(|label| {
                let count = counts[&label];
                (label, count)
            })
            .collect();
        // Stable sort keeps first-appearance order among equal counts
        bars.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(Chart::Bar {
            title: format!("Distribution of {}", feature),
            x_label: feature.to_string(),
            bars,
        })
    }
}

impl Strategy for CategoricalUnivariateAnalysis {
    fn name(&self) -> &'static str {
        "categorical_univariate"
    }
}

impl UnivariateAnalysisStrategy for CategoricalUnivariateAnalysis {
    fn analyze(&self, df: &DataFrame, feature: &str, renderer: &mut dyn ChartRenderer) -> Result<()> {
        renderer.render(&self.chart(df, feature)?)
    }
}

/// Context holding the active univariate strategy
pub struct UnivariateAnalyzer {
    strategy: Box<dyn UnivariateAnalysisStrategy>,
    span: Span,
}

impl UnivariateAnalyzer {
    pub fn new<S: UnivariateAnalysisStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("univariate_analysis"))
    }

    pub fn with_span<S: UnivariateAnalysisStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            strategy: Box::new(strategy),
            span,
        })
    }

    pub fn set_strategy<S: UnivariateAnalysisStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching univariate strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn execute_strategy(
        &self,
        df: &DataFrame,
        feature: &str,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<()> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), feature, "Analyzing feature");
        self.strategy.analyze(df, feature, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "SalePrice" => &[Some(100.0), Some(200.0), None, Some(300.0), Some(400.0)],
            "Neighborhood" => &["NAmes", "CollgCr", "NAmes", "OldTown", "CollgCr"],
        )
        .unwrap()
    }

    #[test]
    fn test_numerical_histogram() {
        let analyzer = UnivariateAnalyzer::new(NumericalUnivariateAnalysis::new().with_bins(4)).unwrap();
        let mut charts: Vec<Chart> = Vec::new();
        analyzer.execute_strategy(&sample_df(), "SalePrice", &mut charts).unwrap();

        match &charts[0] {
            Chart::Histogram { bins, title, .. } => {
                assert_eq!(title, "Distribution of SalePrice");
                assert_eq!(bins.len(), 4);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
            }
            other => panic!("unexpected chart: {:?}", other),
        }
    }

    #[test]
    fn test_categorical_counts_sorted() {
        let chart = CategoricalUnivariateAnalysis.chart(&sample_df(), "Neighborhood").unwrap();
        match chart {
            Chart::Bar { bars, .. } => {
                assert_eq!(
                    bars,
                    vec![
                        ("NAmes".to_string(), 2),
                        ("CollgCr".to_string(), 2),
                        ("OldTown".to_string(), 1)
                    ]
                );
            }
            other => panic!("unexpected chart: {:?}", other),
        }
    }

    #[test]
    fn test_numerical_on_text_column() {
        let analyzer = UnivariateAnalyzer::new(NumericalUnivariateAnalysis::new()).unwrap();
        let mut charts: Vec<Chart> = Vec::new();
        let err = analyzer
            .execute_strategy(&sample_df(), "Neighborhood", &mut charts)
            .unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch(_)));
    }

    #[test]
    fn test_zero_bins_rejected() {
        let mut analyzer = UnivariateAnalyzer::new(CategoricalUnivariateAnalysis).unwrap();
        assert!(analyzer
            .set_strategy(NumericalUnivariateAnalysis::new().with_bins(0))
            .is_err());
    }
}
