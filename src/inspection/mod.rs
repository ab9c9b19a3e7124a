//! Data inspection
//!
//! Read-only diagnostics over a frame: column types with non-null counts, and
//! descriptive statistics for numeric and text columns. Inspection is
//! advisory; it never transforms data or gates the pipeline.

mod stats;

pub use stats::{CategoricalSummary, NumericSummary};

use crate::error::Result;
use crate::strategy::Strategy;
use crate::utils::{is_numeric_dtype, is_text_dtype};
use polars::prelude::*;
use std::io::Write;
use tracing::{info, Span};

/// Trait for inspection strategies
pub trait DataInspectionStrategy: Strategy {
    /// Write a human-readable report about `df` to `out`
    fn inspect(&self, df: &DataFrame, out: &mut dyn Write) -> Result<()>;
}

/// Column names, dtypes and non-null counts
#[derive(Debug, Clone, Default)]
pub struct DataTypesInspection;

impl Strategy for DataTypesInspection {
    fn name(&self) -> &'static str {
        "data_types"
    }
}

impl DataInspectionStrategy for DataTypesInspection {
    fn inspect(&self, df: &DataFrame, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "<DataFrame: {} rows x {} columns>", df.height(), df.width())?;
        writeln!(out, "{:>4}  {:<24} {:>16}  {}", "#", "Column", "Non-Null Count", "Dtype")?;
        for (i, column) in df.get_columns().iter().enumerate() {
            let non_null = column.len() - column.null_count();
            writeln!(
                out,
                "{:>4}  {:<24} {:>7} non-null  {}",
                i,
                column.name().as_str(),
                non_null,
                column.dtype()
            )?;
        }
        Ok(())
    }
}

/// Descriptive statistics for numeric and text columns
#[derive(Debug, Clone, Default)]
pub struct SummaryStatisticsInspection;

fn fmt_stat(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "NaN".to_string())
}

impl Strategy for SummaryStatisticsInspection {
    fn name(&self) -> &'static str {
        "summary_statistics"
    }
}

impl DataInspectionStrategy for SummaryStatisticsInspection {
    fn inspect(&self, df: &DataFrame, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "\nSummary Statistics (Numerical Features):")?;
        writeln!(
            out,
            "{:<24} {:>8} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for column in df.get_columns().iter().filter(|c| is_numeric_dtype(c.dtype())) {
            let s = NumericSummary::from_column(column)?;
            writeln!(
                out,
                "{:<24} {:>8} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
                s.name,
                s.count,
                fmt_stat(s.mean),
                fmt_stat(s.std),
                fmt_stat(s.min),
                fmt_stat(s.q1),
                fmt_stat(s.median),
                fmt_stat(s.q3),
                fmt_stat(s.max),
            )?;
        }

        writeln!(out, "\nSummary Statistics (Categorical Features):")?;
        writeln!(out, "{:<24} {:>8} {:>8} {:<20} {:>8}", "", "count", "unique", "top", "freq")?;
        for column in df.get_columns().iter().filter(|c| is_text_dtype(c.dtype())) {
            let s = CategoricalSummary::from_column(column)?;
            writeln!(
                out,
                "{:<24} {:>8} {:>8} {:<20} {:>8}",
                s.name,
                s.count,
                s.unique,
                s.top.as_deref().unwrap_or("NaN"),
                s.freq
            )?;
        }
        Ok(())
    }
}

/// Context holding the active inspection strategy
pub struct DataInspector {
    strategy: Box<dyn DataInspectionStrategy>,
    span: Span,
}

impl DataInspector {
    /// Create an inspector with an initial strategy
    pub fn new<S: DataInspectionStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("data_inspection"))
    }

    /// Create an inspector logging under `span`
    pub fn with_span<S: DataInspectionStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            strategy: Box::new(strategy),
            span,
        })
    }

    /// Replace the active strategy
    pub fn set_strategy<S: DataInspectionStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching inspection strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    /// Name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Run the active strategy, printing to stdout
    pub fn execute_strategy(&self, df: &DataFrame) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.execute_strategy_to(df, &mut handle)
    }

    /// Run the active strategy, writing to `out`
    pub fn execute_strategy_to(&self, df: &DataFrame, out: &mut dyn Write) -> Result<()> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), "Inspecting data");
        self.strategy.inspect(df, out)
    }
}
