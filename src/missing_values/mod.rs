//! Missing-value handling
//!
//! Strategies either drop incomplete rows/columns or fill nulls. Every
//! strategy returns a new frame and leaves its input untouched.

mod fill;

pub use fill::{FillMethod, FillMissingValues, FillValue};

use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, Span};

/// Trait for missing-value strategies
pub trait MissingValueStrategy: Strategy {
    /// Produce a frame with missing values handled
    fn handle(&self, df: &DataFrame) -> Result<DataFrame>;
}

/// Direction along which [`DropMissingValues`] drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Rows,
    Columns,
}

/// Drop rows or columns with too few non-null cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropMissingValues {
    pub axis: Axis,
    /// Minimum non-null cells to keep a row/column; `None` requires all
    pub thresh: Option<usize>,
}

impl DropMissingValues {
    pub fn new(axis: Axis, thresh: Option<usize>) -> Self {
        Self { axis, thresh }
    }

    fn drop_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        let required = self.thresh.unwrap_or(df.width());
        let mut non_null = vec![0usize; df.height()];
        for column in df.get_columns() {
            let present = column.as_materialized_series().is_not_null();
            for (i, flag) in present.into_iter().enumerate() {
                if flag == Some(true) {
                    non_null[i] += 1;
                }
            }
        }
        let mask: BooleanChunked = non_null.iter().map(|&n| n >= required).collect();
        Ok(df.filter(&mask)?)
    }

    fn drop_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        let required = self.thresh.unwrap_or(df.height());
        let kept: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.len() - c.null_count() >= required)
            .cloned()
            .collect();
        // a frame without columns cannot carry its row count
        if kept.is_empty() && df.width() > 0 {
            return Err(PipelineError::invalid_parameter(
                "thresh",
                required,
                "dropping columns would remove every column",
            ));
        }
        Ok(DataFrame::new(kept)?)
    }
}

impl Strategy for DropMissingValues {
    fn name(&self) -> &'static str {
        "drop_missing_values"
    }
}

impl MissingValueStrategy for DropMissingValues {
    fn handle(&self, df: &DataFrame) -> Result<DataFrame> {
        info!(axis = ?self.axis, thresh = ?self.thresh, "Dropping missing values");
        let cleaned = match self.axis {
            Axis::Rows => self.drop_rows(df)?,
            Axis::Columns => self.drop_columns(df)?,
        };
        info!(
            rows_before = df.height(),
            rows_after = cleaned.height(),
            columns_before = df.width(),
            columns_after = cleaned.width(),
            "Missing values dropped"
        );
        Ok(cleaned)
    }
}

/// Context holding the active missing-value strategy
pub struct MissingValueHandler {
    strategy: Box<dyn MissingValueStrategy>,
    span: Span,
}

impl MissingValueHandler {
    pub fn new<S: MissingValueStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("missing_values"))
    }

    pub fn with_span<S: MissingValueStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        Self::from_boxed(Box::new(strategy), span)
    }

    /// Build from an already boxed strategy (used by the config layer)
    pub fn from_boxed(strategy: Box<dyn MissingValueStrategy>, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self { strategy, span })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_strategy<S: MissingValueStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(
            from = self.strategy.name(),
            to = strategy.name(),
            "Switching missing value handling strategy"
        );
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn handle_missing_values(&self, df: &DataFrame) -> Result<DataFrame> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), "Executing missing value handling strategy");
        self.strategy.handle(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "LotFrontage" => &[Some(65.0), None, Some(68.0), None],
            "LotArea" => &[Some(8450i64), Some(9600), None, Some(9550)],
            "Alley" => &[None, None, None, Some("Pave")],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_rows_any_null() {
        let handler = MissingValueHandler::new(DropMissingValues::default()).unwrap();
        let out = handler.handle_missing_values(&sample_df()).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(out.width(), 3);
    }

    #[test]
    fn test_drop_rows_with_threshold() {
        let strategy = DropMissingValues::new(Axis::Rows, Some(2));
        let out = strategy.handle(&sample_df()).unwrap();
        // row 0: 2 present, row 1: 1, row 2: 1, row 3: 2
        assert_eq!(out.height(), 2);
        let lot_area = out.column("LotArea").unwrap().i64().unwrap();
        assert_eq!(lot_area.get(0), Some(8450));
        assert_eq!(lot_area.get(1), Some(9550));
    }

    #[test]
    fn test_drop_columns() {
        let strategy = DropMissingValues::new(Axis::Columns, Some(2));
        let out = strategy.handle(&sample_df()).unwrap();
        let names: Vec<String> = out.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["LotFrontage", "LotArea"]);
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_drop_columns_refuses_to_empty_frame() {
        let df = df!("a" => &[None::<f64>, Some(1.0)], "b" => &[Some(2.0), None]).unwrap();
        let err = DropMissingValues::new(Axis::Columns, None).handle(&df).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { .. }));
    }

    #[test]
    fn test_input_untouched() {
        let df = sample_df();
        let _ = DropMissingValues::default().handle(&df).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.column("LotFrontage").unwrap().null_count(), 2);
    }

    #[test]
    fn test_switch_strategy() {
        let mut handler = MissingValueHandler::new(DropMissingValues::default()).unwrap();
        handler
            .set_strategy(FillMissingValues::new(FillMethod::Mean))
            .unwrap();
        assert_eq!(handler.strategy_name(), "fill_missing_values");
        let out = handler.handle_missing_values(&sample_df()).unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(out.column("LotFrontage").unwrap().null_count(), 0);
        assert_eq!(out.column("Alley").unwrap().null_count(), 3);
    }
}
