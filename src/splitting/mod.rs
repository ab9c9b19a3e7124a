//! Train/test splitting

use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::utils::require_column;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, Span};

/// Features and target for both sides of a split
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Series,
    pub y_test: Series,
}

/// Trait for data splitting strategies
pub trait DataSplittingStrategy: Strategy {
    /// Separate `target` from the features and partition the rows
    fn split_data(&self, df: &DataFrame, target: &str) -> Result<SplitData>;
}

/// Seeded shuffle followed by a single cut.
///
/// The training side gets `round(n * (1 - test_size))` rows and the test side
/// the rest. The same seed always produces the same partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleTrainTestSplit {
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_test_size() -> f64 {
    0.25
}

fn default_random_state() -> u64 {
    42
}

impl Default for SimpleTrainTestSplit {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            random_state: default_random_state(),
        }
    }
}

impl SimpleTrainTestSplit {
    pub fn new(test_size: f64, random_state: u64) -> Self {
        Self {
            test_size,
            random_state,
        }
    }

    /// Shuffled row indices for (train, test)
    pub fn split_indices(&self, n_rows: usize) -> Result<(Vec<IdxSize>, Vec<IdxSize>)> {
        if n_rows < 2 {
            return Err(PipelineError::invalid_parameter(
                "n_rows",
                n_rows,
                "at least two rows are needed to split",
            ));
        }
        let n_train = (n_rows as f64 * (1.0 - self.test_size)).round() as usize;
        if n_train == 0 || n_train >= n_rows {
            return Err(PipelineError::invalid_parameter(
                "test_size",
                self.test_size,
                format!("leaves an empty train or test set for {} rows", n_rows),
            ));
        }

        let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        indices.shuffle(&mut rng);
        let test = indices.split_off(n_train);
        Ok((indices, test))
    }
}

impl Strategy for SimpleTrainTestSplit {
    fn name(&self) -> &'static str {
        "simple_train_test_split"
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::invalid_parameter(
                "test_size",
                self.test_size,
                "must be strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

impl DataSplittingStrategy for SimpleTrainTestSplit {
    fn split_data(&self, df: &DataFrame, target: &str) -> Result<SplitData> {
        info!(test_size = self.test_size, random_state = self.random_state, "Performing simple train-test split");
        let y = require_column(df, target)?.as_materialized_series().clone();
        let x = df.drop(target)?;

        let (train_idx, test_idx) = self.split_indices(df.height())?;
        let train_idx = IdxCa::from_vec("train".into(), train_idx);
        let test_idx = IdxCa::from_vec("test".into(), test_idx);

        let split = SplitData {
            x_train: x.take(&train_idx)?,
            x_test: x.take(&test_idx)?,
            y_train: y.take(&train_idx)?,
            y_test: y.take(&test_idx)?,
        };
        info!(
            train_rows = split.x_train.height(),
            test_rows = split.x_test.height(),
            "Train-test split completed"
        );
        Ok(split)
    }
}

/// Context holding the active splitting strategy
pub struct DataSplitter {
    strategy: Box<dyn DataSplittingStrategy>,
    span: Span,
}

impl DataSplitter {
    pub fn new<S: DataSplittingStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("data_splitting"))
    }

    pub fn with_span<S: DataSplittingStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            strategy: Box::new(strategy),
            span,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_strategy<S: DataSplittingStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching data splitting strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn split(&self, df: &DataFrame, target: &str) -> Result<SplitData> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), target, "Splitting data");
        self.strategy.split_data(df, target)
    }
}
