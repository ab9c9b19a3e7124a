//! Housing price pipeline
//!
//! An end-to-end regression workflow for tabular housing data, built from
//! interchangeable stage strategies:
//! - Ingest a zip archive holding one CSV
//! - Inspect and visualise the data
//! - Handle missing values
//! - Engineer features (log, scaling, one-hot)
//! - Split, train a linear model, evaluate
//!
//! # Modules
//!
//! ## Stages
//! - [`ingestion`] - Archive extraction and CSV loading
//! - [`inspection`] - Dtype and summary tables
//! - [`analysis`] - Charts for univariate, bivariate, multivariate and missing-value analysis
//! - [`missing_values`] - Drop and fill strategies
//! - [`feature_engineering`] - Column transforms
//! - [`splitting`] - Seeded train/test split
//! - [`training`] - Model building
//! - [`evaluation`] - Regression metrics
//!
//! ## Orchestration
//! - [`config`] - Serializable pipeline configuration
//! - [`pipeline`] - Runs all stages from a config
//! - [`cli`] - Command-line interface
//!
//! Every stage follows the same shape: a strategy trait with
//! [`strategy::Strategy`] as supertrait, a few implementations, and a context
//! object that owns the active strategy and can swap it at runtime.

// Core error handling
pub mod error;
pub mod strategy;

// Stages
pub mod ingestion;
pub mod inspection;
pub mod analysis;
pub mod missing_values;
pub mod feature_engineering;
pub mod splitting;
pub mod training;
pub mod evaluation;

// Orchestration
pub mod config;
pub mod pipeline;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};
    pub use crate::strategy::Strategy;

    // Ingestion & inspection
    pub use crate::ingestion::{DataIngestor, DataIngestorFactory, ZipDataIngestor};
    pub use crate::inspection::{DataInspectionStrategy, DataInspector, DataTypesInspection, SummaryStatisticsInspection};

    // Analysis
    pub use crate::analysis::{Chart, ChartRenderer, TerminalRenderer};

    // Cleaning & features
    pub use crate::missing_values::{Axis, DropMissingValues, FillMethod, FillMissingValues, FillValue, MissingValueHandler, MissingValueStrategy};
    pub use crate::feature_engineering::{FeatureEngineer, FeatureEngineeringStrategy, LogTransformation, MinMaxScaling, OneHotEncoding, StandardScaling};

    // Modelling
    pub use crate::splitting::{DataSplitter, DataSplittingStrategy, SimpleTrainTestSplit, SplitData};
    pub use crate::training::{LinearRegressionStrategy, ModelBuilder, ModelBuildingStrategy, Regressor};
    pub use crate::evaluation::{EvaluationMetrics, ModelEvaluationStrategy, ModelEvaluator, RegressionModelEvaluation};

    // Orchestration
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::{PipelineDriver, PipelineOutcome};
}
