//! End-to-end training run
//!
//! [`PipelineDriver`] wires the stages together from a [`PipelineConfig`]:
//!
//! 1. ingest the archive
//! 2. optionally print dtype and summary tables
//! 3. handle missing values
//! 4. apply feature engineering steps in order
//! 5. select model inputs
//! 6. split, train and evaluate

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::evaluation::{EvaluationMetrics, ModelEvaluator, RegressionModelEvaluation};
use crate::feature_engineering::FeatureEngineer;
use crate::ingestion::DataIngestorFactory;
use crate::inspection::{DataInspector, DataTypesInspection, SummaryStatisticsInspection};
use crate::missing_values::MissingValueHandler;
use crate::splitting::DataSplitter;
use crate::training::ModelBuilder;
use crate::utils::{is_numeric_dtype, require_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn, Span};

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub metrics: EvaluationMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Columns the model was trained on
    pub features: Vec<String>,
}

/// Runs every stage of the pipeline for one configuration
pub struct PipelineDriver {
    config: PipelineConfig,
    span: Span,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            span: tracing::info_span!("pipeline"),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest `archive` and run every stage on its data
    pub fn run(&self, archive: &Path) -> Result<PipelineOutcome> {
        let df = {
            let _guard = self.span.enter();
            info!(archive = %archive.display(), "Starting pipeline run");
            let ingestor = DataIngestorFactory::for_path_in(archive, self.config.extract_dir.clone())?;
            ingestor.ingest(archive)?
        };
        self.run_on_frame(df)
    }

    /// Run every stage after ingestion
    pub fn run_on_frame(&self, df: DataFrame) -> Result<PipelineOutcome> {
        let _guard = self.span.enter();
        info!(rows = df.height(), columns = df.width(), "Running pipeline stages");
        require_column(&df, &self.config.target)?;

        if self.config.inspect {
            let mut inspector = DataInspector::new(DataTypesInspection)?;
            inspector.execute_strategy(&df)?;
            inspector.set_strategy(SummaryStatisticsInspection)?;
            inspector.execute_strategy(&df)?;
        }

        let handler = MissingValueHandler::from_boxed(
            self.config.missing_values.clone().into_strategy()?,
            tracing::info_span!("missing_values"),
        )?;
        let mut df = handler.handle_missing_values(&df)?;

        for step in &self.config.feature_engineering {
            let engineer = FeatureEngineer::from_boxed(
                step.clone().into_strategy()?,
                tracing::info_span!("feature_engineering"),
            )?;
            df = engineer.apply_feature_engineering(&df)?;
        }

        let model_frame = self.select_model_inputs(&df)?;

        let splitter = DataSplitter::new(self.config.split.clone())?;
        let split = splitter.split(&model_frame, &self.config.target)?;

        let builder = ModelBuilder::from_boxed(
            self.config.model.clone().into_strategy()?,
            tracing::info_span!("model_building"),
        )?;
        let model = builder.build_model(&split.x_train, &split.y_train)?;

        let evaluator = ModelEvaluator::new(RegressionModelEvaluation)?;
        let metrics = evaluator.evaluate(model.as_ref(), &split.x_test, &split.y_test)?;

        let outcome = PipelineOutcome {
            metrics,
            train_rows: split.x_train.height(),
            test_rows: split.x_test.height(),
            features: model.feature_names().to_vec(),
        };
        info!(
            train_rows = outcome.train_rows,
            test_rows = outcome.test_rows,
            features = outcome.features.len(),
            "Pipeline run completed"
        );
        Ok(outcome)
    }

    /// Keep the configured features (or every numeric column) plus the target
    fn select_model_inputs(&self, df: &DataFrame) -> Result<DataFrame> {
        let target = &self.config.target;
        let mut columns: Vec<Column> = match &self.config.features {
            Some(features) => features
                .iter()
                .map(|name| require_column(df, name).cloned())
                .collect::<Result<_>>()?,
            None => {
                let (numeric, skipped): (Vec<&Column>, Vec<&Column>) = df
                    .get_columns()
                    .iter()
                    .filter(|c| c.name().as_str() != target.as_str())
                    .partition(|c| is_numeric_dtype(c.dtype()));
                if !skipped.is_empty() {
                    let names: Vec<&str> = skipped.iter().map(|c| c.name().as_str()).collect();
                    warn!(columns = ?names, "Skipping non-numeric columns as model inputs");
                }
                numeric.into_iter().cloned().collect()
            }
        };
        columns.push(require_column(df, target)?.clone());
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureEngineeringConfig, MissingValueConfig};
    use crate::error::PipelineError;
    use crate::missing_values::Axis;

    fn housing_frame(n: usize) -> DataFrame {
        let area: Vec<Option<f64>> = (0..n)
            .map(|i| if i % 17 == 3 { None } else { Some(800.0 + 25.0 * i as f64) })
            .collect();
        let qual: Vec<i64> = (0..n).map(|i| 4 + (i % 6) as i64).collect();
        let zone: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "RL" } else { "RM" }).collect();
        let price: Vec<f64> = (0..n)
            .map(|i| 50_000.0 + 90.0 * (800.0 + 25.0 * i as f64) + 9_000.0 * (4 + i % 6) as f64)
            .collect();
        df!(
            "Gr Liv Area" => area,
            "Overall Qual" => qual,
            "MS Zoning" => zone,
            "SalePrice" => price,
        )
        .unwrap()
    }

    #[test]
    fn test_default_run_skips_text_columns() {
        let driver = PipelineDriver::new(PipelineConfig::default()).unwrap();
        let outcome = driver.run_on_frame(housing_frame(40)).unwrap();
        assert_eq!(outcome.train_rows, 30);
        assert_eq!(outcome.test_rows, 10);
        assert_eq!(outcome.features, vec!["Gr Liv Area", "Overall Qual"]);
        assert!(outcome.metrics.mse().unwrap() >= 0.0);
    }

    #[test]
    fn test_run_with_encoding_and_drop() {
        let config = PipelineConfig::new()
            .with_missing_values(MissingValueConfig::Drop {
                axis: Axis::Rows,
                thresh: None,
            })
            .with_feature_step(FeatureEngineeringConfig::OneHot {
                features: vec!["MS Zoning".into()],
            })
            .with_feature_step(FeatureEngineeringConfig::StandardScaling {
                features: vec!["Gr Liv Area".into()],
            });
        let outcome = PipelineDriver::new(config)
            .unwrap()
            .run_on_frame(housing_frame(60))
            .unwrap();
        // rows 3, 20, 37, 54 dropped
        assert_eq!(outcome.train_rows + outcome.test_rows, 56);
        assert!(outcome.features.contains(&"MS Zoning_RM".to_string()));
        assert!(outcome.metrics.r2().unwrap() > 0.99);
    }

    #[test]
    fn test_explicit_features() {
        let config = PipelineConfig::new().with_features(["Overall Qual"]);
        let outcome = PipelineDriver::new(config)
            .unwrap()
            .run_on_frame(housing_frame(20))
            .unwrap();
        assert_eq!(outcome.features, vec!["Overall Qual"]);
    }

    #[test]
    fn test_missing_target() {
        let driver = PipelineDriver::new(PipelineConfig::new().with_target("Price")).unwrap();
        let err = driver.run_on_frame(housing_frame(10)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidColumn(_)));
    }
}
