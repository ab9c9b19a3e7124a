//! Model evaluation

use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::training::{target_to_array, Regressor};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, Span};

pub const MSE_KEY: &str = "Mean Squared Error";
pub const R2_KEY: &str = "R2_Score";

/// Named metric values, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics(BTreeMap<String, f64>);

impl EvaluationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn mse(&self) -> Option<f64> {
        self.get(MSE_KEY)
    }

    pub fn r2(&self) -> Option<f64> {
        self.get(R2_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean squared error and coefficient of determination.
    ///
    /// A constant target has no variance to explain: R² is 1 when every
    /// prediction is exact and 0 otherwise.
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::invalid_parameter(
                "y_test",
                "[]",
                "cannot evaluate on an empty test set",
            ));
        }

        let n = y_true.len() as f64;
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        let mut metrics = Self::new();
        metrics.insert(MSE_KEY, ss_res / n);
        metrics.insert(R2_KEY, r2);
        Ok(metrics)
    }
}

/// Trait for model evaluation strategies
pub trait ModelEvaluationStrategy: Strategy {
    fn evaluate_model(
        &self,
        model: &dyn Regressor,
        x_test: &DataFrame,
        y_test: &Series,
    ) -> Result<EvaluationMetrics>;
}

/// Mean squared error and R² on held-out data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionModelEvaluation;

impl Strategy for RegressionModelEvaluation {
    fn name(&self) -> &'static str {
        "regression_model_evaluation"
    }
}

impl ModelEvaluationStrategy for RegressionModelEvaluation {
    fn evaluate_model(
        &self,
        model: &dyn Regressor,
        x_test: &DataFrame,
        y_test: &Series,
    ) -> Result<EvaluationMetrics> {
        info!(rows = x_test.height(), "Predicting using the trained model");
        let y_pred = model.predict(x_test)?;
        let y_true = target_to_array(y_test, x_test.height())?;

        info!("Calculating evaluation metrics");
        let metrics = EvaluationMetrics::compute_regression(&y_true, &y_pred)?;
        info!(
            mse = metrics.mse().unwrap_or(f64::NAN),
            r2 = metrics.r2().unwrap_or(f64::NAN),
            "Model evaluation completed"
        );
        Ok(metrics)
    }
}

/// Context holding the active evaluation strategy
pub struct ModelEvaluator {
    strategy: Box<dyn ModelEvaluationStrategy>,
    span: Span,
}

impl ModelEvaluator {
    pub fn new<S: ModelEvaluationStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("model_evaluation"))
    }

    pub fn with_span<S: ModelEvaluationStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            strategy: Box::new(strategy),
            span,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_strategy<S: ModelEvaluationStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching model evaluation strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn evaluate(
        &self,
        model: &dyn Regressor,
        x_test: &DataFrame,
        y_test: &Series,
    ) -> Result<EvaluationMetrics> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), "Evaluating model");
        self.strategy.evaluate_model(model, x_test, y_test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{LinearRegressionStrategy, ModelBuildingStrategy};
    use ndarray::array;

    #[test]
    fn test_compute_regression() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 5.0];
        let metrics = EvaluationMetrics::compute_regression(&y_true, &y_pred).unwrap();
        assert!((metrics.mse().unwrap() - 0.25).abs() < 1e-12);
        // ss_tot = 5, ss_res = 1
        assert!((metrics.r2().unwrap() - 0.8).abs() < 1e-12);
        let keys: Vec<&str> = metrics.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Mean Squared Error", "R2_Score"]);
    }

    #[test]
    fn test_constant_target() {
        let y_true = array![2.0, 2.0];
        let exact = EvaluationMetrics::compute_regression(&y_true, &array![2.0, 2.0]).unwrap();
        assert_eq!(exact.r2(), Some(1.0));
        let off = EvaluationMetrics::compute_regression(&y_true, &array![2.0, 3.0]).unwrap();
        assert_eq!(off.r2(), Some(0.0));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(EvaluationMetrics::compute_regression(&array![1.0], &array![1.0, 2.0]).is_err());
        assert!(EvaluationMetrics::compute_regression(&array![], &array![]).is_err());
    }

    #[test]
    fn test_evaluator_with_trained_model() {
        let x = df!("x" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Series::new("y".into(), &[3.0, 5.0, 7.0, 9.0, 11.0]);
        let model = LinearRegressionStrategy.build_and_train_model(&x, &y).unwrap();

        let evaluator = ModelEvaluator::new(RegressionModelEvaluation).unwrap();
        let metrics = evaluator.evaluate(model.as_ref(), &x, &y).unwrap();
        assert!(metrics.mse().unwrap() < 1e-12);
        assert!((metrics.r2().unwrap() - 1.0).abs() < 1e-9);
    }
}
