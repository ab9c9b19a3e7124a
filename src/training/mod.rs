//! Model building
//!
//! A [`ModelBuildingStrategy`] turns training features and target into a
//! fitted [`Regressor`]. The built-in strategy fits standardised ordinary
//! least squares ([`ScaledLinearModel`]).

mod linear_models;

pub use linear_models::ScaledLinearModel;

use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::utils::{column_as_f64, columns_to_array2};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, Span};

/// A fitted model that predicts a numeric target from a feature frame
pub trait Regressor: Send + Sync + fmt::Debug {
    /// Predict one value per row of `features`
    fn predict(&self, features: &DataFrame) -> Result<Array1<f64>>;

    /// Columns the model was trained on, in order
    fn feature_names(&self) -> &[String];
}

impl Regressor for ScaledLinearModel {
    fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let x = columns_to_array2(features, self.feature_names())?;
        self.predict_array(&x)
    }

    fn feature_names(&self) -> &[String] {
        ScaledLinearModel::feature_names(self)
    }
}

/// Trait for model building strategies
pub trait ModelBuildingStrategy: Strategy {
    fn build_and_train_model(&self, x_train: &DataFrame, y_train: &Series) -> Result<Box<dyn Regressor>>;
}

/// Convert the target to a dense vector, checking dtype, length and nulls
pub(crate) fn target_to_array(y: &Series, expected_len: usize) -> Result<Array1<f64>> {
    let ca = column_as_f64(&Column::from(y.clone()))?;
    if ca.len() != expected_len {
        return Err(PipelineError::TypeMismatch(format!(
            "target '{}' has {} values but the features have {} rows",
            y.name(),
            ca.len(),
            expected_len
        )));
    }
    if ca.null_count() > 0 {
        return Err(PipelineError::invalid_parameter(
            y.name().as_str(),
            format!("{} missing values", ca.null_count()),
            "missing values must be handled before model fitting",
        ));
    }
    Ok(ca.into_no_null_iter().collect())
}

/// Standardisation followed by ordinary least squares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionStrategy;

impl Strategy for LinearRegressionStrategy {
    fn name(&self) -> &'static str {
        "linear_regression"
    }
}

impl ModelBuildingStrategy for LinearRegressionStrategy {
    fn build_and_train_model(&self, x_train: &DataFrame, y_train: &Series) -> Result<Box<dyn Regressor>> {
        if x_train.height() == 0 || x_train.width() == 0 {
            return Err(PipelineError::invalid_parameter(
                "x_train",
                format!("{}x{}", x_train.height(), x_train.width()),
                "training data must have at least one row and one feature",
            ));
        }
        let feature_names: Vec<String> = x_train
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        info!(features = feature_names.len(), rows = x_train.height(), "Building and training linear regression model");

        let x = columns_to_array2(x_train, &feature_names)?;
        let y = target_to_array(y_train, x_train.height())?;
        let model = ScaledLinearModel::fit(feature_names, &x, &y)?;

        info!(intercept = model.intercept(), "Model training completed");
        Ok(Box::new(model))
    }
}

/// Context holding the active model building strategy
pub struct ModelBuilder {
    strategy: Box<dyn ModelBuildingStrategy>,
    span: Span,
}

impl ModelBuilder {
    pub fn new<S: ModelBuildingStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("model_building"))
    }

    pub fn with_span<S: ModelBuildingStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        Self::from_boxed(Box::new(strategy), span)
    }

    pub fn from_boxed(strategy: Box<dyn ModelBuildingStrategy>, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self { strategy, span })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_strategy<S: ModelBuildingStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(from = self.strategy.name(), to = strategy.name(), "Switching model building strategy");
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn build_model(&self, x_train: &DataFrame, y_train: &Series) -> Result<Box<dyn Regressor>> {
        let _guard = self.span.enter();
        info!(strategy = self.strategy.name(), "Building model");
        self.strategy.build_and_train_model(x_train, y_train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_data() -> (DataFrame, Series) {
        let x = df!(
            "Gr Liv Area" => &[1000.0, 1500.0, 1200.0, 2000.0, 1800.0],
            "Overall Qual" => &[5i64, 6, 5, 8, 7],
        )
        .unwrap();
        let y: Vec<f64> = vec![1000.0, 1500.0, 1200.0, 2000.0, 1800.0]
            .into_iter()
            .zip([5.0, 6.0, 5.0, 8.0, 7.0])
            .map(|(area, qual)| 10_000.0 + 50.0 * area + 8_000.0 * qual)
            .collect();
        (x, Series::new("SalePrice".into(), y))
    }

    #[test]
    fn test_build_and_predict() {
        let (x, y) = training_data();
        let builder = ModelBuilder::new(LinearRegressionStrategy).unwrap();
        let model = builder.build_model(&x, &y).unwrap();
        assert_eq!(model.feature_names(), &["Gr Liv Area", "Overall Qual"]);

        let pred = model.predict(&x).unwrap();
        let truth = y.f64().unwrap();
        for (p, t) in pred.iter().zip(truth.into_no_null_iter()) {
            assert!((p - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_predict_selects_columns_by_name() {
        let (x, y) = training_data();
        let model = LinearRegressionStrategy.build_and_train_model(&x, &y).unwrap();
        let reordered = x.select(["Overall Qual", "Gr Liv Area"]).unwrap();
        let a = model.predict(&x).unwrap();
        let b = model.predict(&reordered).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-9);

        let missing = x.drop("Overall Qual").unwrap();
        assert!(matches!(model.predict(&missing), Err(PipelineError::InvalidColumn(_))));
    }

    #[test]
    fn test_type_errors() {
        let (x, y) = training_data();
        let with_text = x
            .clone()
            .with_column(Series::new("Neighborhood".into(), &["A", "B", "A", "C", "B"]))
            .unwrap()
            .clone();
        assert!(matches!(
            LinearRegressionStrategy.build_and_train_model(&with_text, &y),
            Err(PipelineError::TypeMismatch(_))
        ));

        let short = y.slice(0, 3);
        assert!(matches!(
            LinearRegressionStrategy.build_and_train_model(&x, &short),
            Err(PipelineError::TypeMismatch(_))
        ));

        let text_target = Series::new("SalePrice".into(), &["a", "b", "c", "d", "e"]);
        assert!(matches!(
            LinearRegressionStrategy.build_and_train_model(&x, &text_target),
            Err(PipelineError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_empty_and_null_input() {
        let (x, y) = training_data();
        let empty = x.head(Some(0));
        assert!(matches!(
            LinearRegressionStrategy.build_and_train_model(&empty, &y.slice(0, 0)),
            Err(PipelineError::InvalidParameter { .. })
        ));

        let with_null = df!("a" => &[Some(1.0), None, Some(3.0)]).unwrap();
        let target = Series::new("y".into(), &[1.0, 2.0, 3.0]);
        assert!(matches!(
            LinearRegressionStrategy.build_and_train_model(&with_null, &target),
            Err(PipelineError::InvalidParameter { .. })
        ));
    }
}
