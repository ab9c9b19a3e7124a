//! Feature engineering
//!
//! Column transforms applied before splitting:
//! - [`LogTransformation`]: `log(1 + x)` per feature
//! - [`StandardScaling`]: zero mean, unit (population) variance
//! - [`MinMaxScaling`]: linear map onto a target range
//! - [`OneHotEncoding`]: k-1 indicator columns per categorical feature
//!
//! Every call re-fits its parameters on the frame it is given; nothing is
//! kept between invocations.

mod encoding;
mod log;
mod scaling;

pub use encoding::OneHotEncoding;
pub use log::LogTransformation;
pub use scaling::{MinMaxScaling, StandardScaling};

use crate::error::Result;
use crate::strategy::Strategy;
use polars::prelude::*;
use tracing::{info, Span};

/// Trait for feature engineering strategies
pub trait FeatureEngineeringStrategy: Strategy {
    /// Return a transformed copy of `df`
    fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Features this strategy touches
    fn features(&self) -> &[String];
}

/// Context holding the active feature engineering strategy
pub struct FeatureEngineer {
    strategy: Box<dyn FeatureEngineeringStrategy>,
    span: Span,
}

impl FeatureEngineer {
    pub fn new<S: FeatureEngineeringStrategy + 'static>(strategy: S) -> Result<Self> {
        Self::with_span(strategy, tracing::info_span!("feature_engineering"))
    }

    pub fn with_span<S: FeatureEngineeringStrategy + 'static>(strategy: S, span: Span) -> Result<Self> {
        Self::from_boxed(Box::new(strategy), span)
    }

    /// Build from an already boxed strategy (used by the config layer)
    pub fn from_boxed(strategy: Box<dyn FeatureEngineeringStrategy>, span: Span) -> Result<Self> {
        strategy.validate()?;
        Ok(Self { strategy, span })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_strategy<S: FeatureEngineeringStrategy + 'static>(&mut self, strategy: S) -> Result<()> {
        let _guard = self.span.enter();
        strategy.validate()?;
        info!(
            from = self.strategy.name(),
            to = strategy.name(),
            "Switching feature engineering strategy"
        );
        self.strategy = Box::new(strategy);
        Ok(())
    }

    pub fn apply_feature_engineering(&self, df: &DataFrame) -> Result<DataFrame> {
        let _guard = self.span.enter();
        info!(
            strategy = self.strategy.name(),
            features = ?self.strategy.features(),
            "Applying feature engineering strategy"
        );
        self.strategy.apply_transformation(df)
    }
}
