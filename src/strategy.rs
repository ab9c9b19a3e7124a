//! Shared strategy contract
//!
//! Every pipeline stage exposes a single-method strategy trait with this
//! trait as its supertrait. Contexts call [`Strategy::validate`] whenever a
//! strategy is installed, so a strategy with out-of-range parameters is
//! rejected at assignment time rather than halfway through a run.

use crate::error::Result;

/// Common behaviour of all interchangeable stage algorithms
pub trait Strategy: Send + Sync {
    /// Human-readable strategy name, used in log fields
    fn name(&self) -> &'static str;

    /// Check the strategy's parameters
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Validate a feature list: non-empty with no duplicates.
pub(crate) fn validate_features(features: &[String]) -> Result<()> {
    if features.is_empty() {
        return Err(crate::error::PipelineError::invalid_parameter(
            "features",
            "[]",
            "at least one feature is required",
        ));
    }
    for (i, name) in features.iter().enumerate() {
        if features[..i].contains(name) {
            return Err(crate::error::PipelineError::invalid_parameter(
                "features",
                name,
                "feature listed more than once",
            ));
        }
    }
    Ok(())
}
