//! Feature scaling

use super::FeatureEngineeringStrategy;
use crate::error::{PipelineError, Result};
use crate::strategy::{validate_features, Strategy};
use crate::utils::{column_as_f64, require_numeric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fitted affine map: `(x - center) / scale + offset`
#[derive(Debug, Clone, Copy)]
struct ScalerParams {
    center: f64,
    scale: f64,
    offset: f64,
}

impl ScalerParams {
    fn scale_series(&self, ca: &Float64Chunked) -> Series {
        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - self.center) / self.scale + self.offset))
            .collect();
        scaled.with_name(ca.name().clone()).into_series()
    }
}

/// Fit parameters for each feature and write the scaled columns back
fn scale_features<F>(df: &DataFrame, features: &[String], fit: F) -> Result<DataFrame>
where
    F: Fn(&Float64Chunked) -> ScalerParams,
{
    // Build all scaled columns first, then apply them
    let replacements: Vec<Series> = features
        .iter()
        .map(|feature| {
            let ca = column_as_f64(require_numeric(df, feature)?)?;
            let params = fit(&ca);
            debug!(feature = %feature, center = params.center, scale = params.scale, "Fitted scaler");
            Ok(params.scale_series(&ca))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut result = df.clone();
    for scaled in replacements {
        result.with_column(scaled)?;
    }
    Ok(result)
}

/// Z-score scaling with population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaling {
    pub features: Vec<String>,
}

impl StandardScaling {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

impl Strategy for StandardScaling {
    fn name(&self) -> &'static str {
        "standard_scaling"
    }

    fn validate(&self) -> Result<()> {
        validate_features(&self.features)
    }
}

impl FeatureEngineeringStrategy for StandardScaling {
    fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame> {
        info!(features = ?self.features, "Applying standard scaling");
        let result = scale_features(df, &self.features, |ca| {
            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(0).unwrap_or(1.0);
            ScalerParams {
                center: mean,
                scale: if std == 0.0 { 1.0 } else { std },
                offset: 0.0,
            }
        })?;
        info!("Standard scaling completed");
        Ok(result)
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}

/// Linear map of each feature onto `feature_range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaling {
    pub features: Vec<String>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl MinMaxScaling {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            feature_range: default_feature_range(),
        }
    }

    pub fn with_feature_range(mut self, min: f64, max: f64) -> Self {
        self.feature_range = (min, max);
        self
    }
}

impl Strategy for MinMaxScaling {
    fn name(&self) -> &'static str {
        "min_max_scaling"
    }

    fn validate(&self) -> Result<()> {
        validate_features(&self.features)?;
        let (lo, hi) = self.feature_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(PipelineError::invalid_parameter(
                "feature_range",
                format!("({}, {})", lo, hi),
                "minimum must be finite and below maximum",
            ));
        }
        Ok(())
    }
}

impl FeatureEngineeringStrategy for MinMaxScaling {
    fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame> {
        let (lo, hi) = self.feature_range;
        info!(features = ?self.features, min = lo, max = hi, "Applying min-max scaling");
        let result = scale_features(df, &self.features, |ca| {
            let min = ca.min().unwrap_or(0.0);
            let max = ca.max().unwrap_or(min);
            let range = max - min;
            ScalerParams {
                center: min,
                // constant column collapses onto the lower bound
                scale: if range == 0.0 { 1.0 } else { range / (hi - lo) },
                offset: lo,
            }
        })?;
        info!("Min-max scaling completed");
        Ok(result)
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}
