use super::FeatureEngineeringStrategy;
use crate::error::{PipelineError, Result};
use crate::strategy::{validate_features, Strategy};
use crate::utils::{column_as_f64, require_numeric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Natural log of `1 + x`, written back to each feature's own column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogTransformation {
    pub features: Vec<String>,
}

impl LogTransformation {
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

impl Strategy for LogTransformation {
    fn name(&self) -> &'static str {
        "log_transformation"
    }

    fn validate(&self) -> Result<()> {
        validate_features(&self.features)
    }
}

impl FeatureEngineeringStrategy for LogTransformation {
    fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame> {
        info!(features = ?self.features, "Applying log transformation");
        let mut result = df.clone();
        for feature in &self.features {
            let ca = column_as_f64(require_numeric(df, feature)?)?;
            // log1p is undefined at or below -1
            if let Some(bad) = ca.into_iter().flatten().find(|v| *v <= -1.0) {
                return Err(PipelineError::invalid_parameter(
                    feature,
                    bad,
                    "log transformation requires values greater than -1",
                ));
            }
            let logged: Float64Chunked = ca.into_iter().map(|opt| opt.map(f64::ln_1p)).collect();
            result.with_column(logged.with_name(feature.as_str().into()).into_series())?;
        }
        info!("Log transformation completed");
        Ok(result)
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_feature_keeps_own_values() {
        let df = df!(
            "SalePrice" => &[Some(0.0), Some(9.0), None],
            "Gr Liv Area" => &[99i64, 0, 999],
            "Neighborhood" => &["NAmes", "OldTown", "NAmes"],
        )
        .unwrap();
        let out = LogTransformation::new(["SalePrice", "Gr Liv Area"])
            .apply_transformation(&df)
            .unwrap();

        let price = out.column("SalePrice").unwrap().f64().unwrap();
        assert_eq!(price.get(0), Some(0.0));
        assert!((price.get(1).unwrap() - 10f64.ln()).abs() < 1e-12);
        assert_eq!(price.get(2), None);

        let area = out.column("Gr Liv Area").unwrap().f64().unwrap();
        assert!((area.get(0).unwrap() - 100f64.ln()).abs() < 1e-12);
        assert!((area.get(2).unwrap() - 1000f64.ln()).abs() < 1e-12);
        assert_eq!(out.width(), 3);
    }

    #[test]
    fn test_rejects_values_at_or_below_minus_one() {
        let df = df!("x" => &[1.0, -1.0]).unwrap();
        let err = LogTransformation::new(["x"]).apply_transformation(&df).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { .. }));
    }

    #[test]
    fn test_feature_errors() {
        let df = df!("Neighborhood" => &["NAmes"]).unwrap();
        assert!(matches!(
            LogTransformation::new(["Neighborhood"]).apply_transformation(&df),
            Err(PipelineError::TypeMismatch(_))
        ));
        assert!(matches!(
            LogTransformation::new(["Lot Area"]).apply_transformation(&df),
            Err(PipelineError::InvalidColumn(_))
        ));
        assert!(LogTransformation::new(Vec::<String>::new()).validate().is_err());
    }
}
