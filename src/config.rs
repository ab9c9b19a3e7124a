//! Pipeline configuration
//!
//! Serializable description of a full run. Stage entries are tagged enums
//! that build boxed strategies; building a strategy validates it.

use crate::error::{PipelineError, Result};
use crate::feature_engineering::{
    FeatureEngineeringStrategy, LogTransformation, MinMaxScaling, OneHotEncoding, StandardScaling,
};
use crate::ingestion::DEFAULT_EXTRACT_DIR;
use crate::missing_values::{Axis, DropMissingValues, FillMethod, FillMissingValues, MissingValueStrategy};
use crate::splitting::SimpleTrainTestSplit;
use crate::strategy::Strategy;
use crate::training::{LinearRegressionStrategy, ModelBuildingStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Missing-value stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MissingValueConfig {
    Drop {
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        thresh: Option<usize>,
    },
    Fill {
        method: FillMethod,
    },
}

impl Default for MissingValueConfig {
    fn default() -> Self {
        MissingValueConfig::Fill {
            method: FillMethod::Mean,
        }
    }
}

impl MissingValueConfig {
    /// Build and validate the strategy
    pub fn into_strategy(self) -> Result<Box<dyn MissingValueStrategy>> {
        let strategy: Box<dyn MissingValueStrategy> = match self {
            MissingValueConfig::Drop { axis, thresh } => Box::new(DropMissingValues::new(axis, thresh)),
            MissingValueConfig::Fill { method } => Box::new(FillMissingValues::new(method)),
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

/// One feature engineering step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FeatureEngineeringConfig {
    Log {
        features: Vec<String>,
    },
    StandardScaling {
        features: Vec<String>,
    },
    MinMaxScaling {
        features: Vec<String>,
        #[serde(default)]
        feature_range: Option<(f64, f64)>,
    },
    OneHot {
        features: Vec<String>,
    },
}

impl FeatureEngineeringConfig {
    /// Build and validate the strategy
    pub fn into_strategy(self) -> Result<Box<dyn FeatureEngineeringStrategy>> {
        let strategy: Box<dyn FeatureEngineeringStrategy> = match self {
            FeatureEngineeringConfig::Log { features } => Box::new(LogTransformation::new(features)),
            FeatureEngineeringConfig::StandardScaling { features } => {
                Box::new(StandardScaling::new(features))
            }
            FeatureEngineeringConfig::MinMaxScaling {
                features,
                feature_range,
            } => {
                let scaling = MinMaxScaling::new(features);
                Box::new(match feature_range {
                    Some((min, max)) => scaling.with_feature_range(min, max),
                    None => scaling,
                })
            }
            FeatureEngineeringConfig::OneHot { features } => Box::new(OneHotEncoding::new(features)),
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

/// Model stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ModelConfig {
    #[default]
    LinearRegression,
}

impl ModelConfig {
    pub fn into_strategy(self) -> Result<Box<dyn ModelBuildingStrategy>> {
        let strategy: Box<dyn ModelBuildingStrategy> = match self {
            ModelConfig::LinearRegression => Box::new(LinearRegressionStrategy),
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

/// Configuration for a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column to predict
    pub target: String,

    /// Where archives are extracted
    pub extract_dir: PathBuf,

    /// Print dtype and summary tables after ingestion
    pub inspect: bool,

    pub missing_values: MissingValueConfig,

    /// Applied in order
    pub feature_engineering: Vec<FeatureEngineeringConfig>,

    /// Model inputs; `None` uses every numeric column except the target
    pub features: Option<Vec<String>>,

    pub split: SimpleTrainTestSplit,

    pub model: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: "SalePrice".to_string(),
            extract_dir: PathBuf::from(DEFAULT_EXTRACT_DIR),
            inspect: false,
            missing_values: MissingValueConfig::default(),
            feature_engineering: Vec::new(),
            features: None,
            split: SimpleTrainTestSplit::default(),
            model: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; omitted fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every stage without running anything
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(PipelineError::ConfigError("target column must not be empty".to_string()));
        }
        self.missing_values.clone().into_strategy()?;
        for step in &self.feature_engineering {
            step.clone().into_strategy()?;
        }
        if let Some(features) = &self.features {
            crate::strategy::validate_features(features)?;
            if features.contains(&self.target) {
                return Err(PipelineError::ConfigError(format!(
                    "target '{}' cannot also be a model feature",
                    self.target
                )));
            }
        }
        self.split.validate()?;
        self.model.clone().into_strategy()?;
        Ok(())
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }

    pub fn with_inspection(mut self, inspect: bool) -> Self {
        self.inspect = inspect;
        self
    }

    pub fn with_missing_values(mut self, missing_values: MissingValueConfig) -> Self {
        self.missing_values = missing_values;
        self
    }

    /// Append a feature engineering step
    pub fn with_feature_step(mut self, step: FeatureEngineeringConfig) -> Self {
        self.feature_engineering.push(step);
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.split.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.split.random_state = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missing_values::FillValue;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.target, "SalePrice");
        assert_eq!(config.split.test_size, 0.25);
        assert_eq!(config.split.random_state, 42);
        assert_eq!(config.extract_dir, PathBuf::from("extracted_data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_target("price")
            .with_test_size(0.2)
            .with_random_state(7)
            .with_feature_step(FeatureEngineeringConfig::Log {
                features: vec!["price".into()],
            });
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.split.random_state, 7);
        assert_eq!(config.feature_engineering.len(), 1);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "target": "SalePrice",
            "missing_values": {"strategy": "fill", "method": {"constant": 0}},
            "feature_engineering": [
                {"strategy": "log", "features": ["Gr Liv Area"]},
                {"strategy": "min_max_scaling", "features": ["Lot Area"], "feature_range": [-1.0, 1.0]},
                {"strategy": "one_hot", "features": ["Neighborhood"]}
            ],
            "split": {"test_size": 0.3}
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.missing_values,
            MissingValueConfig::Fill {
                method: FillMethod::Constant(FillValue::Number(0.0))
            }
        );
        assert_eq!(config.feature_engineering.len(), 3);
        assert_eq!(config.split.random_state, 42);
        assert_eq!(config.model, ModelConfig::LinearRegression);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_stage_rejected() {
        let config = PipelineConfig::new().with_feature_step(FeatureEngineeringConfig::MinMaxScaling {
            features: vec!["x".into()],
            feature_range: Some((1.0, 0.0)),
        });
        assert!(matches!(config.validate(), Err(PipelineError::InvalidParameter { .. })));

        let config = PipelineConfig::new().with_test_size(1.0);
        assert!(config.validate().is_err());

        let config = PipelineConfig::new().with_features(["SalePrice"]);
        assert!(matches!(config.validate(), Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"target": "price", "inspect": true}"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.target, "price");
        assert!(config.inspect);

        std::fs::write(&path, r#"{"missing_values": {"strategy": "interpolate"}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(PipelineError::ConfigError(_))
        ));
    }
}
