use super::FeatureEngineeringStrategy;
use crate::error::{PipelineError, Result};
use std::collections::HashSet;
use crate::strategy::{validate_features, Strategy};
use crate::utils::{column_as_f64, is_numeric_dtype, require_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One-hot encoding with the first category dropped as reference.
///
/// Categories are the distinct non-null values of each feature, sorted
/// (numerically for numeric features). Each remaining category becomes a
/// `Float64` 0/1 column named `{feature}_{category}`; the original columns are
/// removed and the indicator columns appended at the end. Nulls encode as
/// all zeros.
///
/// Fails with `InvalidParameter` when an indicator name collides with another
/// column, or when the encoding would leave the frame without columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoding {
    pub features: Vec<String>,
}

impl OneHotEncoding {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    fn encode_feature(&self, df: &DataFrame, feature: &str) -> Result<Vec<Column>> {
        let column = require_column(df, feature)?;
        let labels = column.as_materialized_series().cast(&DataType::String)?;
        let labels = labels.str()?;

        let mut categories: Vec<(String, f64)> = Vec::new();
        let keys = if is_numeric_dtype(column.dtype()) {
            Some(column_as_f64(column)?)
        } else {
            None
        };
        for (i, label) in labels.into_iter().enumerate() {
            let Some(label) = label else { continue };
            if !categories.iter().any(|(c, _)| c == label) {
                let key = keys.as_ref().and_then(|k| k.get(i)).unwrap_or(0.0);
                categories.push((label.to_string(), key));
            }
        }
        if keys.is_some() {
            categories.sort_by(|a, b| a.1.total_cmp(&b.1));
        } else {
            categories.sort_by(|a, b| a.0.cmp(&b.0));
        }
        debug!(feature, categories = categories.len(), "Collected categories");

        Ok(categories
            .iter()
            .skip(1)
            .map(|(category, _)| {
                let indicator: Float64Chunked = labels
                    .into_iter()
                    .map(|v| Some(if v == Some(category.as_str()) { 1.0 } else { 0.0 }))
                    .collect();
                indicator
                    .with_name(format!("{}_{}", feature, category).into())
                    .into_series()
                    .into()
            })
            .collect())
    }
}

impl Strategy for OneHotEncoding {
    fn name(&self) -> &'static str {
        "one_hot_encoding"
    }

    fn validate(&self) -> Result<()> {
        validate_features(&self.features)
    }
}

impl FeatureEngineeringStrategy for OneHotEncoding {
    fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame> {
        info!(features = ?self.features, "Applying one-hot encoding");
        let mut encoded: Vec<Column> = Vec::new();
        for feature in &self.features {
            encoded.extend(self.encode_feature(df, feature)?);
        }

        let mut columns: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|c| !self.features.iter().any(|f| f.as_str() == c.name().as_str()))
            .cloned()
            .collect();
        let mut names: HashSet<String> = columns.iter().map(|c| c.name().to_string()).collect();
        for column in &encoded {
            if !names.insert(column.name().to_string()) {
                return Err(PipelineError::invalid_parameter(
                    "features",
                    column.name(),
                    "indicator column name clashes with an existing column",
                ));
            }
        }
        if columns.is_empty() && encoded.is_empty() {
            return Err(PipelineError::invalid_parameter(
                "features",
                self.features.join(", "),
                "encoding would remove every column",
            ));
        }

        let added = encoded.len();
        columns.extend(encoded);
        let result = DataFrame::new(columns)?;
        info!(added_columns = added, "One-hot encoding completed");
        Ok(result)
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}
