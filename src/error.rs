//! Error types for the housing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported format: no ingestor available for file extension '{0}'")]
    UnsupportedFormat(String),

    #[error("No data file found: no .csv file in {0}")]
    NoDataFileFound(String),

    #[error("Ambiguous data file: multiple .csv files found ({}), specify which one to use", .0.join(", "))]
    AmbiguousDataFile(Vec<String>),

    #[error("Invalid column: '{0}' is not present in the data")]
    InvalidColumn(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::ArchiveError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::InvalidColumn("SalePrice".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid column: 'SalePrice' is not present in the data"
        );
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = PipelineError::AmbiguousDataFile(vec!["a.csv".into(), "b.csv".into()]);
        assert!(err.to_string().contains("a.csv, b.csv"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::IoError(_)));
    }

    #[test]
    fn test_invalid_parameter_helper() {
        let err = PipelineError::invalid_parameter("test_size", 1.5, "must be in (0, 1)");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: test_size = 1.5, must be in (0, 1)"
        );
    }
}
