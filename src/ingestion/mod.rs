//! Data ingestion
//!
//! Turns an input file into a [`DataFrame`]. The only registered format is a
//! zip archive holding exactly one CSV file; [`DataIngestorFactory`] picks the
//! ingestor from the file extension.

mod zip_ingestor;

pub use zip_ingestor::{ZipDataIngestor, DEFAULT_EXTRACT_DIR};

use crate::error::{PipelineError, Result};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Trait for data ingestors
pub trait DataIngestor: Send + Sync {
    /// Read the file at `path` into a frame
    fn ingest(&self, path: &Path) -> Result<DataFrame>;
}

/// Selects an ingestor by file extension
pub struct DataIngestorFactory;

impl DataIngestorFactory {
    /// Return the ingestor registered for `extension` (`".zip"` or `"zip"`)
    pub fn get_data_ingestor(extension: &str) -> Result<Box<dyn DataIngestor>> {
        Self::get_data_ingestor_in(extension, DEFAULT_EXTRACT_DIR)
    }

    /// Like [`get_data_ingestor`](Self::get_data_ingestor), extracting into `extract_dir`
    pub fn get_data_ingestor_in(
        extension: &str,
        extract_dir: impl Into<PathBuf>,
    ) -> Result<Box<dyn DataIngestor>> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "zip" => Ok(Box::new(ZipDataIngestor::new().with_extract_dir(extract_dir))),
            _ => Err(PipelineError::UnsupportedFormat(extension.to_string())),
        }
    }

    /// Return the ingestor for the extension of `path`
    pub fn for_path(path: &Path) -> Result<Box<dyn DataIngestor>> {
        Self::get_data_ingestor(Self::extension_of(path)?)
    }

    /// Like [`for_path`](Self::for_path), extracting into `extract_dir`
    pub fn for_path_in(path: &Path, extract_dir: impl Into<PathBuf>) -> Result<Box<dyn DataIngestor>> {
        Self::get_data_ingestor_in(Self::extension_of(path)?, extract_dir)
    }

    fn extension_of(path: &Path) -> Result<&str> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| PipelineError::UnsupportedFormat(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_zip() {
        assert!(DataIngestorFactory::get_data_ingestor(".zip").is_ok());
        assert!(DataIngestorFactory::get_data_ingestor("ZIP").is_ok());
    }

    #[test]
    fn test_factory_unsupported() {
        let err = DataIngestorFactory::get_data_ingestor(".parquet").err().unwrap();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ext) if ext == ".parquet"));
    }

    #[test]
    fn test_factory_for_path_without_extension() {
        let err = DataIngestorFactory::for_path(Path::new("data/archive")).err().unwrap();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }
}
