//! Zip archive ingestion

use super::DataIngestor;
use crate::error::{PipelineError, Result};
use crate::utils::DataLoader;
use polars::prelude::DataFrame;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory archives are extracted into, relative to the working directory
pub const DEFAULT_EXTRACT_DIR: &str = "extracted_data";

/// Ingestor for zip archives containing a single CSV file
#[derive(Debug, Clone)]
pub struct ZipDataIngestor {
    extract_dir: PathBuf,
    loader: DataLoader,
}

impl Default for ZipDataIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipDataIngestor {
    /// Create an ingestor extracting into [`DEFAULT_EXTRACT_DIR`]
    pub fn new() -> Self {
        Self {
            extract_dir: PathBuf::from(DEFAULT_EXTRACT_DIR),
            loader: DataLoader::new(),
        }
    }

    /// Extract into `dir` instead of the default directory
    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }

    /// Use a custom CSV loader
    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Extraction directory
    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Extract every entry, overwriting existing files.
    /// Returns the extracted file paths in archive order.
    fn extract(&self, archive_path: &Path) -> Result<Vec<PathBuf>> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        fs::create_dir_all(&self.extract_dir)?;

        let mut extracted = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = %entry.name(), "Skipping archive entry with unsafe path");
                continue;
            };
            let out_path = self.extract_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out)?;
            debug!(path = %out_path.display(), bytes = entry.size(), "Extracted entry");
            extracted.push(out_path);
        }

        Ok(extracted)
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

impl DataIngestor for ZipDataIngestor {
    fn ingest(&self, path: &Path) -> Result<DataFrame> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if !is_zip {
            return Err(PipelineError::UnsupportedFormat(path.display().to_string()));
        }

        info!(
            archive = %path.display(),
            extract_dir = %self.extract_dir.display(),
            "Extracting archive"
        );
        let extracted = self.extract(path)?;

        let csv_files: Vec<&PathBuf> = extracted.iter().filter(|p| is_csv(p)).collect();
        let csv_path = match csv_files.as_slice() {
            [] => {
                return Err(PipelineError::NoDataFileFound(
                    path.display().to_string(),
                ))
            }
            [single] => *single,
            many => {
                return Err(PipelineError::AmbiguousDataFile(
                    many.iter().map(|p| p.display().to_string()).collect(),
                ))
            }
        };

        let df = self.loader.load_csv(csv_path)?;
        info!(
            file = %csv_path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded data file"
        );
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_ingest_single_csv() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_archive(
            &archive,
            &[
                ("README.txt", "housing data"),
                ("houses.csv", "area,price\n1200,150000\n900,120000\n"),
            ],
        );

        let ingestor = ZipDataIngestor::new().with_extract_dir(dir.path().join("out"));
        let df = ingestor.ingest(&archive).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert!(dir.path().join("out/houses.csv").exists());
    }

    #[test]
    fn test_ingest_with_custom_loader() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_archive(&archive, &[("houses.csv", "area;price\n1200;150000\n")]);

        let ingestor = ZipDataIngestor::new()
            .with_extract_dir(dir.path().join("out"))
            .with_loader(DataLoader::new().with_separator(b';'));
        assert_eq!(ingestor.extract_dir(), dir.path().join("out"));
        assert_eq!(ingestor.ingest(&archive).unwrap().shape(), (1, 2));
    }

    #[test]
    fn test_ingest_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_archive(&archive, &[("notes.txt", "nothing tabular")]);

        let ingestor = ZipDataIngestor::new().with_extract_dir(dir.path().join("out"));
        let err = ingestor.ingest(&archive).unwrap_err();
        assert!(matches!(err, PipelineError::NoDataFileFound(_)));
    }

    #[test]
    fn test_ingest_multiple_csv() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.zip");
        write_archive(
            &archive,
            &[("train.csv", "a\n1\n"), ("test.csv", "a\n2\n")],
        );

        let ingestor = ZipDataIngestor::new().with_extract_dir(dir.path().join("out"));
        match ingestor.ingest(&archive).unwrap_err() {
            PipelineError::AmbiguousDataFile(files) => assert_eq!(files.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ingest_rejects_non_zip() {
        let ingestor = ZipDataIngestor::new();
        let err = ingestor.ingest(Path::new("data/houses.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_repeated_ingest_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let archive = dir.path().join("archive.zip");
        let ingestor = ZipDataIngestor::new().with_extract_dir(&out);

        write_archive(&archive, &[("houses.csv", "a\n1\n2\n3\n")]);
        assert_eq!(ingestor.ingest(&archive).unwrap().height(), 3);

        write_archive(&archive, &[("houses.csv", "a\n1\n")]);
        assert_eq!(ingestor.ingest(&archive).unwrap().height(), 1);
    }
}
