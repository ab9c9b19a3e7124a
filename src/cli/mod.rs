//! Command-line interface
//!
//! Subcommands for a full training run and the exploratory stages.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::{
    BivariateAnalyzer, CategoricalUnivariateAnalysis, CategoricalVsNumericalAnalysis,
    MissingValuesAnalysis, MultivariateAnalysis, NumericalUnivariateAnalysis,
    NumericalVsNumericalAnalysis, SimpleMissingValuesAnalysis, SimpleMultivariateAnalysis,
    TerminalRenderer, UnivariateAnalyzer,
};
use crate::config::PipelineConfig;
use crate::ingestion::{DataIngestorFactory, DEFAULT_EXTRACT_DIR};
use crate::inspection::{DataInspector, DataTypesInspection, SummaryStatisticsInspection};
use crate::pipeline::PipelineDriver;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("  {} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "housing-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "House price prediction pipeline: ingest, explore, clean, engineer, train, evaluate")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory archives are extracted into
    #[arg(long, global = true, default_value = DEFAULT_EXTRACT_DIR)]
    pub extract_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full training pipeline
    Run {
        /// Zip archive holding one CSV file
        #[arg(short, long)]
        archive: PathBuf,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target column (overrides the config)
        #[arg(short, long)]
        target: Option<String>,

        /// Fraction of rows held out for testing (overrides the config)
        #[arg(long)]
        test_size: Option<f64>,

        /// Shuffle seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show column types and, optionally, summary statistics
    Inspect {
        #[arg(short, long)]
        archive: PathBuf,

        /// Also print numeric and categorical summaries
        #[arg(long)]
        summary: bool,
    },

    /// Plot one feature, or one feature against another
    Analyze {
        #[arg(short, long)]
        archive: PathBuf,

        /// Feature to plot (the category axis when --against and --categorical are set)
        #[arg(short, long)]
        feature: String,

        /// Numeric feature to plot against
        #[arg(long)]
        against: Option<String>,

        /// Treat --feature as categorical
        #[arg(long)]
        categorical: bool,
    },

    /// Correlation heatmap and pair plot of numeric features
    Correlate {
        #[arg(short, long)]
        archive: PathBuf,
    },

    /// Missing-value counts and heatmap
    Missing {
        #[arg(short, long)]
        archive: PathBuf,
    },
}

impl Cli {
    /// Dispatch the parsed subcommand
    pub fn execute(&self) -> anyhow::Result<()> {
        let extract_dir = self.extract_dir.as_path();
        match &self.command {
            Commands::Run {
                archive,
                config,
                target,
                test_size,
                seed,
            } => cmd_run(
                archive,
                extract_dir,
                config.as_deref(),
                target.as_deref(),
                *test_size,
                *seed,
            ),
            Commands::Inspect { archive, summary } => cmd_inspect(archive, extract_dir, *summary),
            Commands::Analyze {
                archive,
                feature,
                against,
                categorical,
            } => cmd_analyze(archive, extract_dir, feature, against.as_deref(), *categorical),
            Commands::Correlate { archive } => cmd_correlate(archive, extract_dir),
            Commands::Missing { archive } => cmd_missing(archive, extract_dir),
        }
    }
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_archive(archive: &Path, extract_dir: &Path) -> anyhow::Result<DataFrame> {
    step_run(&format!("Loading {}", archive.display()));
    let start = Instant::now();
    let ingestor = DataIngestorFactory::for_path_in(archive, extract_dir)?;
    let df = ingestor.ingest(archive)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));
    Ok(df)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(
    archive: &Path,
    extract_dir: &Path,
    config_path: Option<&Path>,
    target: Option<&str>,
    test_size: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    section("Run");

    let mut config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    config = config.with_extract_dir(extract_dir);
    if let Some(target) = target {
        config = config.with_target(target);
    }
    if let Some(test_size) = test_size {
        config = config.with_test_size(test_size);
    }
    if let Some(seed) = seed {
        config = config.with_random_state(seed);
    }

    println!("  {}", kv("target     ", &config.target));
    println!("  {}", kv("test size  ", &config.split.test_size.to_string()));
    println!("  {}", kv("seed       ", &config.split.random_state.to_string()));
    println!("  {}", kv("fe steps   ", &config.feature_engineering.len().to_string()));

    let driver = PipelineDriver::new(config)?;
    step_run("Running pipeline");
    let start = Instant::now();
    let outcome = driver.run(archive)?;
    step_done(&format!("{:?}", start.elapsed()));

    section("Results");
    println!("  {}", kv("train rows ", &outcome.train_rows.to_string()));
    println!("  {}", kv("test rows  ", &outcome.test_rows.to_string()));
    println!("  {}", kv("features   ", &outcome.features.len().to_string()));
    for (name, value) in outcome.metrics.iter() {
        println!("  {}", kv(&format!("{:<11}", name), &format!("{:.4}", value).cyan().to_string()));
    }
    println!();
    Ok(())
}

pub fn cmd_inspect(archive: &Path, extract_dir: &Path, summary: bool) -> anyhow::Result<()> {
    section("Inspect");
    let df = load_archive(archive, extract_dir)?;

    let mut inspector = DataInspector::new(DataTypesInspection)?;
    inspector.execute_strategy(&df)?;
    if summary {
        inspector.set_strategy(SummaryStatisticsInspection)?;
        inspector.execute_strategy(&df)?;
    }
    Ok(())
}

pub fn cmd_analyze(
    archive: &Path,
    extract_dir: &Path,
    feature: &str,
    against: Option<&str>,
    categorical: bool,
) -> anyhow::Result<()> {
    section("Analyze");
    let df = load_archive(archive, extract_dir)?;
    let mut renderer = TerminalRenderer::stdout();

    match (against, categorical) {
        (None, false) => UnivariateAnalyzer::new(NumericalUnivariateAnalysis::new())?
            .execute_strategy(&df, feature, &mut renderer)?,
        (None, true) => UnivariateAnalyzer::new(CategoricalUnivariateAnalysis)?
            .execute_strategy(&df, feature, &mut renderer)?,
        (Some(other), false) => BivariateAnalyzer::new(NumericalVsNumericalAnalysis)?
            .execute_strategy(&df, feature, other, &mut renderer)?,
        (Some(other), true) => BivariateAnalyzer::new(CategoricalVsNumericalAnalysis)?
            .execute_strategy(&df, feature, other, &mut renderer)?,
    }
    Ok(())
}

pub fn cmd_correlate(archive: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    section("Correlate");
    let df = load_archive(archive, extract_dir)?;
    SimpleMultivariateAnalysis::new().analyze(&df, &mut TerminalRenderer::stdout())?;
    Ok(())
}

pub fn cmd_missing(archive: &Path, extract_dir: &Path) -> anyhow::Result<()> {
    section("Missing values");
    let df = load_archive(archive, extract_dir)?;
    let counts = SimpleMissingValuesAnalysis.analyze(&df, &mut TerminalRenderer::stdout())?;
    if counts.is_empty() {
        println!("  {} no missing values", ok("✓"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "housing-pipeline",
            "run",
            "--archive",
            "data/archive.zip",
            "--test-size",
            "0.3",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.extract_dir, PathBuf::from("extracted_data"));
        match cli.command {
            Commands::Run {
                archive,
                test_size,
                seed,
                config,
                ..
            } => {
                assert_eq!(archive, PathBuf::from("data/archive.zip"));
                assert_eq!(test_size, Some(0.3));
                assert_eq!(seed, Some(7));
                assert!(config.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "housing-pipeline",
            "analyze",
            "-a",
            "a.zip",
            "-f",
            "Overall Qual",
            "--against",
            "SalePrice",
            "--categorical",
            "--extract-dir",
            "tmp",
        ])
        .unwrap();
        assert_eq!(cli.extract_dir, PathBuf::from("tmp"));
        assert!(matches!(
            cli.command,
            Commands::Analyze { categorical: true, against: Some(_), .. }
        ));
    }

    #[test]
    fn test_analyze_requires_feature() {
        assert!(Cli::try_parse_from(["housing-pipeline", "analyze", "-a", "a.zip"]).is_err());
    }
}
