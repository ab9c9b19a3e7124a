//! housing-pipeline - command-line entry point

use clap::Parser;
use housing_pipeline::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "housing_pipeline=info".into()),
        )
        .init();

    let cli = Cli::parse();
    cli.execute()
}
