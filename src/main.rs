use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use case_insights::{
    InputFormat, OutputFormat, PipelineConfig,
    processor::engine::OrphanCases,
};

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Aggregates accounts and support cases into dashboard-ready summary tables
#[derive(Debug, Parser)]
#[command(name = "case-insights", version)]
#[command(about = "Support-case analytics over accounts and cases datasets", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Accounts dataset (CSV or JSON)
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Support cases dataset (CSV or JSON)
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Directory the result tables are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,

    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    /// What to do with cases that reference no known account
    #[arg(long, value_enum)]
    orphan_cases: Option<OrphanCases>,

    /// Parser worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Log filter, e.g. `info` or `case_insights=debug`
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(accounts) = self.accounts {
            config.input.accounts = accounts;
        }
        if let Some(cases) = self.cases {
            config.input.cases = cases;
        }
        if let Some(format) = self.input_format {
            config.input.format = format;
        }
        if let Some(dir) = self.output_dir {
            config.output.dir = dir;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
        if let Some(policy) = self.orphan_cases {
            config.analysis.orphan_cases = policy;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.logging.level);

    let summary = case_insights::run(&config).with_context(|| {
        format!(
            "pipeline failed for {} and {}",
            config.input.accounts.display(),
            config.input.cases.display()
        )
    })?;

    let skipped = summary.accounts.rows_skipped + summary.cases.rows_skipped;
    if skipped > 0 {
        warn!(skipped, "some input rows were skipped, rerun with debug logging for details");
    }
    for path in &summary.outputs {
        info!(path = %path.display(), "output ready");
    }

    Ok(())
}
