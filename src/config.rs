//! Pipeline configuration, read from an optional TOML file.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the binary.

use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::{
    processor::{
        InputFormat, ProcessorError,
        engine::{EngineOptions, OrphanCases},
    },
    report::OutputFormat,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Parser worker threads; the global rayon pool when unset
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default = "default_accounts_path")]
    pub accounts: PathBuf,

    #[serde(default = "default_cases_path")]
    pub cases: PathBuf,

    #[serde(default)]
    pub format: InputFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    /// Text written in place of a null grouping key
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_closed_status")]
    pub closed_status: String,

    #[serde(default = "default_long_resolution_days")]
    pub long_resolution_days: f64,

    #[serde(default)]
    pub orphan_cases: OrphanCases,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("data/accounts_anonymized.json")
}

fn default_cases_path() -> PathBuf {
    PathBuf::from("data/support_cases_anonymized.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_unknown_label() -> String {
    "Unknown".to_string()
}

fn default_closed_status() -> String {
    "Closed".to_string()
}

fn default_long_resolution_days() -> f64 {
    10.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            accounts: default_accounts_path(),
            cases: default_cases_path(),
            format: InputFormat::Auto,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: default_output_dir(),
            format: OutputFormat::Csv,
            unknown_label: default_unknown_label(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            closed_status: default_closed_status(),
            long_resolution_days: default_long_resolution_days(),
            orphan_cases: OrphanCases::Unknown,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl PipelineConfig {
    /// Reads a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ProcessorError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProcessorError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProcessorError> {
        if !self.analysis.long_resolution_days.is_finite() {
            return Err(ProcessorError::Parse(format!(
                "analysis.long_resolution_days must be finite, got {}",
                self.analysis.long_resolution_days
            )));
        }
        if self.threads == Some(0) {
            return Err(ProcessorError::Parse(
                "threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            closed_status: self.analysis.closed_status.clone(),
            long_resolution_days: self.analysis.long_resolution_days,
            orphan_cases: self.analysis.orphan_cases,
        }
    }
}
