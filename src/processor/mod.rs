use std::fmt;
use thiserror::Error;

pub mod column;
pub mod dataset;
pub mod engine;
pub mod results;
pub mod table;
pub mod timestamp;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Missing column '{column}' in {table} input")]
    MissingColumn { table: &'static str, column: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of loading one input file
#[derive(Debug, Default, Clone)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub errors: Vec<ParseError>,
}

/// A row-level problem found while loading.
///
/// `row` is the 1-based record number in the file, counting the header as row 1
/// for CSV input and the first array element as row 1 for JSON input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column.is_empty() {
            write!(f, "row {}: {}", self.row, self.error)
        } else {
            write!(
                f,
                "row {}, column {} ({:?}): {}",
                self.row, self.column, self.value, self.error
            )
        }
    }
}

/// Input encoding of a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Decide by file extension (`.json` is JSON, anything else CSV)
    #[default]
    Auto,
    Csv,
    Json,
}

impl InputFormat {
    pub fn resolve(self, path: &std::path::Path) -> InputFormat {
        match self {
            InputFormat::Auto => {
                let is_json = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if is_json {
                    InputFormat::Json
                } else {
                    InputFormat::Csv
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_auto_format_by_extension() {
        assert_eq!(
            InputFormat::Auto.resolve(Path::new("data/accounts.JSON")),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::Auto.resolve(Path::new("data/accounts.csv")),
            InputFormat::Csv
        );
        assert_eq!(
            InputFormat::Auto.resolve(Path::new("data/accounts")),
            InputFormat::Csv
        );
        assert_eq!(
            InputFormat::Json.resolve(Path::new("data/accounts.csv")),
            InputFormat::Json
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            row: 4,
            column: "case_created_date".to_string(),
            value: "yesterday".to_string(),
            error: "unrecognized timestamp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 4, column case_created_date (\"yesterday\"): unrecognized timestamp"
        );
    }
}
