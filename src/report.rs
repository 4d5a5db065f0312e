//! Persists the result tables for the dashboard renderer.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::processor::{
    ProcessorError,
    results::{AnalyticsReport, Field, ResultRow},
};

/// Output encoding of the result tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Writes each result table to `<dir>/<table>.<ext>`
///
/// Null grouping keys are written as `unknown_label`. A key whose actual value
/// equals the label is indistinguishable from the null group in the output;
/// an empty label keeps them apart in CSV, and such collisions are logged.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    format: OutputFormat,
    unknown_label: String,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat, unknown_label: impl Into<String>) -> Self {
        ReportWriter {
            dir: dir.into(),
            format,
            unknown_label: unknown_label.into(),
        }
    }

    /// Writes all five tables, creating the output directory when missing.
    /// Returns the written paths in table order.
    pub fn write(&self, report: &AnalyticsReport) -> Result<Vec<PathBuf>, ProcessorError> {
        fs::create_dir_all(&self.dir)?;

        Ok(vec![
            self.write_table(&report.industry_performance)?,
            self.write_table(&report.long_resolution_accounts)?,
            self.write_table(&report.severity_priority_correlation)?,
            self.write_table(&report.region_performance)?,
            self.write_table(&report.case_trends)?,
        ])
    }

    pub fn path_for<R: ResultRow>(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", R::TABLE, self.format.extension()))
    }

    fn write_table<R: ResultRow>(&self, rows: &[R]) -> Result<PathBuf, ProcessorError> {
        let path = self.path_for::<R>();
        let mut out = BufWriter::new(File::create(&path)?);

        match self.format {
            OutputFormat::Csv => self.render_csv(rows, &mut out)?,
            OutputFormat::Json => self.render_json(rows, &mut out)?,
        }
        out.flush()?;

        if self.label_collides(rows) {
            warn!(
                table = R::TABLE,
                label = %self.unknown_label,
                "a grouping key equals the unknown label and shares its rendering with null keys"
            );
        }

        info!(table = R::TABLE, rows = rows.len(), path = %path.display(), "wrote table");
        Ok(path)
    }

    /// Header row, then one record per result row. Null keys use the unknown
    /// label, null metrics are empty fields.
    pub fn render_csv<R: ResultRow, W: Write>(&self, rows: &[R], out: W) -> Result<(), ProcessorError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(R::COLUMNS)?;

        for row in rows {
            let record: Vec<String> = row
                .fields()
                .into_iter()
                .map(|field| self.field_text(field))
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Pretty-printed array of objects keyed by column name
    pub fn render_json<R: ResultRow, W: Write>(&self, rows: &[R], mut out: W) -> Result<(), ProcessorError> {
        let records: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = R::COLUMNS
                    .iter()
                    .zip(row.fields())
                    .map(|(name, field)| (name.to_string(), self.field_json(field)))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();

        serde_json::to_writer_pretty(&mut out, &records)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn label_collides<R: ResultRow>(&self, rows: &[R]) -> bool {
        !self.unknown_label.is_empty()
            && rows.iter().any(|row| {
                row.fields()
                    .iter()
                    .any(|field| *field == Field::Key(Some(self.unknown_label.as_str())))
            })
    }

    fn field_text(&self, field: Field<'_>) -> String {
        match field {
            Field::Key(Some(key)) => key.to_string(),
            Field::Key(None) => self.unknown_label.clone(),
            Field::Count(count) => count.to_string(),
            Field::Metric(Some(value)) => format_float(value),
            Field::Metric(None) => String::new(),
        }
    }

    fn field_json(&self, field: Field<'_>) -> serde_json::Value {
        match field {
            Field::Key(Some(key)) => serde_json::Value::String(key.to_string()),
            Field::Key(None) => serde_json::Value::String(self.unknown_label.clone()),
            Field::Count(count) => serde_json::Value::from(count),
            Field::Metric(Some(value)) => serde_json::Number::from_f64(value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Field::Metric(None) => serde_json::Value::Null,
        }
    }
}

/// Writes the five result tables of `report` into `dir`
pub fn write_report(
    report: &AnalyticsReport,
    dir: &Path,
    format: OutputFormat,
    unknown_label: &str,
) -> Result<Vec<PathBuf>, ProcessorError> {
    ReportWriter::new(dir, format, unknown_label).write(report)
}

/// Shortest round-trip form that always keeps a decimal point (`10.0`, `33.33`)
fn format_float(value: f64) -> String {
    format!("{:?}", value)
}
