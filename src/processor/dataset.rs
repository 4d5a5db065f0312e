use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::processor::{
    InputFormat, ParseSummary, ProcessorError,
    column::{ColumnSpec, ColumnType, TableSchema},
    table::Table,
};

pub static ACCOUNT_SCHEMA: TableSchema = TableSchema {
    name: "accounts",
    columns: &[
        ColumnSpec {
            name: "account_id",
            aliases: &["account_sfid"],
            column_type: ColumnType::Str,
            required: true,
        },
        ColumnSpec {
            name: "account_name",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "account_industry",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "account_country",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
    ],
};

pub static CASE_SCHEMA: TableSchema = TableSchema {
    name: "support_cases",
    columns: &[
        ColumnSpec {
            name: "case_id",
            aliases: &["case_sfid"],
            column_type: ColumnType::Str,
            required: true,
        },
        ColumnSpec {
            name: "account_id",
            aliases: &["account_sfid"],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "case_status",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "case_severity",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "case_priority",
            aliases: &[],
            column_type: ColumnType::Str,
            required: false,
        },
        ColumnSpec {
            name: "case_created_date",
            aliases: &[],
            column_type: ColumnType::Timestamp,
            required: false,
        },
        ColumnSpec {
            name: "case_closed_date",
            aliases: &[],
            column_type: ColumnType::Timestamp,
            required: false,
        },
    ],
};

/// Borrowed view of one account row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account<'a> {
    pub account_id: &'a str,
    pub account_name: Option<&'a str>,
    pub account_industry: Option<&'a str>,
    pub account_country: Option<&'a str>,
}

/// Borrowed view of one support case row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportCase<'a> {
    pub case_id: &'a str,
    pub account_id: Option<&'a str>,
    pub case_status: Option<&'a str>,
    pub case_severity: Option<&'a str>,
    pub case_priority: Option<&'a str>,
    pub case_created_date: Option<NaiveDateTime>,
    pub case_closed_date: Option<NaiveDateTime>,
}

impl SupportCase<'_> {
    /// Days from creation to closure, when both are known
    pub fn resolution_days(&self) -> Option<f64> {
        match (self.case_created_date, self.case_closed_date) {
            (Some(created), Some(closed)) => {
                Some(crate::processor::timestamp::days_between(created, closed))
            }
            _ => None,
        }
    }
}

/// The accounts dataset
#[derive(Debug)]
pub struct Accounts {
    table: Table,
}

/// The support cases dataset
#[derive(Debug)]
pub struct SupportCases {
    table: Table,
}

macro_rules! dataset_loaders {
    ($ty:ident, $schema:expr) => {
        impl $ty {
            /// Loads the dataset from `path`
            pub fn load(path: &Path, format: InputFormat) -> Result<(Self, ParseSummary), ProcessorError> {
                let mut table = Table::new(&$schema);
                let summary = table.load(path, format)?;
                log_summary($schema.name, Some(path), &summary);
                Ok((Self { table }, summary))
            }

            /// Loads the dataset from CSV text
            pub fn from_csv_bytes(buf: &[u8]) -> Result<(Self, ParseSummary), ProcessorError> {
                let mut table = Table::new(&$schema);
                let summary = table.load_csv_bytes(buf)?;
                log_summary($schema.name, None, &summary);
                Ok((Self { table }, summary))
            }

            /// Loads the dataset from JSON text
            pub fn from_json_bytes(buf: &[u8]) -> Result<(Self, ParseSummary), ProcessorError> {
                let mut table = Table::new(&$schema);
                let summary = table.load_json_bytes(buf)?;
                log_summary($schema.name, None, &summary);
                Ok((Self { table }, summary))
            }

            pub fn len(&self) -> usize {
                self.table.row_count()
            }

            pub fn is_empty(&self) -> bool {
                self.table.row_count() == 0
            }

            pub fn table(&self) -> &Table {
                &self.table
            }
        }
    };
}

dataset_loaders!(Accounts, ACCOUNT_SCHEMA);
dataset_loaders!(SupportCases, CASE_SCHEMA);

impl Accounts {
    pub fn iter(&self) -> impl Iterator<Item = Account<'_>> + '_ {
        let ids = self.str_column("account_id");
        let names = self.str_column("account_name");
        let industries = self.str_column("account_industry");
        let countries = self.str_column("account_country");

        (0..self.table.row_count()).map(move |i| Account {
            account_id: ids[i].as_deref().unwrap_or_default(),
            account_name: names[i].as_deref(),
            account_industry: industries[i].as_deref(),
            account_country: countries[i].as_deref(),
        })
    }

    fn str_column(&self, name: &str) -> &[Option<String>] {
        self.table
            .get_col(name)
            .map(|c| c.as_str_slice())
            .unwrap_or(&[])
    }
}

impl SupportCases {
    pub fn iter(&self) -> impl Iterator<Item = SupportCase<'_>> + '_ {
        let ids = self.str_column("case_id");
        let account_ids = self.str_column("account_id");
        let statuses = self.str_column("case_status");
        let severities = self.str_column("case_severity");
        let priorities = self.str_column("case_priority");
        let created = self.timestamp_column("case_created_date");
        let closed = self.timestamp_column("case_closed_date");

        (0..self.table.row_count()).map(move |i| SupportCase {
            case_id: ids[i].as_deref().unwrap_or_default(),
            account_id: account_ids[i].as_deref(),
            case_status: statuses[i].as_deref(),
            case_severity: severities[i].as_deref(),
            case_priority: priorities[i].as_deref(),
            case_created_date: created[i],
            case_closed_date: closed[i],
        })
    }

    fn str_column(&self, name: &str) -> &[Option<String>] {
        self.table
            .get_col(name)
            .map(|c| c.as_str_slice())
            .unwrap_or(&[])
    }

    fn timestamp_column(&self, name: &str) -> &[Option<NaiveDateTime>] {
        self.table
            .get_col(name)
            .map(|c| c.as_timestamp_slice())
            .unwrap_or(&[])
    }
}

fn log_summary(name: &str, path: Option<&Path>, summary: &ParseSummary) {
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string());

    info!(
        dataset = name,
        source = %source,
        rows = summary.rows_processed,
        "loaded dataset"
    );

    if summary.rows_skipped > 0 {
        warn!(
            dataset = name,
            skipped = summary.rows_skipped,
            "skipped malformed rows"
        );
    }

    for err in &summary.errors {
        debug!(dataset = name, "{}", err);
    }
}
