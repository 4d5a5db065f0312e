//! # case-insights
//!
//! Support-case analytics over two denormalized datasets, accounts and
//! support cases. The crate:
//!
//! - Memory-maps CSV inputs and parses record-aligned chunks in parallel with Rayon
//! - Also reads JSON inputs (records or pandas column orientation)
//! - Stores each table as chunked typed columns, flattened after load
//! - Left-joins cases onto accounts and computes five summary tables
//! - Writes the tables as CSV or JSON for a dashboard renderer
//!
//! # Tables
//!
//! - **industry_performance**: volume, closure rate and mean resolution time per industry
//! - **long_resolution_accounts**: accounts whose closed cases average more than a threshold
//! - **severity_priority_correlation**: case counts per industry, severity and priority
//! - **region_performance**: volume and closure rate per country
//! - **case_trends**: cases opened per calendar month
//!
//! # Example
//!
//! ```rust
//! use case_insights::processor::dataset::{Accounts, SupportCases};
//! use case_insights::processor::engine::AggregationEngine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (accounts, _) = Accounts::from_csv_bytes(
//!         b"account_id,account_name,account_industry,account_country\n1,Acme,Tech,US\n",
//!     )?;
//!     let (cases, _) = SupportCases::from_csv_bytes(
//!         b"case_id,account_id,case_status,case_severity,case_priority,case_created_date,case_closed_date\n\
//!           c1,1,Closed,High,P1,2024-01-01,2024-01-06\n\
//!           c2,1,Closed,Low,P2,2024-01-01,2024-01-16\n",
//!     )?;
//!
//!     let report = AggregationEngine::default().compute_all(&accounts, &cases);
//!     let tech = &report.industry_performance[0];
//!     assert_eq!(tech.total_cases, 2);
//!     assert_eq!(tech.closure_rate, Some(100.0));
//!     assert_eq!(tech.avg_resolution_time, Some(10.0));
//!
//!     Ok(())
//! }
//! ```

mod helpers;

pub mod config;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod synthetic;

pub use config::PipelineConfig;
pub use pipeline::{RunSummary, run};
pub use processor::{InputFormat, ProcessorError};
pub use report::{OutputFormat, ReportWriter, write_report};
