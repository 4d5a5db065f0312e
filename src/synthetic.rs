//! Seeded synthetic accounts and support cases, used by the data generator,
//! the benchmarks and the memory profiler.

use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::processor::ProcessorError;

const INDUSTRIES: [&str; 6] = [
    "Technology",
    "Healthcare",
    "Finance",
    "Retail",
    "Manufacturing",
    "Education",
];
const COUNTRIES: [&str; 6] = ["US", "DE", "UK", "IN", "BR", "JP"];
const SEVERITIES: [&str; 4] = ["Critical", "High", "Medium", "Low"];
const PRIORITIES: [&str; 3] = ["P1", "P2", "P3"];
const OPEN_STATUSES: [&str; 3] = ["New", "In Progress", "Escalated"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape of a generated dataset. The same settings always produce the same
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticData {
    pub accounts: usize,
    pub cases: usize,
    pub seed: u64,
    /// Share of cases whose account id matches no account
    pub orphan_ratio: f64,
    /// Share of cases that are closed
    pub closed_ratio: f64,
}

impl Default for SyntheticData {
    fn default() -> Self {
        SyntheticData {
            accounts: 1_000,
            cases: 20_000,
            seed: 42,
            orphan_ratio: 0.01,
            closed_ratio: 0.7,
        }
    }
}

impl SyntheticData {
    pub fn new(accounts: usize, cases: usize) -> Self {
        SyntheticData {
            accounts,
            cases,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Writes the accounts table as CSV
    pub fn write_accounts<W: Write>(&self, out: W) -> Result<(), ProcessorError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record([
            "account_id",
            "account_name",
            "account_industry",
            "account_country",
        ])?;

        for i in 0..self.accounts {
            let id = account_id(i);
            let name = format!("Account {}", i);
            // a few accounts without an industry or country
            let industry = if rng.random_bool(0.02) {
                ""
            } else {
                INDUSTRIES[rng.random_range(0..INDUSTRIES.len())]
            };
            let country = if rng.random_bool(0.02) {
                ""
            } else {
                COUNTRIES[rng.random_range(0..COUNTRIES.len())]
            };
            writer.write_record([id.as_str(), name.as_str(), industry, country])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Writes the support cases table as CSV
    pub fn write_cases<W: Write>(&self, out: W) -> Result<(), ProcessorError> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record([
            "case_id",
            "account_id",
            "case_status",
            "case_severity",
            "case_priority",
            "case_created_date",
            "case_closed_date",
        ])?;

        let epoch = base_time();
        for i in 0..self.cases {
            let case_id = format!("CASE-{:08}", i);
            let account = if self.accounts == 0 || rng.random_bool(self.orphan_ratio) {
                format!("ORPHAN-{:06}", rng.random_range(0..1_000u32))
            } else {
                account_id(rng.random_range(0..self.accounts))
            };

            let created = epoch + Duration::seconds(rng.random_range(0..730 * 86_400i64));
            let (status, closed) = if rng.random_bool(self.closed_ratio) {
                let hours = rng.random_range(1..30 * 24i64);
                ("Closed", Some(created + Duration::hours(hours)))
            } else {
                (OPEN_STATUSES[rng.random_range(0..OPEN_STATUSES.len())], None)
            };

            let created_text = created.format(TIMESTAMP_FORMAT).to_string();
            let closed_text = closed
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();

            writer.write_record([
                case_id.as_str(),
                account.as_str(),
                status,
                SEVERITIES[rng.random_range(0..SEVERITIES.len())],
                PRIORITIES[rng.random_range(0..PRIORITIES.len())],
                created_text.as_str(),
                closed_text.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Both tables rendered into memory, `(accounts, cases)`
    pub fn to_csv_bytes(&self) -> Result<(Vec<u8>, Vec<u8>), ProcessorError> {
        let mut accounts = Vec::new();
        let mut cases = Vec::new();
        self.write_accounts(&mut accounts)?;
        self.write_cases(&mut cases)?;
        Ok((accounts, cases))
    }
}

fn account_id(i: usize) -> String {
    format!("ACC-{:06}", i)
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::dataset::{Accounts, SupportCases};

    #[test]
    fn test_generated_data_loads() {
        let data = SyntheticData::new(50, 400);
        let (accounts_csv, cases_csv) = data.to_csv_bytes().unwrap();

        let (accounts, account_summary) = Accounts::from_csv_bytes(&accounts_csv).unwrap();
        let (cases, case_summary) = SupportCases::from_csv_bytes(&cases_csv).unwrap();
        assert_eq!(accounts.len(), 50);
        assert_eq!(cases.len(), 400);
        assert_eq!(account_summary.rows_skipped, 0);
        assert!(case_summary.errors.is_empty());

        for case in cases.iter() {
            match case.case_status {
                Some("Closed") => assert!(case.resolution_days().is_some_and(|d| d > 0.0)),
                _ => assert!(case.case_closed_date.is_none()),
            }
        }
    }

    #[test]
    fn test_same_seed_same_bytes() {
        let a = SyntheticData::new(20, 100).to_csv_bytes().unwrap();
        let b = SyntheticData::new(20, 100).to_csv_bytes().unwrap();
        let c = SyntheticData::new(20, 100).with_seed(7).to_csv_bytes().unwrap();
        assert_eq!(a, b);
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_no_accounts_makes_all_cases_orphans() {
        let data = SyntheticData::new(0, 10);
        let (_, cases_csv) = data.to_csv_bytes().unwrap();
        let (cases, _) = SupportCases::from_csv_bytes(&cases_csv).unwrap();
        assert!(
            cases
                .iter()
                .all(|c| c.account_id.is_some_and(|id| id.starts_with("ORPHAN-")))
        );
    }
}
