use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use tracing::{debug, info_span};

use crate::{
    helpers::simd_helpers::{mean_f64, round2},
    processor::{
        dataset::{Account, Accounts, SupportCase, SupportCases},
        results::{
            AnalyticsReport, CaseTrend, IndustryPerformance, LongResolutionAccount,
            RegionPerformance, SeverityPriorityCorrelation,
        },
        timestamp::month_key,
    },
};

/// What happens to cases whose account id is null or matches no account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrphanCases {
    /// Count them under the null account group
    #[default]
    Unknown,
    /// Leave them out of every account-keyed table
    Drop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Status value that marks a case as closed
    pub closed_status: String,
    /// Accounts must average strictly more than this many days to be listed
    pub long_resolution_days: f64,
    pub orphan_cases: OrphanCases,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            closed_status: "Closed".to_string(),
            long_resolution_days: 10.0,
            orphan_cases: OrphanCases::Unknown,
        }
    }
}

/// One row of the accounts ⟕ cases join.
///
/// `account` is `None` for orphan cases, `case` is `None` for an account with
/// no (matching) cases.
#[derive(Debug, Clone, Copy)]
struct JoinedRow<'a> {
    account: Option<Account<'a>>,
    case: Option<SupportCase<'a>>,
}

impl<'a> JoinedRow<'a> {
    fn industry(&self) -> Option<&'a str> {
        self.account.and_then(|a| a.account_industry)
    }

    fn country(&self) -> Option<&'a str> {
        self.account.and_then(|a| a.account_country)
    }

    fn name(&self) -> Option<&'a str> {
        self.account.and_then(|a| a.account_name)
    }
}

/// Running counts for one group
#[derive(Debug, Default)]
struct CaseTally {
    total: u64,
    closed: u64,
    resolution_days: Vec<f64>,
}

impl CaseTally {
    fn add(&mut self, case: Option<&SupportCase<'_>>, closed_status: &str) {
        let Some(case) = case else {
            return;
        };
        self.total += 1;
        if case.case_status == Some(closed_status) {
            self.closed += 1;
        }
        if let Some(days) = case.resolution_days() {
            self.resolution_days.push(days);
        }
    }

    fn closure_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| round2(100.0 * self.closed as f64 / self.total as f64))
    }

    fn avg_resolution_time(&self) -> Option<f64> {
        mean_f64(&self.resolution_days)
    }
}

fn owned(key: Option<&str>) -> Option<String> {
    key.map(str::to_string)
}

/// Computes the five dashboard tables from the loaded datasets.
///
/// Every operation is a pure function of its inputs; ties in the requested
/// order are broken by the grouping key (null first) so repeated runs produce
/// identical tables.
///
/// # Example
/// ```rust
/// # use case_insights::processor::{dataset::{Accounts, SupportCases}, engine::AggregationEngine};
/// let (accounts, _) = Accounts::from_csv_bytes(
///     b"account_id,account_name,account_industry,account_country\n1,Acme,Tech,US\n",
/// ).unwrap();
/// let (cases, _) = SupportCases::from_csv_bytes(
///     b"case_id,account_id,case_status,case_severity,case_priority,case_created_date,case_closed_date\n\
///       c1,1,Closed,High,P1,2024-01-01,2024-01-06\n\
///       c2,1,Closed,Low,P2,2024-01-01,2024-01-16\n",
/// ).unwrap();
///
/// let engine = AggregationEngine::default();
/// let tech = &engine.compute_industry_performance(&accounts, &cases)[0];
/// assert_eq!(tech.total_cases, 2);
/// assert_eq!(tech.closure_rate, Some(100.0));
/// assert_eq!(tech.avg_resolution_time, Some(10.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    options: EngineOptions,
}

impl AggregationEngine {
    pub fn new(options: EngineOptions) -> Self {
        AggregationEngine { options }
    }

    /// Runs all five aggregations
    pub fn compute_all(&self, accounts: &Accounts, cases: &SupportCases) -> AnalyticsReport {
        let _span = info_span!("aggregate", accounts = accounts.len(), cases = cases.len()).entered();

        AnalyticsReport {
            industry_performance: self.compute_industry_performance(accounts, cases),
            long_resolution_accounts: self.compute_long_resolution_accounts(accounts, cases),
            severity_priority_correlation: self
                .compute_severity_priority_correlation(accounts, cases),
            region_performance: self.compute_region_performance(accounts, cases),
            case_trends: self.compute_case_trends(cases),
        }
    }

    /// Cases, closures, closure rate and mean resolution time per industry,
    /// busiest industry first
    pub fn compute_industry_performance(
        &self,
        accounts: &Accounts,
        cases: &SupportCases,
    ) -> Vec<IndustryPerformance> {
        let mut groups: HashMap<Option<&str>, CaseTally> = HashMap::new();
        for row in self.left_join(accounts, cases, |_| true) {
            groups
                .entry(row.industry())
                .or_default()
                .add(row.case.as_ref(), &self.options.closed_status);
        }

        let mut out: Vec<IndustryPerformance> = groups
            .into_iter()
            .map(|(industry, tally)| IndustryPerformance {
                account_industry: owned(industry),
                total_cases: tally.total,
                closed_cases: tally.closed,
                closure_rate: tally.closure_rate(),
                avg_resolution_time: tally.avg_resolution_time(),
            })
            .collect();

        out.sort_by(|a, b| {
            b.total_cases
                .cmp(&a.total_cases)
                .then_with(|| a.account_industry.cmp(&b.account_industry))
        });
        out
    }

    /// Accounts whose closed cases took longer than the threshold on average,
    /// slowest first
    pub fn compute_long_resolution_accounts(
        &self,
        accounts: &Accounts,
        cases: &SupportCases,
    ) -> Vec<LongResolutionAccount> {
        let mut groups: HashMap<(Option<&str>, Option<&str>), CaseTally> = HashMap::new();
        let closed_only = |case: &SupportCase<'_>| case.case_closed_date.is_some();

        for row in self.left_join(accounts, cases, closed_only) {
            // accounts without a closed case fall out, as with a WHERE on the case side
            if row.case.is_none() {
                continue;
            }
            groups
                .entry((row.name(), row.country()))
                .or_default()
                .add(row.case.as_ref(), &self.options.closed_status);
        }

        let threshold = self.options.long_resolution_days;
        let mut out: Vec<LongResolutionAccount> = groups
            .into_iter()
            .filter_map(|((name, country), tally)| {
                let avg = tally.avg_resolution_time()?;
                (avg > threshold).then(|| LongResolutionAccount {
                    account_name: owned(name),
                    account_country: owned(country),
                    avg_resolution_time: avg,
                    total_cases: tally.total,
                })
            })
            .collect();

        out.sort_by(|a, b| {
            b.avg_resolution_time
                .total_cmp(&a.avg_resolution_time)
                .then_with(|| a.account_name.cmp(&b.account_name))
                .then_with(|| a.account_country.cmp(&b.account_country))
        });
        out
    }

    /// Case counts per (industry, severity, priority)
    pub fn compute_severity_priority_correlation(
        &self,
        accounts: &Accounts,
        cases: &SupportCases,
    ) -> Vec<SeverityPriorityCorrelation> {
        type Key<'k> = (Option<&'k str>, Option<&'k str>, Option<&'k str>);
        let mut groups: HashMap<Key<'_>, u64> = HashMap::new();

        for row in self.left_join(accounts, cases, |_| true) {
            let key = (
                row.industry(),
                row.case.and_then(|c| c.case_severity),
                row.case.and_then(|c| c.case_priority),
            );
            *groups.entry(key).or_default() += u64::from(row.case.is_some());
        }

        let mut out: Vec<SeverityPriorityCorrelation> = groups
            .into_iter()
            .map(|((industry, severity, priority), count)| SeverityPriorityCorrelation {
                account_industry: owned(industry),
                case_severity: owned(severity),
                case_priority: owned(priority),
                case_count: count,
            })
            .collect();

        out.sort_by(|a, b| {
            a.account_industry
                .cmp(&b.account_industry)
                .then_with(|| b.case_count.cmp(&a.case_count))
                .then_with(|| a.case_severity.cmp(&b.case_severity))
                .then_with(|| a.case_priority.cmp(&b.case_priority))
        });
        out
    }

    /// Cases, closures and closure rate per country, busiest country first
    pub fn compute_region_performance(
        &self,
        accounts: &Accounts,
        cases: &SupportCases,
    ) -> Vec<RegionPerformance> {
        let mut groups: HashMap<Option<&str>, CaseTally> = HashMap::new();
        for row in self.left_join(accounts, cases, |_| true) {
            groups
                .entry(row.country())
                .or_default()
                .add(row.case.as_ref(), &self.options.closed_status);
        }

        let mut out: Vec<RegionPerformance> = groups
            .into_iter()
            .map(|(country, tally)| RegionPerformance {
                account_country: owned(country),
                total_cases: tally.total,
                closed_cases: tally.closed,
                closure_rate: tally.closure_rate(),
            })
            .collect();

        out.sort_by(|a, b| {
            b.total_cases
                .cmp(&a.total_cases)
                .then_with(|| a.account_country.cmp(&b.account_country))
        });
        out
    }

    /// Cases opened per calendar month, oldest month first.
    ///
    /// Only the cases table is involved, so the orphan policy does not apply.
    /// Cases without a creation timestamp share the null month, listed first.
    pub fn compute_case_trends(&self, cases: &SupportCases) -> Vec<CaseTrend> {
        let mut months: BTreeMap<Option<String>, u64> = BTreeMap::new();
        for case in cases.iter() {
            *months.entry(case.case_created_date.map(month_key)).or_default() += 1;
        }

        if let Some(&undated) = months.get(&None) {
            debug!(undated, "cases without a creation date grouped under the null month");
        }

        months
            .into_iter()
            .map(|(case_month, total_cases)| CaseTrend {
                case_month,
                total_cases,
            })
            .collect()
    }

    /// Left outer join of accounts to the cases accepted by `case_filter`.
    ///
    /// Every account appears at least once. Accepted cases whose account id is
    /// null or unknown are appended with no account unless the orphan policy
    /// drops them.
    fn left_join<'a>(
        &self,
        accounts: &'a Accounts,
        cases: &'a SupportCases,
        case_filter: impl Fn(&SupportCase<'a>) -> bool,
    ) -> Vec<JoinedRow<'a>> {
        let known_ids: HashSet<&str> = accounts.iter().map(|a| a.account_id).collect();

        let mut by_account: HashMap<&'a str, Vec<SupportCase<'a>>> = HashMap::new();
        let mut orphans: Vec<SupportCase<'a>> = Vec::new();

        for case in cases.iter().filter(|c| case_filter(c)) {
            match case.account_id {
                Some(id) if known_ids.contains(id) => by_account.entry(id).or_default().push(case),
                _ => orphans.push(case),
            }
        }

        let mut rows = Vec::with_capacity(accounts.len() + cases.len());
        for account in accounts.iter() {
            match by_account.get(account.account_id) {
                Some(matched) => rows.extend(matched.iter().map(|case| JoinedRow {
                    account: Some(account),
                    case: Some(*case),
                })),
                None => rows.push(JoinedRow {
                    account: Some(account),
                    case: None,
                }),
            }
        }

        match self.options.orphan_cases {
            OrphanCases::Unknown => rows.extend(orphans.into_iter().map(|case| JoinedRow {
                account: None,
                case: Some(case),
            })),
            OrphanCases::Drop => {
                if !orphans.is_empty() {
                    debug!(dropped = orphans.len(), "orphan cases left out of account rollups");
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNTS_HEADER: &str = "account_id,account_name,account_industry,account_country\n";
    const CASES_HEADER: &str = "case_id,account_id,case_status,case_severity,case_priority,case_created_date,case_closed_date\n";

    fn datasets(accounts: &str, cases: &str) -> (Accounts, SupportCases) {
        let (a, _) = Accounts::from_csv_bytes(format!("{ACCOUNTS_HEADER}{accounts}").as_bytes()).unwrap();
        let (c, _) = SupportCases::from_csv_bytes(format!("{CASES_HEADER}{cases}").as_bytes()).unwrap();
        (a, c)
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_industry_performance_example() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n",
            "c1,1,Closed,High,P1,2024-01-01,2024-01-06\n\
             c2,1,Closed,Low,P2,2024-01-01,2024-01-16\n",
        );
        let out = AggregationEngine::default().compute_industry_performance(&accounts, &cases);
        assert_eq!(
            out,
            vec![IndustryPerformance {
                account_industry: s("Tech"),
                total_cases: 2,
                closed_cases: 2,
                closure_rate: Some(100.0),
                avg_resolution_time: Some(10.0),
            }]
        );
    }

    #[test]
    fn test_open_case_counts_but_is_not_averaged() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n",
            "c1,1,Closed,High,P1,2024-01-01,2024-01-05\n\
             c2,1,New,High,P1,2024-01-01,\n\
             c3,1,Working,High,P1,2024-01-01,\n",
        );
        let out = AggregationEngine::default().compute_industry_performance(&accounts, &cases);
        assert_eq!(out[0].total_cases, 3);
        assert_eq!(out[0].closed_cases, 1);
        assert_eq!(out[0].closure_rate, Some(33.33));
        assert_eq!(out[0].avg_resolution_time, Some(4.0));
    }

    #[test]
    fn test_account_without_cases_has_null_metrics() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n2,Shop,Retail,DE\n",
            "c1,1,Closed,High,P1,2024-01-01,2024-01-02\n",
        );
        let engine = AggregationEngine::default();

        let industry = engine.compute_industry_performance(&accounts, &cases);
        assert_eq!(industry.len(), 2);
        assert_eq!(industry[0].account_industry, s("Tech"));
        assert_eq!(
            industry[1],
            IndustryPerformance {
                account_industry: s("Retail"),
                total_cases: 0,
                closed_cases: 0,
                closure_rate: None,
                avg_resolution_time: None,
            }
        );

        let region = engine.compute_region_performance(&accounts, &cases);
        assert_eq!(region[1].account_country, s("DE"));
        assert_eq!(region[1].total_cases, 0);
        assert_eq!(region[1].closure_rate, None);

        let severity = engine.compute_severity_priority_correlation(&accounts, &cases);
        assert!(severity.contains(&SeverityPriorityCorrelation {
            account_industry: s("Retail"),
            case_severity: None,
            case_priority: None,
            case_count: 0,
        }));
    }

    #[test]
    fn test_orphan_cases_unknown_bucket() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n",
            "c1,1,Closed,High,P1,2024-01-01,2024-01-02\n\
             c2,99,Closed,High,P1,2024-01-01,2024-01-30\n\
             c3,,New,Low,P3,2024-01-01,\n",
        );
        let engine = AggregationEngine::default();

        let industry = engine.compute_industry_performance(&accounts, &cases);
        let total: u64 = industry.iter().map(|r| r.total_cases).sum();
        assert_eq!(total, 3);
        let unknown = industry.iter().find(|r| r.account_industry.is_none()).unwrap();
        assert_eq!(unknown.total_cases, 2);
        assert_eq!(unknown.closed_cases, 1);
        assert_eq!(unknown.closure_rate, Some(50.0));
        assert_eq!(unknown.avg_resolution_time, Some(29.0));

        let long = engine.compute_long_resolution_accounts(&accounts, &cases);
        assert_eq!(
            long,
            vec![LongResolutionAccount {
                account_name: None,
                account_country: None,
                avg_resolution_time: 29.0,
                total_cases: 1,
            }]
        );
    }

    #[test]
    fn test_orphan_cases_dropped() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n",
            "c1,1,Closed,High,P1,2024-01-01,2024-01-02\n\
             c2,99,Closed,High,P1,2024-02-01,2024-02-20\n",
        );
        let engine = AggregationEngine::new(EngineOptions {
            orphan_cases: OrphanCases::Drop,
            ..EngineOptions::default()
        });

        let region = engine.compute_region_performance(&accounts, &cases);
        assert_eq!(region.len(), 1);
        assert_eq!(region[0].total_cases, 1);
        assert!(engine.compute_long_resolution_accounts(&accounts, &cases).is_empty());

        // trends are keyed on cases alone
        let trends = engine.compute_case_trends(&cases);
        assert_eq!(trends.iter().map(|t| t.total_cases).sum::<u64>(), 2);
    }

    #[test]
    fn test_long_resolution_threshold_and_order() {
        let (accounts, cases) = datasets(
            "1,Slow,Tech,US\n2,Slower,Tech,FR\n3,Fast,Retail,US\n4,Edge,Retail,DE\n5,Open,Retail,DE\n",
            "a,1,Closed,High,P1,2024-01-01,2024-01-13\n\
             b,1,Closed,High,P1,2024-01-01,2024-01-11\n\
             c,2,Closed,High,P1,2024-01-01,2024-01-31\n\
             d,3,Closed,High,P1,2024-01-01,2024-01-02\n\
             e,4,Closed,High,P1,2024-01-01,2024-01-11\n\
             f,5,New,High,P1,2024-01-01,\n\
             g,1,New,High,P1,2024-01-01,\n",
        );
        let out = AggregationEngine::default().compute_long_resolution_accounts(&accounts, &cases);
        assert_eq!(
            out,
            vec![
                LongResolutionAccount {
                    account_name: s("Slower"),
                    account_country: s("FR"),
                    avg_resolution_time: 30.0,
                    total_cases: 1,
                },
                LongResolutionAccount {
                    account_name: s("Slow"),
                    account_country: s("US"),
                    avg_resolution_time: 11.0,
                    total_cases: 2,
                },
            ]
        );
        assert!(out.iter().all(|r| r.avg_resolution_time > 10.0));
    }

    #[test]
    fn test_long_resolution_groups_by_name_and_country() {
        let (accounts, cases) = datasets(
            "1,Twin,Tech,US\n2,Twin,Tech,US\n3,Twin,Tech,FR\n",
            "a,1,Closed,High,P1,2024-01-01,2024-01-21\n\
             b,2,Closed,High,P1,2024-01-01,2024-01-13\n\
             c,3,Closed,High,P1,2024-01-01,2024-01-31\n",
        );
        let out = AggregationEngine::default().compute_long_resolution_accounts(&accounts, &cases);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].account_country, s("FR"));
        assert_eq!(out[1].account_country, s("US"));
        assert_eq!(out[1].total_cases, 2);
        assert_eq!(out[1].avg_resolution_time, 16.0);
    }

    #[test]
    fn test_closed_date_without_created_date() {
        let (accounts, cases) = datasets(
            "1,Acme,Tech,US\n",
            "a,1,Closed,High,P1,,2024-01-21\n",
        );
        let engine = AggregationEngine::default();
        // closed but not measurable: no average, so not listed
        assert!(engine.compute_long_resolution_accounts(&accounts, &cases).is_empty());
        assert!(engine.compute_case_trends(&cases).is_empty());
        let industry = engine.compute_industry_performance(&accounts, &cases);
        assert_eq!(industry[0].total_cases, 1);
        assert_eq!(industry[0].avg_resolution_time, None);
    }

    #[test]
    fn test_severity_priority_order() {
        let (accounts, cases) = datasets(
            "1,A,Tech,US\n2,B,Finance,US\n",
            "a,1,New,High,P1,2024-01-01,\n\
             b,1,New,Low,P3,2024-01-01,\n\
             c,1,New,Low,P3,2024-01-01,\n\
             d,2,New,High,P1,2024-01-01,\n\
             e,1,New,High,P2,2024-01-01,\n",
        );
        let out = AggregationEngine::default().compute_severity_priority_correlation(&accounts, &cases);
        let flat: Vec<(Option<String>, Option<String>, Option<String>, u64)> = out
            .into_iter()
            .map(|r| (r.account_industry, r.case_severity, r.case_priority, r.case_count))
            .collect();
        assert_eq!(
            flat,
            vec![
                (s("Finance"), s("High"), s("P1"), 1),
                (s("Tech"), s("Low"), s("P3"), 2),
                (s("Tech"), s("High"), s("P1"), 1),
                (s("Tech"), s("High"), s("P2"), 1),
            ]
        );
    }

    #[test]
    fn test_region_performance_order_and_rate() {
        let (accounts, cases) = datasets(
            "1,A,Tech,US\n2,B,Tech,FR\n3,C,Retail,US\n",
            "a,1,Closed,High,P1,2024-01-01,2024-01-02\n\
             b,2,New,High,P1,2024-01-01,\n\
             c,3,New,High,P1,2024-01-01,\n\
             d,3,Closed,High,P1,2024-01-01,2024-01-03\n\
             e,3,closed,High,P1,2024-01-01,\n",
        );
        let out = AggregationEngine::default().compute_region_performance(&accounts, &cases);
        assert_eq!(
            out,
            vec![
                RegionPerformance {
                    account_country: s("US"),
                    total_cases: 4,
                    closed_cases: 2,
                    closure_rate: Some(50.0),
                },
                RegionPerformance {
                    account_country: s("FR"),
                    total_cases: 1,
                    closed_cases: 0,
                    closure_rate: Some(0.0),
                },
            ]
        );
    }

    #[test]
    fn test_case_trends_by_month() {
        let (_, cases) = datasets(
            "",
            "a,1,New,High,P1,2024-02-10,\n\
             b,1,New,High,P1,2023-12-31 23:59:59,\n\
             c,1,New,High,P1,2024-02-01,\n\
             d,1,New,High,P1,,\n\
             e,1,New,High,P1,2024-01-15,\n",
        );
        let out = AggregationEngine::default().compute_case_trends(&cases);
        assert_eq!(
            out,
            vec![
                CaseTrend {
                    case_month: None,
                    total_cases: 1
                },
                CaseTrend {
                    case_month: s("2023-12"),
                    total_cases: 1
                },
                CaseTrend {
                    case_month: s("2024-01"),
                    total_cases: 1
                },
                CaseTrend {
                    case_month: s("2024-02"),
                    total_cases: 2
                },
            ]
        );
    }

    #[test]
    fn test_case_trends_keep_undated_cases() {
        let (_, cases) = datasets(
            "",
            "a,1,New,High,P1,2024-01-05,\n\
             b,1,New,High,P1,,\n\
             c,1,New,High,P1,garbage,\n",
        );
        let out = AggregationEngine::default().compute_case_trends(&cases);
        assert_eq!(
            out,
            vec![
                CaseTrend {
                    case_month: None,
                    total_cases: 2
                },
                CaseTrend {
                    case_month: s("2024-01"),
                    total_cases: 1
                },
            ]
        );
        assert_eq!(out.iter().map(|t| t.total_cases).sum::<u64>(), cases.len() as u64);
    }

    #[test]
    fn test_duplicate_account_ids_multiply_like_a_join() {
        let (accounts, cases) = datasets(
            "1,A,Tech,US\n1,A2,Tech,FR\n",
            "a,1,Closed,High,P1,2024-01-01,2024-01-02\n",
        );
        let engine = AggregationEngine::default();
        let industry = engine.compute_industry_performance(&accounts, &cases);
        assert_eq!(industry[0].total_cases, 2);
        let region = engine.compute_region_performance(&accounts, &cases);
        assert_eq!(region.len(), 2);
    }

    #[test]
    fn test_custom_closed_status() {
        let (accounts, cases) = datasets(
            "1,A,Tech,US\n",
            "a,1,Resolved,High,P1,2024-01-01,2024-01-02\n\
             b,1,Closed,High,P1,2024-01-01,2024-01-02\n",
        );
        let engine = AggregationEngine::new(EngineOptions {
            closed_status: "Resolved".to_string(),
            ..EngineOptions::default()
        });
        let out = engine.compute_industry_performance(&accounts, &cases);
        assert_eq!(out[0].closed_cases, 1);
        assert_eq!(out[0].closure_rate, Some(50.0));
    }

    #[test]
    fn test_compute_all_is_deterministic() {
        let (accounts, cases) = datasets(
            "1,A,Tech,US\n2,B,Retail,DE\n3,C,Tech,FR\n4,D,,\n",
            "a,1,Closed,High,P1,2024-01-01,2024-01-20\n\
             b,2,Closed,Low,P2,2024-02-01,2024-02-03\n\
             c,3,New,Low,P2,2024-02-01,\n\
             d,9,Closed,High,P3,2024-03-01,2024-03-25\n",
        );
        let engine = AggregationEngine::default();
        let first = engine.compute_all(&accounts, &cases);
        let second = engine.compute_all(&accounts, &cases);
        assert_eq!(first, second);

        for row in &first.industry_performance {
            if let Some(rate) = row.closure_rate {
                assert!((0.0..=100.0).contains(&rate));
            } else {
                assert_eq!(row.total_cases, 0);
            }
        }
    }
}
