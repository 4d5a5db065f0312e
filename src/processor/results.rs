//! Result tables produced by the aggregation engine.
//!
//! Grouping keys are `Option<String>`: `None` is the null group that collects
//! rows with a missing attribute and, depending on
//! [`OrphanCases`](crate::processor::engine::OrphanCases), cases that match no
//! account.

/// One output value, as handed to the report writer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// Grouping key; `None` is rendered with the configured unknown label
    Key(Option<&'a str>),
    Count(u64),
    /// Derived metric; `None` when the group is empty
    Metric(Option<f64>),
}

/// A row of one of the five result tables
pub trait ResultRow {
    /// Output file stem
    const TABLE: &'static str;
    /// Column names, in output order
    const COLUMNS: &'static [&'static str];

    fn fields(&self) -> Vec<Field<'_>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndustryPerformance {
    pub account_industry: Option<String>,
    pub total_cases: u64,
    pub closed_cases: u64,
    pub closure_rate: Option<f64>,
    pub avg_resolution_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongResolutionAccount {
    pub account_name: Option<String>,
    pub account_country: Option<String>,
    pub avg_resolution_time: f64,
    pub total_cases: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeverityPriorityCorrelation {
    pub account_industry: Option<String>,
    pub case_severity: Option<String>,
    pub case_priority: Option<String>,
    pub case_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionPerformance {
    pub account_country: Option<String>,
    pub total_cases: u64,
    pub closed_cases: u64,
    pub closure_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseTrend {
    /// `YYYY-MM`; `None` for cases without a creation date
    pub case_month: Option<String>,
    pub total_cases: u64,
}

/// All five result tables of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsReport {
    pub industry_performance: Vec<IndustryPerformance>,
    pub long_resolution_accounts: Vec<LongResolutionAccount>,
    pub severity_priority_correlation: Vec<SeverityPriorityCorrelation>,
    pub region_performance: Vec<RegionPerformance>,
    pub case_trends: Vec<CaseTrend>,
}

impl ResultRow for IndustryPerformance {
    const TABLE: &'static str = "industry_performance";
    const COLUMNS: &'static [&'static str] = &[
        "account_industry",
        "total_cases",
        "closed_cases",
        "closure_rate",
        "avg_resolution_time",
    ];

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::Key(self.account_industry.as_deref()),
            Field::Count(self.total_cases),
            Field::Count(self.closed_cases),
            Field::Metric(self.closure_rate),
            Field::Metric(self.avg_resolution_time),
        ]
    }
}

impl ResultRow for LongResolutionAccount {
    const TABLE: &'static str = "long_resolution_accounts";
    const COLUMNS: &'static [&'static str] = &[
        "account_name",
        "account_country",
        "avg_resolution_time",
        "total_cases",
    ];

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::Key(self.account_name.as_deref()),
            Field::Key(self.account_country.as_deref()),
            Field::Metric(Some(self.avg_resolution_time)),
            Field::Count(self.total_cases),
        ]
    }
}

impl ResultRow for SeverityPriorityCorrelation {
    const TABLE: &'static str = "severity_priority_correlation";
    const COLUMNS: &'static [&'static str] = &[
        "account_industry",
        "case_severity",
        "case_priority",
        "case_count",
    ];

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::Key(self.account_industry.as_deref()),
            Field::Key(self.case_severity.as_deref()),
            Field::Key(self.case_priority.as_deref()),
            Field::Count(self.case_count),
        ]
    }
}

impl ResultRow for RegionPerformance {
    const TABLE: &'static str = "region_performance";
    const COLUMNS: &'static [&'static str] = &[
        "account_country",
        "total_cases",
        "closed_cases",
        "closure_rate",
    ];

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::Key(self.account_country.as_deref()),
            Field::Count(self.total_cases),
            Field::Count(self.closed_cases),
            Field::Metric(self.closure_rate),
        ]
    }
}

impl ResultRow for CaseTrend {
    const TABLE: &'static str = "case_trends";
    const COLUMNS: &'static [&'static str] = &["case_month", "total_cases"];

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::Key(self.case_month.as_deref()),
            Field::Count(self.total_cases),
        ]
    }
}
