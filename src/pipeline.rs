//! Load, aggregate, write.

use std::{path::PathBuf, time::Instant};

use tracing::{info, info_span};

use crate::{
    config::PipelineConfig,
    processor::{
        ParseSummary, ProcessorError,
        dataset::{Accounts, SupportCases},
        engine::AggregationEngine,
        results::AnalyticsReport,
    },
    report::ReportWriter,
};

/// What a pipeline run read and wrote
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub accounts: ParseSummary,
    pub cases: ParseSummary,
    pub report: AnalyticsReport,
    /// Written files, in table order
    pub outputs: Vec<PathBuf>,
}

/// Runs the whole pipeline. Parsing uses a dedicated pool of `config.threads`
/// workers when set, the global rayon pool otherwise.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, ProcessorError> {
    config.validate()?;

    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            pool.install(|| run_in_pool(config))
        }
        None => run_in_pool(config),
    }
}

fn run_in_pool(config: &PipelineConfig) -> Result<RunSummary, ProcessorError> {
    let _span = info_span!("pipeline", threads = rayon::current_num_threads()).entered();
    let start = Instant::now();

    let (accounts, account_summary) =
        Accounts::load(&config.input.accounts, config.input.format)?;
    let (cases, case_summary) = SupportCases::load(&config.input.cases, config.input.format)?;
    let loaded = start.elapsed();

    let engine = AggregationEngine::new(config.engine_options());
    let report = engine.compute_all(&accounts, &cases);
    let aggregated = start.elapsed();

    let writer = ReportWriter::new(
        &config.output.dir,
        config.output.format,
        config.output.unknown_label.as_str(),
    );
    let outputs = writer.write(&report)?;

    info!(
        accounts = accounts.len(),
        cases = cases.len(),
        load_ms = loaded.as_millis() as u64,
        aggregate_ms = (aggregated - loaded).as_millis() as u64,
        total_ms = start.elapsed().as_millis() as u64,
        "pipeline finished"
    );

    Ok(RunSummary {
        accounts: account_summary,
        cases: case_summary,
        report,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutputFormat;
    use std::fs;

    fn write_inputs(dir: &std::path::Path) -> PipelineConfig {
        let accounts = dir.join("accounts.csv");
        let cases = dir.join("cases.csv");
        fs::write(
            &accounts,
            "account_id,account_name,account_industry,account_country\n1,Acme,Tech,US\n",
        )
        .unwrap();
        fs::write(
            &cases,
            "case_id,account_id,case_status,case_severity,case_priority,case_created_date,case_closed_date\n\
             c1,1,Closed,High,P1,2024-01-01,2024-01-06\n\
             c2,1,Closed,High,P1,2024-01-01,2024-01-16\n",
        )
        .unwrap();

        let mut config = PipelineConfig::default();
        config.input.accounts = accounts;
        config.input.cases = cases;
        config.output.dir = dir.join("out");
        config
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_inputs(dir.path());

        let summary = run(&config).unwrap();
        assert_eq!(summary.accounts.rows_processed, 1);
        assert_eq!(summary.cases.rows_processed, 2);
        assert_eq!(summary.outputs.len(), 5);
        assert!(summary.outputs.iter().all(|p| p.exists()));

        let industry = fs::read_to_string(dir.path().join("out/industry_performance.csv")).unwrap();
        assert_eq!(
            industry,
            "account_industry,total_cases,closed_cases,closure_rate,avg_resolution_time\n\
             Tech,2,2,100.0,10.0\n"
        );
    }

    #[test]
    fn test_run_with_dedicated_pool_and_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_inputs(dir.path());
        config.threads = Some(2);
        config.output.format = OutputFormat::Json;

        let summary = run(&config).unwrap();
        assert!(
            summary
                .outputs
                .iter()
                .all(|p| p.extension().is_some_and(|e| e == "json"))
        );
        assert_eq!(summary.report.case_trends.len(), 1);
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_inputs(dir.path());
        config.input.cases = dir.path().join("absent.csv");
        assert!(matches!(run(&config), Err(ProcessorError::Io(_))));
        assert!(!dir.path().join("out").exists());
    }
}
