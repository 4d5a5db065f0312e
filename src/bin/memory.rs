use std::path::PathBuf;

use case_insights::{PipelineConfig, ProcessorError, synthetic::SyntheticData};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Runs the pipeline on a generated dataset under the dhat heap profiler.
/// An optional argument names a TOML config to run instead.
fn main() -> Result<(), ProcessorError> {
    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(&PathBuf::from(path))?,
        None => {
            let dir = std::env::temp_dir().join("case-insights-memory");
            std::fs::create_dir_all(&dir)?;

            let data = SyntheticData::new(10_000, 1_000_000);
            let (accounts, cases) = data.to_csv_bytes()?;
            let mut config = PipelineConfig::default();
            config.input.accounts = dir.join("accounts.csv");
            config.input.cases = dir.join("support_cases.csv");
            config.output.dir = dir.join("out");
            std::fs::write(&config.input.accounts, accounts)?;
            std::fs::write(&config.input.cases, cases)?;
            config
        }
    };

    let _profiler = dhat::Profiler::new_heap();
    let summary = case_insights::run(&config)?;

    println!(
        "Memory benchmark finished ({} cases). See dhat-heap.json for details",
        summary.cases.rows_processed
    );
    Ok(())
}
