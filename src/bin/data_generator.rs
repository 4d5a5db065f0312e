use std::{
    env,
    fs::{self, File},
    io::BufWriter,
};

use case_insights::{ProcessorError, synthetic::SyntheticData};

/// Usage: data_generator [ACCOUNTS] [CASES] [SEED]
fn main() -> Result<(), ProcessorError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut data = SyntheticData::default();

    let parse = |idx: usize| -> Result<Option<u64>, ProcessorError> {
        args.get(idx)
            .map(|arg| {
                arg.parse::<u64>()
                    .map_err(|e| ProcessorError::Parse(format!("argument {:?}: {}", arg, e)))
            })
            .transpose()
    };
    if let Some(accounts) = parse(0)? {
        data.accounts = accounts as usize;
    }
    if let Some(cases) = parse(1)? {
        data.cases = cases as usize;
    }
    if let Some(seed) = parse(2)? {
        data.seed = seed;
    }

    fs::create_dir_all("data")?;
    let accounts_path = "data/accounts.csv";
    let cases_path = "data/support_cases.csv";

    data.write_accounts(BufWriter::new(File::create(accounts_path)?))?;
    data.write_cases(BufWriter::new(File::create(cases_path)?))?;

    println!(
        "Generated {} accounts in {} and {} cases in {}",
        data.accounts, accounts_path, data.cases, cases_path
    );
    Ok(())
}
