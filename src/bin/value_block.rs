//! Value a block of annuity contracts from CSV
//!
//! Outputs one row per contract with its unit and monetary present value

use anyhow::Context;
use clap::Parser;
use life_annuity::contract::load_contracts;
use life_annuity::mortality::{load_tables, DEFAULT_TABLES_PATH};
use life_annuity::ValuationRunner;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "value_block", about = "Value a CSV block of annuity contracts")]
struct Args {
    /// Contracts CSV
    contracts: PathBuf,

    #[arg(long, default_value = DEFAULT_TABLES_PATH)]
    tables_dir: PathBuf,

    #[arg(long, default_value = "block_valuation_output.csv")]
    output: PathBuf,
}

#[derive(Serialize)]
struct BlockRow {
    contract_id: u32,
    table: String,
    birth_year: i32,
    initial_age: u32,
    unit_present_value: Option<f64>,
    present_value: Option<f64>,
    payments: Option<u32>,
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let provider = load_tables(&args.tables_dir)?;
    let records = load_contracts(&args.contracts)?;
    println!("Loaded {} contracts in {:?}", records.len(), start.elapsed());

    let requests: Vec<_> = records.iter().map(|r| r.request.clone()).collect();
    let mut runner = ValuationRunner::new(provider);

    let valuation_start = Instant::now();
    let results = runner.value_batch(&requests);
    println!(
        "Valued {} contracts on {} generational tables in {:?}",
        results.len(),
        runner.cached_tables(),
        valuation_start.elapsed()
    );

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut total_pv = 0.0;
    let mut failures = 0;
    for (record, result) in records.iter().zip(results) {
        let request = &record.request;
        let row = match result {
            Ok(valuation) => {
                total_pv += valuation.present_value;
                BlockRow {
                    contract_id: record.contract_id,
                    table: request.table.to_string(),
                    birth_year: request.birth_year,
                    initial_age: request.contract.initial_age,
                    unit_present_value: Some(valuation.unit_present_value),
                    present_value: Some(valuation.present_value),
                    payments: Some(valuation.cashflows.len() as u32),
                    error: None,
                }
            }
            Err(err) => {
                failures += 1;
                log::warn!("Contract {}: {}", record.contract_id, err);
                BlockRow {
                    contract_id: record.contract_id,
                    table: request.table.to_string(),
                    birth_year: request.birth_year,
                    initial_age: request.contract.initial_age,
                    unit_present_value: None,
                    present_value: None,
                    payments: None,
                    error: Some(err.to_string()),
                }
            }
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("\nSummary:");
    println!("  Contracts: {}", records.len());
    println!("  Failed: {}", failures);
    println!("  Total PV: {:.2}", total_pv);
    println!("  Results written to: {}", args.output.display());
    println!("  Total time: {:?}", start.elapsed());

    Ok(())
}
