//! Life Annuity CLI
//!
//! Builds generational tables and values annuity contracts described in JSON

use anyhow::Context;
use clap::{Parser, Subcommand};
use life_annuity::mortality::{load_tables, DEFAULT_TABLES_PATH};
use life_annuity::{GenerationalTableBuilder, SexMix, TableId, ValuationRequest, ValuationRunner};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

/// Actuarial present value of life annuities
#[derive(Parser)]
#[command(name = "life-annuity", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding one `<TABLE_ID>.csv` per mortality table
    #[arg(long, default_value = DEFAULT_TABLES_PATH, global = true)]
    tables_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generational table for a birth cohort as CSV
    Table {
        #[arg(long)]
        birth_year: i32,

        /// Table id, e.g. PERM2000C or PER_2020_Indiv_2Orden
        #[arg(long)]
        table: TableId,

        /// Male weight for unisex tables (female weight is the complement)
        #[arg(long)]
        male_weight: Option<f64>,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Value the annuity described by a JSON request
    Value {
        /// JSON file with birth_year, table, optional sex_mix and contract
        #[arg(long)]
        config: PathBuf,

        /// Write the cash-flow table to this CSV file
        #[arg(long)]
        cashflows: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ValuationOutput {
    table: String,
    birth_year: i32,
    unit_present_value: f64,
    present_value: f64,
    payments: u32,
    nominal_payments: f64,
    expected_payments: f64,
    first_payment: Option<f64>,
    last_payment: Option<f64>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let provider = load_tables(&cli.tables_dir)?;

    match cli.command {
        Commands::Table {
            birth_year,
            table,
            male_weight,
            output,
        } => {
            let sex_mix = male_weight.map(SexMix::from_male_weight).transpose()?;
            let generational = GenerationalTableBuilder::new(&provider).build(birth_year, &table, sex_mix)?;

            let sink: Box<dyn io::Write> = match &output {
                Some(path) => Box::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout()),
            };
            let mut writer = csv::Writer::from_writer(sink);
            for row in generational.rows() {
                writer.serialize(row)?;
            }
            writer.flush()?;

            if let Some(path) = output {
                println!(
                    "Generational table {} for {} ({} rows) written to {}",
                    table,
                    birth_year,
                    generational.len(),
                    path.display()
                );
            }
        }
        Commands::Value { config, cashflows } => {
            let file = File::open(&config).with_context(|| format!("opening {}", config.display()))?;
            let request: ValuationRequest = serde_json::from_reader(file)
                .with_context(|| format!("parsing {}", config.display()))?;

            let mut runner = ValuationRunner::new(provider);
            let result = runner.value(&request)?;
            let summary = result.summary();

            let output = ValuationOutput {
                table: request.table.to_string(),
                birth_year: request.birth_year,
                unit_present_value: result.unit_present_value,
                present_value: result.present_value,
                payments: summary.payments,
                nominal_payments: summary.nominal_payments,
                expected_payments: summary.expected_payments,
                first_payment: summary.first_payment,
                last_payment: summary.last_payment,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);

            if let Some(path) = cashflows {
                let mut writer = csv::Writer::from_path(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                for row in &result.cashflows {
                    writer.serialize(row)?;
                }
                writer.flush()?;
                log::info!("Cash-flow table written to {}", path.display());
            }
        }
    }

    Ok(())
}
