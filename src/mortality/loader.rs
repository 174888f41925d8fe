//! CSV-based mortality table loader
//!
//! Loads one file per table from a directory, named `<TABLE_ID>.csv`.
//! Two layouts are accepted:
//! - `age, qx, improvement` (PER 2000 tables)
//! - `age, qx_base, qx_first_order, qx_second_order, improvement` (PER 2020 tables)

use super::provider::{InMemoryProvider, MortalityRate};
use super::tables::{TableId, TableOrder};
use anyhow::{bail, Context};
use csv::StringRecord;
use std::fs::{self, File};
use std::path::Path;

/// Default path to the mortality tables directory
pub const DEFAULT_TABLES_PATH: &str = "data/tables";

/// Load a single table file
pub fn load_table_file(path: &Path, table: &TableId) -> anyhow::Result<Vec<MortalityRate>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut rates = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        let rate = parse_record(&record, table)
            .with_context(|| format!("{} row {}", path.display(), line + 2))?;
        rates.push(rate);
    }

    log::debug!("Loaded {} rows for {} from {}", rates.len(), table, path.display());
    Ok(rates)
}

fn parse_record(record: &StringRecord, table: &TableId) -> anyhow::Result<MortalityRate> {
    let field = |i: usize| -> anyhow::Result<f64> {
        let raw = record.get(i).unwrap_or_default();
        raw.parse::<f64>()
            .with_context(|| format!("column {} is not a number: {:?}", i + 1, raw))
    };

    let age = field(0)?;
    if age < 0.0 || age.fract() != 0.0 {
        bail!("age must be a non-negative integer, got {}", age);
    }

    let (base_rate, improvement) = match record.len() {
        3 => (field(1)?, field(2)?),
        5 => match table.family.order() {
            Some(TableOrder::First) => (field(2)?, field(4)?),
            Some(TableOrder::Second) => (field(3)?, field(4)?),
            None => bail!("{} expects 3 columns, found 5", table),
        },
        n => bail!("expected 3 or 5 columns, found {}", n),
    };

    Ok(MortalityRate::new(age as u32, base_rate, improvement))
}

/// Load every recognised table file in a directory
///
/// Files whose stem is not a known single-sex table id are skipped.
pub fn load_tables(dir: &Path) -> anyhow::Result<InMemoryProvider> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading tables directory {}", dir.display()))?;

    let mut provider = InMemoryProvider::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let table = match stem.parse::<TableId>() {
            Ok(table) if !table.is_unisex() => table,
            _ => {
                log::warn!("Skipping {}: not a single-sex mortality table", path.display());
                continue;
            }
        };

        let rates = load_table_file(&path, &table)?;
        provider
            .insert(table, rates)
            .with_context(|| format!("loading {}", path.display()))?;
    }

    log::info!("Loaded {} mortality tables from {}", provider.len(), dir.display());
    Ok(provider)
}
