//! Load a block of annuity contracts from CSV
//!
//! One contract per row with a flat valuation rate and, optionally, a fixed
//! arithmetic or geometric progression. Blank `Term` means whole life.

use super::{AnnuityContract, Term, Timing};
use crate::error::AnnuityError;
use crate::runner::ValuationRequest;
use crate::valuation::{InterestRate, ProgressionRule};
use anyhow::Context;
use csv::Reader;
use std::fs::File;
use std::path::Path;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "ContractID")]
    contract_id: u32,
    #[serde(rename = "BirthYear")]
    birth_year: i32,
    #[serde(rename = "Table")]
    table: String,
    #[serde(rename = "MaleWeight")]
    male_weight: Option<f64>,
    #[serde(rename = "Timing")]
    timing: String,
    #[serde(rename = "InitialAge")]
    initial_age: u32,
    #[serde(rename = "Deferment")]
    deferment: Option<u32>,
    #[serde(rename = "Term")]
    term: Option<u32>,
    #[serde(rename = "Frequency")]
    frequency: Option<u32>,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Rate")]
    rate: Option<f64>,
    #[serde(rename = "Progression")]
    progression: Option<String>,
    #[serde(rename = "ProgressionStep")]
    progression_step: Option<f64>,
}

/// A contract from a block file with its identifier
#[derive(Debug, Clone)]
pub struct ContractRecord {
    pub contract_id: u32,
    pub request: ValuationRequest,
}

impl CsvRow {
    fn into_record(self) -> Result<ContractRecord, AnnuityError> {
        let rate = self.rate.ok_or_else(|| {
            AnnuityError::config(format!("Contract {}: no valuation rate given", self.contract_id))
        })?;

        let progression = match (self.progression.as_deref().map(str::trim), self.progression_step) {
            (None | Some("") | Some("flat"), _) => ProgressionRule::Flat,
            (Some("arithmetic"), Some(increment)) => ProgressionRule::ArithmeticFixed { increment },
            (Some("geometric"), Some(ratio)) => ProgressionRule::GeometricFixed { ratio },
            (Some(kind @ ("arithmetic" | "geometric")), None) => {
                return Err(AnnuityError::config(format!(
                    "Contract {}: {} progression needs a ProgressionStep",
                    self.contract_id, kind
                )))
            }
            (Some(other), _) => {
                return Err(AnnuityError::config(format!(
                    "Contract {}: unknown progression '{}'",
                    self.contract_id, other
                )))
            }
        };

        let sex_mix = self
            .male_weight
            .map(crate::mortality::SexMix::from_male_weight)
            .transpose()?;

        let contract = AnnuityContract {
            timing: self.timing.parse::<Timing>()?,
            initial_age: self.initial_age,
            deferment: self.deferment.unwrap_or(0),
            term: self.term.map(Term::Years).unwrap_or(Term::WholeLife),
            frequency: self.frequency.unwrap_or(1),
            base_amount: self.amount,
            amount_basis: Default::default(),
            progression,
            rate: InterestRate::Fixed(rate),
        };

        Ok(ContractRecord {
            contract_id: self.contract_id,
            request: ValuationRequest {
                birth_year: self.birth_year,
                table: self.table.parse()?,
                sex_mix,
                contract,
            },
        })
    }
}

/// Load all contracts from a block file
pub fn load_contracts(path: &Path) -> anyhow::Result<Vec<ContractRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = Reader::from_reader(file);

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("{} row {}", path.display(), line + 2))?;
        let record = row
            .into_record()
            .with_context(|| format!("{} row {}", path.display(), line + 2))?;
        records.push(record);
    }

    log::info!("Loaded {} contracts from {}", records.len(), path.display());
    Ok(records)
}
