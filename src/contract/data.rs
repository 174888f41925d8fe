//! Annuity contract definitions

use crate::error::{AnnuityError, Result};
use crate::valuation::{InterestRate, ProgressionRule};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// When each payment falls within its period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// Start of period (prepagable)
    #[serde(alias = "prepagable")]
    Advance,
    /// End of period (pospagable)
    #[serde(alias = "pospagable")]
    Arrears,
}

impl FromStr for Timing {
    type Err = AnnuityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "advance" | "prepagable" => Ok(Timing::Advance),
            "arrears" | "pospagable" => Ok(Timing::Arrears),
            other => Err(AnnuityError::config(format!(
                "Timing must be 'advance' or 'arrears', got '{other}'"
            ))),
        }
    }
}

/// Payment term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// Payable for life
    #[default]
    WholeLife,
    /// Payable for a fixed number of years from the first payment
    Years(u32),
}

/// Whether the base amount is an annual figure or already a per-payment amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmountBasis {
    /// Annual amount, split evenly across the payments of each year
    #[default]
    Annual,
    PerPayment,
}

fn default_frequency() -> u32 {
    1
}

/// Immutable description of a life annuity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnuityContract {
    pub timing: Timing,

    /// Age at contract inception
    pub initial_age: u32,

    /// Whole years before the first payment becomes payable (0 = immediate)
    #[serde(default)]
    pub deferment: u32,

    #[serde(default)]
    pub term: Term,

    /// Payments per year
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Base payment amount (C0)
    pub base_amount: f64,

    #[serde(default)]
    pub amount_basis: AmountBasis,

    #[serde(default)]
    pub progression: ProgressionRule,

    pub rate: InterestRate,
}

impl AnnuityContract {
    /// Immediate, whole-life, annual, level annuity
    pub fn new(timing: Timing, initial_age: u32, base_amount: f64, rate: InterestRate) -> Self {
        Self {
            timing,
            initial_age,
            deferment: 0,
            term: Term::WholeLife,
            frequency: 1,
            base_amount,
            amount_basis: AmountBasis::Annual,
            progression: ProgressionRule::Flat,
            rate,
        }
    }

    pub fn deferred(mut self, years: u32) -> Self {
        self.deferment = years;
        self
    }

    pub fn temporary(mut self, years: u32) -> Self {
        self.term = Term::Years(years);
        self
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_progression(mut self, progression: ProgressionRule) -> Self {
        self.progression = progression;
        self
    }

    pub fn with_amount_basis(mut self, basis: AmountBasis) -> Self {
        self.amount_basis = basis;
        self
    }

    /// Years from inception to the end of the last payment year, if temporary
    pub fn payment_horizon(&self) -> Result<Option<u32>> {
        match self.term {
            Term::WholeLife => Ok(None),
            Term::Years(years) => self.deferment.checked_add(years).map(Some).ok_or_else(|| {
                AnnuityError::out_of_range(format!(
                    "Deferment of {} years plus a {} year term overflows",
                    self.deferment, years
                ))
            }),
        }
    }

    /// Check the parameter combination before valuation
    pub fn validate(&self) -> Result<()> {
        if self.frequency == 0 {
            return Err(AnnuityError::config("Payment frequency must be at least 1"));
        }
        if self.term == Term::Years(0) {
            return Err(AnnuityError::config("A temporary annuity runs for at least 1 year"));
        }
        if !self.base_amount.is_finite() || self.base_amount == 0.0 {
            return Err(AnnuityError::config(format!(
                "Base amount must be a non-zero number, got {}",
                self.base_amount
            )));
        }

        self.rate.validate()?;
        self.progression.validate()?;
        let horizon = self.payment_horizon()?;

        if let (InterestRate::Stepwise(schedule), Some(horizon)) = (&self.rate, horizon) {
            if schedule.last_boundary() < horizon {
                return Err(AnnuityError::out_of_range(format!(
                    "Rate schedule ends at year {} but payments run to year {}",
                    schedule.last_boundary(),
                    horizon
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::StepSchedule;

    #[test]
    fn test_builder_methods() {
        let contract = AnnuityContract::new(Timing::Arrears, 60, 12_000.0, InterestRate::Fixed(0.03))
            .deferred(5)
            .temporary(10)
            .with_frequency(12);

        assert_eq!(contract.deferment, 5);
        assert_eq!(contract.term, Term::Years(10));
        assert_eq!(contract.payment_horizon().unwrap(), Some(15));
        assert!(contract.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let base = AnnuityContract::new(Timing::Advance, 65, 1_000.0, InterestRate::Fixed(0.03));

        assert!(matches!(
            base.clone().with_frequency(0).validate(),
            Err(AnnuityError::Configuration(_))
        ));
        assert!(base.clone().temporary(0).validate().is_err());

        let mut zero = base.clone();
        zero.base_amount = 0.0;
        assert!(zero.validate().is_err());

        let mut bad_rate = base.clone();
        bad_rate.rate = InterestRate::Fixed(-1.2);
        assert!(matches!(bad_rate.validate(), Err(AnnuityError::InvalidRate { .. })));
    }

    #[test]
    fn test_huge_deferment_is_out_of_range() {
        let contract = AnnuityContract::new(Timing::Arrears, 65, 1_000.0, InterestRate::Fixed(0.03))
            .deferred(u32::MAX)
            .temporary(5);

        assert!(matches!(contract.payment_horizon(), Err(AnnuityError::OutOfRange(_))));
        assert!(matches!(contract.validate(), Err(AnnuityError::OutOfRange(_))));
    }

    #[test]
    fn test_rate_schedule_must_cover_term() {
        let schedule = StepSchedule::from_pairs(&[(0.02, 2), (0.04, 5)]).unwrap();
        let contract =
            AnnuityContract::new(Timing::Arrears, 65, 1_000.0, InterestRate::Stepwise(schedule));

        // Whole life carries the last rate forward
        assert!(contract.validate().is_ok());
        assert!(contract.clone().temporary(5).validate().is_ok());
        assert!(matches!(
            contract.clone().deferred(1).temporary(5).validate(),
            Err(AnnuityError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "timing": "pospagable",
            "initial_age": 48,
            "deferment": 2,
            "term": {"years": 10},
            "frequency": 12,
            "base_amount": 15000.0,
            "progression": {"kind": "geometric_fixed", "ratio": 1.02},
            "rate": {"stepwise": [{"value": 0.02, "until": 5}, {"value": 0.03, "until": 12}]}
        }"#;

        let contract: AnnuityContract = serde_json::from_str(json).unwrap();
        assert_eq!(contract.timing, Timing::Arrears);
        assert_eq!(contract.term, Term::Years(10));
        assert_eq!(contract.amount_basis, AmountBasis::Annual);
        assert_eq!(contract.progression, ProgressionRule::GeometricFixed { ratio: 1.02 });
        assert!(contract.validate().is_ok());

        let minimal: AnnuityContract = serde_json::from_str(
            r#"{"timing":"advance","initial_age":65,"base_amount":1.0,"rate":{"fixed":0.03}}"#,
        )
        .unwrap();
        assert_eq!(minimal.term, Term::WholeLife);
        assert_eq!(minimal.frequency, 1);
        assert_eq!(minimal.progression, ProgressionRule::Flat);
    }

    #[test]
    fn test_timing_from_str() {
        assert_eq!("Prepagable".parse::<Timing>().unwrap(), Timing::Advance);
        assert_eq!("arrears".parse::<Timing>().unwrap(), Timing::Arrears);
        assert!("monthly".parse::<Timing>().is_err());
    }
}
