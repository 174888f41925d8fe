//! Payment amounts under level, arithmetic and geometric progressions
//!
//! The step index `n` counts whole progression steps since the first
//! payment. Amounts are computed as annual figures and divided by the payment
//! frequency once, here, when the contract states an annual base amount.

use super::schedule::PaymentEpoch;
use super::steps::StepSchedule;
use crate::contract::{AmountBasis, AnnuityContract, Timing};
use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};

const STEP_EPSILON: f64 = 1e-9;

/// How the payment grows from one progression step to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionRule {
    /// Level payments
    #[default]
    Flat,
    /// `C0 + n * h`
    ArithmeticFixed { increment: f64 },
    /// `C0 + sum of the increment in effect at each step 1..=n`
    ArithmeticStep { increments: StepSchedule },
    /// `C0 * q^n`
    GeometricFixed { ratio: f64 },
    /// `C0 * product of the factor in effect at each step 1..=n`
    GeometricStep { factors: StepSchedule },
}

impl ProgressionRule {
    pub fn validate(&self) -> Result<()> {
        match self {
            ProgressionRule::Flat | ProgressionRule::ArithmeticStep { .. } => Ok(()),
            ProgressionRule::ArithmeticFixed { increment } if !increment.is_finite() => Err(
                AnnuityError::config(format!("Arithmetic increment {increment} is not finite")),
            ),
            ProgressionRule::ArithmeticFixed { .. } => Ok(()),
            ProgressionRule::GeometricFixed { ratio } => check_ratio(*ratio),
            ProgressionRule::GeometricStep { factors } => factors.values().try_for_each(check_ratio),
        }
    }

    /// Annual amount after `n` steps from a base of `base_amount`
    pub fn amount_after(&self, base_amount: f64, n: i64) -> f64 {
        if n < 0 {
            return 0.0;
        }
        let steps = n as u32;

        match self {
            ProgressionRule::Flat => base_amount,
            ProgressionRule::ArithmeticFixed { increment } => base_amount + n as f64 * increment,
            ProgressionRule::ArithmeticStep { increments } => {
                base_amount + (1..=steps).map(|s| increments.value_at(s)).sum::<f64>()
            }
            ProgressionRule::GeometricFixed { ratio } => base_amount * ratio.powi(steps as i32),
            ProgressionRule::GeometricStep { factors } => {
                base_amount * (1..=steps).map(|s| factors.value_at(s)).product::<f64>()
            }
        }
    }
}

fn check_ratio(ratio: f64) -> Result<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(AnnuityError::config(format!(
            "Geometric factor must be positive, got {ratio}"
        )))
    }
}

/// Nominal payment due at each epoch of a contract
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAmountModel {
    rule: ProgressionRule,
    base_amount: f64,
    timing: Timing,
    frequency: u32,
    basis: AmountBasis,
}

impl PaymentAmountModel {
    pub fn new(
        rule: ProgressionRule,
        base_amount: f64,
        timing: Timing,
        frequency: u32,
        basis: AmountBasis,
    ) -> Self {
        Self {
            rule,
            base_amount,
            timing,
            frequency: frequency.max(1),
            basis,
        }
    }

    pub fn from_contract(contract: &AnnuityContract) -> Self {
        Self::new(
            contract.progression.clone(),
            contract.base_amount,
            contract.timing,
            contract.frequency,
            contract.amount_basis,
        )
    }

    /// Whole progression steps elapsed since the first payment
    ///
    /// Advance: `floor(t_relative)`. Arrears: `floor(t_relative) - 1`, clamped
    /// to 0 for the first payment. Negative means not yet payable.
    pub fn step_index(&self, epoch: &PaymentEpoch) -> i64 {
        let t = epoch.t_relative;
        let whole = (t + STEP_EPSILON).floor() as i64;
        match self.timing {
            Timing::Advance => whole,
            Timing::Arrears if t <= STEP_EPSILON => -1,
            Timing::Arrears => (whole - 1).max(0),
        }
    }

    /// Payment due at an epoch
    pub fn amount(&self, epoch: &PaymentEpoch) -> f64 {
        let annual = self.rule.amount_after(self.base_amount, self.step_index(epoch));
        match self.basis {
            AmountBasis::Annual => annual / self.frequency as f64,
            AmountBasis::PerPayment => annual,
        }
    }
}
