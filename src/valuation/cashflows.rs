//! Cash-flow output structures for valuations

use super::schedule::PaymentEpoch;
use serde::{Deserialize, Serialize};

/// A single row of valuation output for one payment epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowRow {
    // Timing
    pub k: u32,
    pub t: f64,
    pub t_relative: f64,
    pub j: u32,

    pub survival: f64,
    pub discount: f64,
    pub amount: f64,

    /// survival * discount * amount
    pub contribution: f64,
}

impl CashflowRow {
    pub fn new(epoch: &PaymentEpoch, survival: f64, discount: f64, amount: f64) -> Self {
        Self {
            k: epoch.k,
            t: epoch.t,
            t_relative: epoch.t_relative,
            j: epoch.j,
            survival,
            discount,
            amount,
            contribution: survival * discount * amount,
        }
    }
}

/// Complete valuation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Present value per unit of base amount
    pub unit_present_value: f64,

    /// Present value in currency
    pub present_value: f64,

    pub cashflows: Vec<CashflowRow>,
}

impl ValuationResult {
    pub fn new() -> Self {
        Self {
            unit_present_value: 0.0,
            present_value: 0.0,
            cashflows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: CashflowRow) {
        self.present_value += row.contribution;
        self.cashflows.push(row);
    }

    pub fn summary(&self) -> ValuationSummary {
        let expected_payments: f64 = self.cashflows.iter().map(|r| r.survival * r.amount).sum();
        let nominal_payments: f64 = self.cashflows.iter().map(|r| r.amount).sum();

        ValuationSummary {
            payments: self.cashflows.len() as u32,
            nominal_payments,
            expected_payments,
            present_value: self.present_value,
            first_payment: self.cashflows.first().map(|r| r.t),
            last_payment: self.cashflows.last().map(|r| r.t),
        }
    }
}

impl Default for ValuationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics for a valuation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub payments: u32,
    /// Sum of scheduled amounts, ignoring survival and interest
    pub nominal_payments: f64,
    /// Survival-weighted, undiscounted payments
    pub expected_payments: f64,
    pub present_value: f64,
    pub first_payment: Option<f64>,
    pub last_payment: Option<f64>,
}
