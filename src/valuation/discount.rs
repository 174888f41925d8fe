//! Discount factors for flat or stepwise annual interest rates
//!
//! Supports:
//! - A single annual rate: `v(t) = (1 + i)^-t`
//! - A stepwise schedule of annual rates by contract year, compounded per
//!   sub-period at the payment frequency

use super::steps::StepSchedule;
use crate::contract::Timing;
use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};

const PERIOD_EPSILON: f64 = 1e-9;

/// Annual interest rate assumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestRate {
    /// One annual rate for every year
    Fixed(f64),
    /// Rate per contract year; a step applies up to and including its boundary year
    Stepwise(StepSchedule),
}

impl InterestRate {
    /// Every rate must be finite and above -100%
    pub fn validate(&self) -> Result<()> {
        let check = |rate: f64| {
            if !rate.is_finite() || rate <= -1.0 {
                Err(AnnuityError::InvalidRate { rate })
            } else {
                Ok(())
            }
        };

        match self {
            InterestRate::Fixed(rate) => check(*rate),
            InterestRate::Stepwise(schedule) => schedule.values().try_for_each(check),
        }
    }

    /// Annual rate for contract year `year` (1-based)
    pub fn rate_for_year(&self, year: u32) -> f64 {
        match self {
            InterestRate::Fixed(rate) => *rate,
            InterestRate::Stepwise(schedule) => schedule.value_at(year),
        }
    }
}

/// Discount curve at a given payment frequency
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCurve {
    rate: InterestRate,
    frequency: u32,
}

impl DiscountCurve {
    pub fn new(rate: InterestRate, frequency: u32) -> Result<Self> {
        if frequency == 0 {
            return Err(AnnuityError::config("Payment frequency must be at least 1"));
        }
        rate.validate()?;
        Ok(Self { rate, frequency })
    }

    /// Annual flat-rate curve
    pub fn flat(annual_rate: f64) -> Result<Self> {
        Self::new(InterestRate::Fixed(annual_rate), 1)
    }

    pub fn rate(&self) -> &InterestRate {
        &self.rate
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Annual rates for years 0..=duration; index 0 is an unused placeholder
    pub fn annual_rates(&self, duration: u32) -> Vec<f64> {
        std::iter::once(0.0)
            .chain((1..=duration).map(|year| self.rate.rate_for_year(year)))
            .collect()
    }

    /// Per-sub-period rate equivalent to the annual rate of `year`
    pub fn sub_period_rate(&self, year: u32) -> f64 {
        (1.0 + self.rate.rate_for_year(year)).powf(1.0 / self.frequency as f64) - 1.0
    }

    /// Discount factor for `elapsed` years since inception
    ///
    /// The stepwise case accumulates one factor per whole sub-period, then a
    /// partial factor for any remaining fraction. A payment at inception
    /// (advance timing, epoch 0) spans no sub-period and is not discounted.
    pub fn discount(&self, elapsed: f64) -> Result<f64> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(AnnuityError::out_of_range(format!(
                "Cannot discount over {elapsed} years"
            )));
        }

        match &self.rate {
            InterestRate::Fixed(rate) => Ok((1.0 + rate).powf(-elapsed)),
            InterestRate::Stepwise(_) => {
                let periods = elapsed * self.frequency as f64;
                let whole = (periods + PERIOD_EPSILON).floor();
                let frac = periods - whole;
                let whole = whole as u32;

                let mut factor = 1.0;
                for period in 1..=whole {
                    factor /= 1.0 + self.sub_period_rate(self.year_of(period));
                }
                if frac > PERIOD_EPSILON {
                    let rate = self.sub_period_rate(self.year_of(whole + 1));
                    factor *= (1.0 + rate).powf(-frac);
                }
                Ok(factor)
            }
        }
    }

    /// Present value of one unit per payment for `years` years, without mortality
    ///
    /// Flat rates sum the arrears series and convert to advance timing with a
    /// single `(1 + i)^(1/F)` factor at the end.
    pub fn annuity_certain(&self, years: u32, timing: Timing) -> Result<f64> {
        let payments = years.checked_mul(self.frequency).ok_or_else(|| {
            AnnuityError::out_of_range(format!(
                "{years} years at {} payments a year is too many payments",
                self.frequency
            ))
        })?;
        let per_year = self.frequency as f64;

        match &self.rate {
            InterestRate::Fixed(rate) => {
                let v = 1.0 + rate;
                let arrears: f64 = (1..=payments).map(|p| v.powf(-(p as f64) / per_year)).sum();
                Ok(match timing {
                    Timing::Arrears => arrears,
                    Timing::Advance => arrears * v.powf(1.0 / per_year),
                })
            }
            InterestRate::Stepwise(_) => {
                let offset = match timing {
                    Timing::Advance => 0,
                    Timing::Arrears => 1,
                };
                (0..payments)
                    .map(|p| self.discount((p + offset) as f64 / per_year))
                    .sum()
            }
        }
    }

    // Contract year containing 1-based sub-period `period`.
    fn year_of(&self, period: u32) -> u32 {
        (period - 1) / self.frequency + 1
    }
}
