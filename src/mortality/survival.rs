//! Survival probabilities at fractional durations
//!
//! `t p_x = l(x+t) / l(x)`, with `l` linearly interpolated between integer
//! ages. The table's limiting age is terminal: survival at or beyond it is 0.

use super::generational::GenerationalTable;
use crate::error::{AnnuityError, Result};

const AGE_EPSILON: f64 = 1e-9;

/// Survival curve for one initial age on a generational table
#[derive(Debug, Clone, Copy)]
pub struct SurvivalInterpolator<'a> {
    table: &'a GenerationalTable,
    initial_age: u32,
    lx_initial: f64,
}

impl<'a> SurvivalInterpolator<'a> {
    /// Fails with an out-of-range error if the table does not cover `initial_age`
    pub fn new(table: &'a GenerationalTable, initial_age: u32) -> Result<Self> {
        let lx_initial = table.lx(initial_age).ok_or_else(|| {
            AnnuityError::out_of_range(format!(
                "Age {} not in generational table (ages {}..={})",
                initial_age,
                table.start_age(),
                table.max_age()
            ))
        })?;

        Ok(Self {
            table,
            initial_age,
            lx_initial,
        })
    }

    pub fn initial_age(&self) -> u32 {
        self.initial_age
    }

    /// Probability of surviving `elapsed` years from the initial age
    pub fn probability(&self, elapsed: f64) -> Result<f64> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(AnnuityError::out_of_range(format!(
                "Elapsed time must be a non-negative number of years, got {elapsed}"
            )));
        }
        if elapsed == 0.0 {
            return Ok(1.0);
        }

        let position = self.initial_age as f64 + elapsed;
        let k_end = (position + AGE_EPSILON).floor();
        let frac = position - k_end;
        let k_end = k_end as u32;

        if k_end >= self.table.max_age() {
            return Ok(0.0);
        }

        let mut lx = self.lx_at(k_end);
        if frac > AGE_EPSILON {
            lx += frac * (self.lx_at(k_end + 1) - lx);
        }

        if self.lx_initial == 0.0 {
            return Ok(0.0);
        }
        Ok(lx / self.lx_initial)
    }

    // Terminal age and beyond count as extinct.
    fn lx_at(&self, age: u32) -> f64 {
        if age >= self.table.max_age() {
            return 0.0;
        }
        self.table.lx(age).unwrap_or(0.0)
    }
}

/// Probability that a life aged `initial_age` survives `elapsed` more years
pub fn survival(initial_age: u32, elapsed: f64, table: &GenerationalTable) -> Result<f64> {
    SurvivalInterpolator::new(table, initial_age)?.probability(elapsed)
}

/// Probability of dying within `elapsed` years (t q_x)
pub fn death_probability(initial_age: u32, elapsed: f64, table: &GenerationalTable) -> Result<f64> {
    Ok(1.0 - survival(initial_age, elapsed, table)?)
}

/// Complete expectation of life: 1/2 + sum of k p_x over whole years
pub fn complete_life_expectancy(initial_age: u32, table: &GenerationalTable) -> Result<f64> {
    let curve = SurvivalInterpolator::new(table, initial_age)?;
    let horizon = table.max_age().saturating_sub(initial_age);

    let mut curtate = 0.0;
    for k in 1..=horizon {
        curtate += curve.probability(k as f64)?;
    }
    Ok(0.5 + curtate)
}
