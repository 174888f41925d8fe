//! Piecewise-constant schedules indexed by whole years or progression steps
//!
//! Each step's value applies to every index after the previous boundary up to
//! and including its own `until`. Indices past the last boundary carry the
//! last value forward.

use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub value: f64,
    pub until: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Step>", into = "Vec<Step>")]
pub struct StepSchedule {
    steps: Vec<Step>,
}

impl StepSchedule {
    /// Boundaries must be at least 1 and strictly increasing
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(AnnuityError::config("Step schedule needs at least one step"));
        }
        if steps[0].until == 0 {
            return Err(AnnuityError::config("Step boundaries start at 1"));
        }
        if let Some(pair) = steps.windows(2).find(|w| w[1].until <= w[0].until) {
            return Err(AnnuityError::config(format!(
                "Step boundaries must be strictly increasing: {} then {}",
                pair[0].until, pair[1].until
            )));
        }
        if let Some(step) = steps.iter().find(|s| !s.value.is_finite()) {
            return Err(AnnuityError::config(format!(
                "Step value up to {} is not finite",
                step.until
            )));
        }
        Ok(Self { steps })
    }

    /// From `(value, until)` pairs
    pub fn from_pairs(pairs: &[(f64, u32)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&(value, until)| Step { value, until })
                .collect(),
        )
    }

    /// Value in effect at a 1-based index
    pub fn value_at(&self, index: u32) -> f64 {
        self.steps
            .iter()
            .find(|s| index <= s.until)
            .or_else(|| self.steps.last())
            .map(|s| s.value)
            .unwrap_or(0.0)
    }

    pub fn last_boundary(&self) -> u32 {
        self.steps.last().map(|s| s.until).unwrap_or(0)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.steps.iter().map(|s| s.value)
    }
}

impl TryFrom<Vec<Step>> for StepSchedule {
    type Error = AnnuityError;

    fn try_from(steps: Vec<Step>) -> Result<Self> {
        Self::new(steps)
    }
}

impl From<StepSchedule> for Vec<Step> {
    fn from(schedule: StepSchedule) -> Self {
        schedule.steps
    }
}
