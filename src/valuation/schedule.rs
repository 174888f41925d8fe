//! Payment epoch generation
//!
//! Payments fall in whole contract years `[start, end)`:
//! - start is the deferment
//! - end is `deferment + term`, or `omega - initial_age` for whole-life contracts
//!
//! Within year `y`, advance payments fall at `y + j/F` for `j = 0..F-1` and
//! arrears payments at `y + j/F` for `j = 1..F`. The first arrears payment of a
//! deferred contract therefore falls strictly after the deferment.

use crate::contract::{AnnuityContract, Term, Timing};
use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};

/// One payment date of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentEpoch {
    /// Initial age plus whole years elapsed
    pub k: u32,
    /// Years since contract inception
    pub t: f64,
    /// Years since the first payable date (`t - deferment`)
    pub t_relative: f64,
    /// Sub-period index within the year
    pub j: u32,
}

/// The four timing/deferment combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    AdvanceImmediate,
    AdvanceDeferred,
    ArrearsImmediate,
    ArrearsDeferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleGenerator {
    timing: Timing,
    initial_age: u32,
    deferment: u32,
    term: Term,
    frequency: u32,
}

impl ScheduleGenerator {
    pub fn new(
        timing: Timing,
        initial_age: u32,
        deferment: u32,
        term: Term,
        frequency: u32,
    ) -> Result<Self> {
        if frequency == 0 {
            return Err(AnnuityError::config("Payment frequency must be at least 1"));
        }
        if term == Term::Years(0) {
            return Err(AnnuityError::config("A temporary annuity runs for at least 1 year"));
        }
        Ok(Self {
            timing,
            initial_age,
            deferment,
            term,
            frequency,
        })
    }

    pub fn from_contract(contract: &AnnuityContract) -> Result<Self> {
        Self::new(
            contract.timing,
            contract.initial_age,
            contract.deferment,
            contract.term,
            contract.frequency,
        )
    }

    pub fn mode(&self) -> ScheduleMode {
        match (self.timing, self.deferment > 0) {
            (Timing::Advance, false) => ScheduleMode::AdvanceImmediate,
            (Timing::Advance, true) => ScheduleMode::AdvanceDeferred,
            (Timing::Arrears, false) => ScheduleMode::ArrearsImmediate,
            (Timing::Arrears, true) => ScheduleMode::ArrearsDeferred,
        }
    }

    /// Whole-year payment window `[start, end)` for a table with limiting age `omega`
    pub fn window(&self, omega: u32) -> Result<(u32, u32)> {
        let horizon = omega.checked_sub(self.initial_age).ok_or_else(|| {
            AnnuityError::out_of_range(format!(
                "Initial age {} is beyond the limiting age {}",
                self.initial_age, omega
            ))
        })?;

        let start = self.deferment;
        let end = match self.term {
            Term::WholeLife => horizon,
            Term::Years(years) => {
                let end = self.deferment.checked_add(years).ok_or_else(|| {
                    AnnuityError::out_of_range(format!(
                        "Deferment of {} years plus a {} year term overflows",
                        self.deferment, years
                    ))
                })?;
                if end > horizon {
                    return Err(AnnuityError::out_of_range(format!(
                        "Payments to year {} run past the limiting age {} for initial age {}",
                        end, omega, self.initial_age
                    )));
                }
                end
            }
        };

        Ok((start, end.max(start)))
    }

    /// Ordered payment epochs
    pub fn generate(&self, omega: u32) -> Result<Vec<PaymentEpoch>> {
        let (start, end) = self.window(omega)?;
        let per_year = self.frequency as f64;
        let (first_j, last_j) = match self.timing {
            Timing::Advance => (0, self.frequency - 1),
            Timing::Arrears => (1, self.frequency),
        };

        let mut epochs = Vec::with_capacity((end - start) as usize * self.frequency as usize);
        for year in start..end {
            for j in first_j..=last_j {
                let t = year as f64 + j as f64 / per_year;
                epochs.push(PaymentEpoch {
                    k: self.initial_age + year + j / self.frequency,
                    t,
                    t_relative: t - self.deferment as f64,
                    j,
                });
            }
        }

        log::debug!(
            "{:?} schedule: {} epochs over years [{}, {})",
            self.mode(),
            epochs.len(),
            start,
            end
        );
        Ok(epochs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OMEGA: u32 = 120;

    fn times(epochs: &[PaymentEpoch]) -> Vec<f64> {
        epochs.iter().map(|e| e.t).collect()
    }

    #[test]
    fn test_advance_immediate_whole_life() {
        let schedule = ScheduleGenerator::new(Timing::Advance, 48, 0, Term::WholeLife, 1)
            .unwrap()
            .generate(OMEGA)
            .unwrap();

        assert_eq!(schedule.len(), 72);
        assert_eq!(schedule[0].t, 0.0);
        assert_eq!(schedule.last().unwrap().t, 71.0);
        assert_eq!(schedule[10].k, 58);
    }

    #[test]
    fn test_arrears_deferred_temporary() {
        let generator = ScheduleGenerator::new(Timing::Arrears, 48, 2, Term::Years(10), 1).unwrap();
        assert_eq!(generator.mode(), ScheduleMode::ArrearsDeferred);

        let schedule = generator.generate(OMEGA).unwrap();
        assert_eq!(times(&schedule), (3..=12).map(|t| t as f64).collect::<Vec<_>>());
        assert!(schedule.iter().all(|e| e.t > 2.0 && e.t <= 12.0));
        assert_eq!(schedule[0].t_relative, 1.0);
    }

    #[test]
    fn test_advance_deferred_includes_deferment_date() {
        let schedule = ScheduleGenerator::new(Timing::Advance, 60, 5, Term::Years(3), 1)
            .unwrap()
            .generate(OMEGA)
            .unwrap();
        assert_eq!(times(&schedule), vec![5.0, 6.0, 7.0]);
        assert_eq!(schedule[0].t_relative, 0.0);
    }

    #[test]
    fn test_monthly_epochs() {
        let advance = ScheduleGenerator::new(Timing::Advance, 65, 0, Term::Years(1), 12)
            .unwrap()
            .generate(OMEGA)
            .unwrap();
        assert_eq!(advance.len(), 12);
        assert_eq!(advance[0].t, 0.0);
        assert_eq!(advance[11].j, 11);

        let arrears = ScheduleGenerator::new(Timing::Arrears, 65, 0, Term::Years(1), 12)
            .unwrap()
            .generate(OMEGA)
            .unwrap();
        assert_eq!(arrears.len(), 12);
        assert_eq!(arrears[0].t, 1.0 / 12.0);
        assert_eq!(arrears[11].t, 1.0);
        assert_eq!(arrears[11].k, 66);
        assert_eq!(arrears[10].k, 65);

        for pair in arrears.windows(2) {
            assert!(pair[1].t > pair[0].t);
        }
    }

    #[test]
    fn test_term_past_limiting_age() {
        let generator = ScheduleGenerator::new(Timing::Arrears, 100, 5, Term::Years(20), 1).unwrap();
        assert!(matches!(
            generator.generate(OMEGA),
            Err(AnnuityError::OutOfRange(_))
        ));

        let generator = ScheduleGenerator::new(Timing::Arrears, 121, 0, Term::WholeLife, 1).unwrap();
        assert!(generator.generate(OMEGA).is_err());
    }

    #[test]
    fn test_huge_deferment_with_term_is_out_of_range() {
        let generator =
            ScheduleGenerator::new(Timing::Arrears, 65, u32::MAX, Term::Years(5), 1).unwrap();
        assert!(matches!(
            generator.generate(OMEGA),
            Err(AnnuityError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_deferment_past_horizon_is_empty() {
        let schedule = ScheduleGenerator::new(Timing::Advance, 110, 15, Term::WholeLife, 1)
            .unwrap()
            .generate(OMEGA)
            .unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ScheduleGenerator::new(Timing::Advance, 60, 0, Term::WholeLife, 0).is_err());
        assert!(ScheduleGenerator::new(Timing::Advance, 60, 0, Term::Years(0), 1).is_err());
    }
}
