//! Annuity valuation: discounting, payment schedules, progressions and the engine

mod cashflows;
mod discount;
mod engine;
mod progression;
mod schedule;
mod steps;

pub use cashflows::{CashflowRow, ValuationResult, ValuationSummary};
pub use discount::{DiscountCurve, InterestRate};
pub use engine::{value_annuity, ValuationEngine};
pub use progression::{PaymentAmountModel, ProgressionRule};
pub use schedule::{PaymentEpoch, ScheduleGenerator, ScheduleMode};
pub use steps::{Step, StepSchedule};
