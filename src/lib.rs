//! Life Annuity - Actuarial present value engine for life annuities
//!
//! This library provides:
//! - Generational mortality tables built from cohort tables and improvement factors
//! - Survival probabilities at fractional durations
//! - Flat and stepwise discounting at any payment frequency
//! - Payment schedules for advance/arrears, immediate/deferred, whole-life/temporary annuities
//! - Level, arithmetic and geometric payment progressions
//! - Batch valuation with cached generational tables

pub mod contract;
pub mod error;
pub mod mortality;
pub mod runner;
pub mod valuation;

// Re-export commonly used types
pub use contract::{AmountBasis, AnnuityContract, Term, Timing};
pub use error::{AnnuityError, Result};
pub use mortality::{
    build_generational_table, GenerationalTable, GenerationalTableBuilder, InMemoryProvider,
    MortalityTableProvider, SexMix, TableId,
};
pub use runner::{ValuationRequest, ValuationRunner};
pub use valuation::{value_annuity, InterestRate, ProgressionRule, ValuationEngine, ValuationResult};
