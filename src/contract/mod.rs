//! Annuity contract data and block loading

mod data;
pub mod loader;

pub use data::{AmountBasis, AnnuityContract, Term, Timing};
pub use loader::{load_contracts, ContractRecord};
