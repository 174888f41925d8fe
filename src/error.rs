//! Error types shared by the table builder and the valuation engine

use thiserror::Error;

/// Errors raised while building tables or valuing a contract
///
/// Every error is raised at the point of detection; the computation is
/// deterministic so the same input always fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnuityError {
    /// Invalid or inconsistent configuration (unknown table, unborn cohort,
    /// bad sex mix, missing parameter combination)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Requested age or duration lies outside the available data
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Interest rate at or below -100%
    #[error("invalid rate {rate}: rates must be greater than -100%")]
    InvalidRate { rate: f64 },
}

impl AnnuityError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        AnnuityError::Configuration(msg.into())
    }

    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        AnnuityError::OutOfRange(msg.into())
    }
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, AnnuityError>;
