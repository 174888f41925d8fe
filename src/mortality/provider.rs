//! Raw mortality data supplied to the generational table builder

use super::tables::TableId;
use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One source row: base mortality rate and annual improvement factor at an absolute age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortalityRate {
    pub age: u32,
    pub base_rate: f64,
    pub improvement: f64,
}

impl MortalityRate {
    pub fn new(age: u32, base_rate: f64, improvement: f64) -> Self {
        Self { age, base_rate, improvement }
    }
}

/// Source of raw per-table mortality rates keyed by absolute age
///
/// Implementations return rows sorted by age. Asking for a table the
/// provider does not hold is a configuration error.
pub trait MortalityTableProvider {
    fn rates(&self, table: &TableId) -> Result<&[MortalityRate]>;
}

impl<P: MortalityTableProvider + ?Sized> MortalityTableProvider for &P {
    fn rates(&self, table: &TableId) -> Result<&[MortalityRate]> {
        (**self).rates(table)
    }
}

/// Immutable in-memory table store, populated once and then shared
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    tables: HashMap<TableId, Vec<MortalityRate>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single-sex table. Rows are sorted by age.
    pub fn insert(&mut self, table: TableId, mut rates: Vec<MortalityRate>) -> Result<()> {
        if table.is_unisex() {
            return Err(AnnuityError::config(format!(
                "{table} is a blended table; register the male and female tables instead"
            )));
        }

        for rate in &rates {
            if !(0.0..=1.0).contains(&rate.base_rate) {
                return Err(AnnuityError::config(format!(
                    "{table}: base mortality rate {} at age {} is outside [0, 1]",
                    rate.base_rate, rate.age
                )));
            }
            if !rate.improvement.is_finite() {
                return Err(AnnuityError::config(format!(
                    "{table}: improvement factor at age {} is not finite",
                    rate.age
                )));
            }
        }

        rates.sort_by_key(|r| r.age);
        if let Some(pair) = rates.windows(2).find(|w| w[0].age == w[1].age) {
            return Err(AnnuityError::config(format!(
                "{table}: duplicate rows for age {}",
                pair[0].age
            )));
        }

        self.tables.insert(table, rates);
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_table(mut self, table: TableId, rates: Vec<MortalityRate>) -> Result<Self> {
        self.insert(table, rates)?;
        Ok(self)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableId> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl MortalityTableProvider for InMemoryProvider {
    fn rates(&self, table: &TableId) -> Result<&[MortalityRate]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| AnnuityError::config(format!("Mortality table not loaded: {table}")))
    }
}
