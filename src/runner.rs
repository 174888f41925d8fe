//! Valuation runner for efficient batch valuations
//!
//! Holds the mortality data once and caches each generational table by
//! (birth year, table, sex mix), so many contracts on the same cohort share
//! a single table build.

use crate::contract::AnnuityContract;
use crate::error::Result;
use crate::mortality::{GenerationalTable, GenerationalTableBuilder, MortalityTableProvider, SexMix, TableId};
use crate::valuation::{value_annuity, ValuationResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything needed to value one annuity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub birth_year: i32,
    pub table: TableId,
    #[serde(default)]
    pub sex_mix: Option<SexMix>,
    pub contract: AnnuityContract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TableKey {
    birth_year: i32,
    table: TableId,
    sex_mix: (u64, u64),
}

impl TableKey {
    fn new(birth_year: i32, table: TableId, sex_mix: Option<SexMix>) -> Self {
        Self {
            birth_year,
            table,
            sex_mix: sex_mix.unwrap_or_default().key(),
        }
    }
}

/// Pre-loaded valuation runner
///
/// # Example
/// ```ignore
/// let mut runner = ValuationRunner::new(load_tables(Path::new(DEFAULT_TABLES_PATH))?);
///
/// for rate in [0.02, 0.03, 0.04] {
///     let request = ValuationRequest { ... };
///     let result = runner.value(&request)?;
/// }
/// ```
#[derive(Debug)]
pub struct ValuationRunner<P> {
    provider: P,
    tables: HashMap<TableKey, Arc<GenerationalTable>>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl<P: MortalityTableProvider> ValuationRunner<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            tables: HashMap::new(),
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Generational table for a cohort, built on first use
    pub fn table(
        &mut self,
        birth_year: i32,
        table: &TableId,
        sex_mix: Option<SexMix>,
    ) -> Result<Arc<GenerationalTable>> {
        let key = TableKey::new(birth_year, *table, sex_mix);
        if let Some(cached) = self.tables.get(&key) {
            self.cache_hits += 1;
            return Ok(Arc::clone(cached));
        }

        self.cache_misses += 1;
        let built = Arc::new(GenerationalTableBuilder::new(&self.provider).build(birth_year, table, sex_mix)?);
        self.tables.insert(key, Arc::clone(&built));
        Ok(built)
    }

    /// Value a single request
    pub fn value(&mut self, request: &ValuationRequest) -> Result<ValuationResult> {
        let table = self.table(request.birth_year, &request.table, request.sex_mix)?;
        value_annuity(&request.contract, &table)
    }

    /// Value many requests, in parallel once their tables are built
    ///
    /// Results come back in input order; a failing request does not stop the others.
    pub fn value_batch(&mut self, requests: &[ValuationRequest]) -> Vec<Result<ValuationResult>> {
        let tables: Vec<Result<Arc<GenerationalTable>>> = requests
            .iter()
            .map(|r| self.table(r.birth_year, &r.table, r.sex_mix))
            .collect();

        log::info!(
            "Valuing {} contracts on {} cached tables",
            requests.len(),
            self.tables.len()
        );

        requests
            .par_iter()
            .zip(tables.par_iter())
            .map(|(request, table)| {
                let table = table.as_ref().map_err(Clone::clone)?;
                value_annuity(&request.contract, table)
            })
            .collect()
    }

    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn clear_cache(&mut self) {
        self.tables.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    /// Cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
