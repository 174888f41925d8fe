//! Mortality data, generational tables and survival probabilities

mod generational;
pub mod loader;
mod provider;
mod survival;
mod tables;

pub use generational::{
    adjusted_rate, build_generational_table, GenerationalRow, GenerationalTable,
    GenerationalTableBuilder, SexMix, OMEGA, RADIX,
};
pub use loader::{load_tables, DEFAULT_TABLES_PATH};
pub use provider::{InMemoryProvider, MortalityRate, MortalityTableProvider};
pub use survival::{complete_life_expectancy, death_probability, survival, SurvivalInterpolator};
pub use tables::{Gender, Per2000Book, Per2020Book, TableFamily, TableId, TableOrder, TableSex};
