//! Generation-adjusted survival tables
//!
//! A generational table follows one birth cohort from its age in the table's
//! base year up to the limiting age, projecting each base rate forward with
//! the table's improvement factor:
//!
//! ```text
//! q(x+t) = q0(x+t) * exp(-lambda(x+t) * t)
//! ```
//!
//! Survivors start from a radix of 1,000,000 and follow
//! `lx[k] = lx[k-1] * (1 - q[k-1])`.

use super::provider::{MortalityRate, MortalityTableProvider};
use super::tables::{Gender, TableId};
use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};

/// Limiting age of every generational table
pub const OMEGA: u32 = 120;

/// Survivors at the cohort's starting age
pub const RADIX: f64 = 1_000_000.0;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Male/female proportions used to blend a unisex table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SexMixWeights")]
pub struct SexMix {
    male: f64,
    female: f64,
}

#[derive(Deserialize)]
struct SexMixWeights {
    male: f64,
    female: f64,
}

impl SexMix {
    /// Weights must lie in [0, 1] and sum to 1
    pub fn new(male: f64, female: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&male) || !(0.0..=1.0).contains(&female) {
            return Err(AnnuityError::config(format!(
                "Sex-mix weights must lie in [0, 1], got male={male}, female={female}"
            )));
        }
        if (male + female - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnnuityError::config(format!(
                "Sex-mix weights must sum to 1, got {}",
                male + female
            )));
        }
        Ok(Self { male, female })
    }

    pub fn from_male_weight(male: f64) -> Result<Self> {
        Self::new(male, 1.0 - male)
    }

    pub fn male(&self) -> f64 {
        self.male
    }

    pub fn female(&self) -> f64 {
        self.female
    }

    pub(crate) fn key(&self) -> (u64, u64) {
        (self.male.to_bits(), self.female.to_bits())
    }
}

impl Default for SexMix {
    fn default() -> Self {
        Self { male: 0.5, female: 0.5 }
    }
}

impl TryFrom<SexMixWeights> for SexMix {
    type Error = AnnuityError;

    fn try_from(value: SexMixWeights) -> Result<Self> {
        Self::new(value.male, value.female)
    }
}

/// One row of a generational table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationalRow {
    /// Years since the cohort's starting age
    pub k: u32,
    /// Absolute age x+t
    pub age: u32,
    /// Improvement-adjusted mortality rate
    pub q: f64,
    pub lx: f64,
    pub dx: f64,
}

/// Survival table for one (birth year, table, sex mix) cohort
///
/// Immutable once built; safe to share across valuations.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationalTable {
    birth_year: i32,
    table: TableId,
    sex_mix: SexMix,
    rows: Vec<GenerationalRow>,
}

impl GenerationalTable {
    pub fn birth_year(&self) -> i32 {
        self.birth_year
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    pub fn sex_mix(&self) -> SexMix {
        self.sex_mix
    }

    pub fn rows(&self) -> &[GenerationalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Age in the table's base year
    pub fn start_age(&self) -> u32 {
        self.rows.first().map(|r| r.age).unwrap_or(OMEGA)
    }

    pub fn max_age(&self) -> u32 {
        self.rows.last().map(|r| r.age).unwrap_or(OMEGA)
    }

    /// Row at an absolute age, if the table covers it
    pub fn row(&self, age: u32) -> Option<&GenerationalRow> {
        let index = age.checked_sub(self.start_age())?;
        self.rows.get(index as usize)
    }

    pub fn lx(&self, age: u32) -> Option<f64> {
        self.row(age).map(|r| r.lx)
    }
}

/// Improvement-adjusted mortality rate `q0 * exp(-lambda * t)`, capped to [0, 1]
pub fn adjusted_rate(base_rate: f64, improvement: f64, years: f64) -> f64 {
    (base_rate * (-improvement * years).exp()).clamp(0.0, 1.0)
}

/// Builds generational tables from an injected mortality data source
pub struct GenerationalTableBuilder<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: MortalityTableProvider + ?Sized> GenerationalTableBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Build the table for a birth cohort
    ///
    /// Fails with a configuration error when the birth year is after the
    /// table's base year or the provider does not hold the table.
    pub fn build(
        &self,
        birth_year: i32,
        table: &TableId,
        sex_mix: Option<SexMix>,
    ) -> Result<GenerationalTable> {
        let base_year = table.base_year();
        if birth_year > base_year {
            return Err(AnnuityError::config(format!(
                "Birth year {birth_year} is after the {table} base year {base_year}"
            )));
        }

        let start_age = base_year - birth_year;
        if start_age > OMEGA as i32 {
            return Err(AnnuityError::out_of_range(format!(
                "Birth year {birth_year} gives age {start_age} in {base_year}, beyond the limiting age {OMEGA}"
            )));
        }
        let start_age = start_age as u32;
        let sex_mix = sex_mix.unwrap_or_default();

        let rates = if table.is_unisex() {
            let male = self.adjusted_rates(&table.for_gender(Gender::Male), start_age)?;
            let female = self.adjusted_rates(&table.for_gender(Gender::Female), start_age)?;
            male.iter()
                .zip(&female)
                .map(|(qm, qf)| sex_mix.male() * qm + sex_mix.female() * qf)
                .collect()
        } else {
            self.adjusted_rates(table, start_age)?
        };

        let mut rows = Vec::with_capacity(rates.len());
        let mut lx = RADIX;
        for (k, &q) in rates.iter().enumerate() {
            rows.push(GenerationalRow {
                k: k as u32,
                age: start_age + k as u32,
                q,
                lx,
                dx: lx * q,
            });
            lx *= 1.0 - q;
        }

        log::debug!(
            "Built generational table {} for birth year {}: ages {}..={}",
            table,
            birth_year,
            start_age,
            OMEGA
        );

        Ok(GenerationalTable {
            birth_year,
            table: *table,
            sex_mix,
            rows,
        })
    }

    /// Adjusted rates for ages start_age..=OMEGA; ages missing from the source die with certainty
    fn adjusted_rates(&self, table: &TableId, start_age: u32) -> Result<Vec<f64>> {
        let source = self.provider.rates(table)?;

        let mut by_age: Vec<Option<&MortalityRate>> = vec![None; OMEGA as usize + 1];
        for rate in source.iter().filter(|r| r.age <= OMEGA) {
            by_age[rate.age as usize] = Some(rate);
        }

        Ok((start_age..=OMEGA)
            .map(|age| match by_age[age as usize] {
                Some(rate) => adjusted_rate(rate.base_rate, rate.improvement, (age - start_age) as f64),
                None => 1.0,
            })
            .collect())
    }
}

/// Build a generational table from a table name
pub fn build_generational_table<P: MortalityTableProvider + ?Sized>(
    provider: &P,
    birth_year: i32,
    table_id: &str,
    sex_mix: Option<SexMix>,
) -> Result<GenerationalTable> {
    let table: TableId = table_id.parse()?;
    GenerationalTableBuilder::new(provider).build(birth_year, &table, sex_mix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::fixtures;
    use crate::mortality::{InMemoryProvider, MortalityRate};
    use approx::assert_relative_eq;

    #[test]
    fn test_starting_age_and_extent() {
        let provider = fixtures::provider();
        let table = build_generational_table(&provider, 1958, "PERM2000C", None).unwrap();

        assert_eq!(table.start_age(), 42);
        assert_eq!(table.max_age(), OMEGA);
        assert_eq!(table.len(), (OMEGA - 42 + 1) as usize);
        assert_eq!(table.rows()[0].lx, RADIX);

        for pair in table.rows().windows(2) {
            assert_eq!(pair[1].age, pair[0].age + 1);
            assert_eq!(pair[1].k, pair[0].k + 1);
        }
    }

    #[test]
    fn test_lx_recursion() {
        let provider = fixtures::provider();
        let table = build_generational_table(&provider, 1950, "PERF2000P", None).unwrap();

        for pair in table.rows().windows(2) {
            assert_relative_eq!(pair[1].lx, pair[0].lx * (1.0 - pair[0].q));
            assert!(pair[1].lx <= pair[0].lx);
        }
        for row in table.rows() {
            assert_relative_eq!(row.dx, row.lx * row.q);
        }
    }

    #[test]
    fn test_improvement_adjustment() {
        let provider = fixtures::provider();
        let table: TableId = "PERM2000C".parse().unwrap();
        let generational = GenerationalTableBuilder::new(&provider)
            .build(1960, &table, None)
            .unwrap();

        let source = provider.rates(&table).unwrap();
        let raw = source.iter().find(|r| r.age == 55).unwrap();
        let row = generational.row(55).unwrap();
        assert_eq!(row.k, 15);
        assert_relative_eq!(row.q, raw.base_rate * (-raw.improvement * 15.0).exp());
    }

    #[test]
    fn test_ages_beyond_source_die_with_certainty() {
        let provider = InMemoryProvider::new()
            .with_table(
                "PERM2000P".parse().unwrap(),
                (0..=100).map(|age| MortalityRate::new(age, 0.01, 0.0)).collect(),
            )
            .unwrap();

        let table = build_generational_table(&provider, 1930, "PERM2000P", None).unwrap();
        assert_eq!(table.row(100).unwrap().q, 0.01);
        assert_eq!(table.row(101).unwrap().q, 1.0);
        assert_eq!(table.lx(102), Some(0.0));
        assert_eq!(table.lx(OMEGA), Some(0.0));
    }

    #[test]
    fn test_unisex_blend() {
        let provider = fixtures::provider();
        let mix = SexMix::new(0.7, 0.3).unwrap();

        let male = build_generational_table(&provider, 1955, "PERM2000C", None).unwrap();
        let female = build_generational_table(&provider, 1955, "PERF2000C", None).unwrap();
        let blend = build_generational_table(&provider, 1955, "PER2000C", Some(mix)).unwrap();

        for ((m, f), b) in male.rows().iter().zip(female.rows()).zip(blend.rows()) {
            assert_relative_eq!(b.q, 0.7 * m.q + 0.3 * f.q);
        }
        assert_eq!(blend.sex_mix(), mix);
    }

    #[test]
    fn test_configuration_errors() {
        let provider = fixtures::provider();

        let err = build_generational_table(&provider, 2001, "PERM2000C", None).unwrap_err();
        assert!(matches!(err, AnnuityError::Configuration(_)));

        // 2012-based tables accept cohorts up to 2012
        assert!(build_generational_table(&provider, 2010, "PERM_2020_Indiv_2Orden", None).is_ok());
        assert!(build_generational_table(&provider, 2013, "PERM_2020_Indiv_2Orden", None).is_err());

        let err = build_generational_table(&provider, 1950, "TABLA_X", None).unwrap_err();
        assert!(matches!(err, AnnuityError::Configuration(_)));

        let err = build_generational_table(&provider, 1950, "PERM_2020_Colectivos_1Orden", None)
            .unwrap_err();
        assert!(matches!(err, AnnuityError::Configuration(_)));
    }

    #[test]
    fn test_sex_mix_validation() {
        assert!(SexMix::new(0.5, 0.5).is_ok());
        assert!(SexMix::new(0.6, 0.4000000001).is_ok());
        assert!(matches!(
            SexMix::new(0.6, 0.5),
            Err(AnnuityError::Configuration(_))
        ));
        assert!(SexMix::new(1.2, -0.2).is_err());
        assert!(serde_json::from_str::<SexMix>(r#"{"male":0.9,"female":0.9}"#).is_err());

        let mix: SexMix = serde_json::from_str(r#"{"male":0.25,"female":0.75}"#).unwrap();
        assert_eq!(mix.male(), 0.25);
    }
}
