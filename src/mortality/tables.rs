//! Mortality table identifiers
//!
//! Two families are recognised:
//! - PER 2000 (base cohort year 2000): `PERM2000C`, `PERF2000C`, `PERM2000P`, `PERF2000P`
//! - PER 2020 (base cohort year 2012): `PER{M,F}_2020_{Indiv,Colectivos}_{1,2}Orden`
//!
//! Dropping the sex letter names the blended (unisex) table, e.g. `PER2000C`.

use crate::error::{AnnuityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sex of a single-sex table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Sex dimension of a table identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSex {
    Male,
    Female,
    /// Weighted blend of the male and female tables
    Unisex,
}

/// PER 2000 portfolio: in-force book ("C") or new business ("P")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Per2000Book {
    InForce,
    NewBusiness,
}

/// PER 2020 business line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Per2020Book {
    Individual,
    Collective,
}

/// PER 2020 order: first order carries a prudence margin, second order is best estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOrder {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFamily {
    Per2000(Per2000Book),
    Per2020 { book: Per2020Book, order: TableOrder },
}

impl TableFamily {
    /// Cohort year the base rates describe
    pub fn base_year(&self) -> i32 {
        match self {
            TableFamily::Per2000(_) => 2000,
            TableFamily::Per2020 { .. } => 2012,
        }
    }

    /// Rate order (PER 2020 only)
    pub fn order(&self) -> Option<TableOrder> {
        match self {
            TableFamily::Per2000(_) => None,
            TableFamily::Per2020 { order, .. } => Some(*order),
        }
    }
}

/// Identifier of a mortality table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableId {
    pub family: TableFamily,
    pub sex: TableSex,
}

impl TableId {
    pub fn new(family: TableFamily, sex: TableSex) -> Self {
        Self { family, sex }
    }

    pub fn base_year(&self) -> i32 {
        self.family.base_year()
    }

    pub fn is_unisex(&self) -> bool {
        self.sex == TableSex::Unisex
    }

    /// Same family, single-sex counterpart
    pub fn for_gender(&self, gender: Gender) -> Self {
        let sex = match gender {
            Gender::Male => TableSex::Male,
            Gender::Female => TableSex::Female,
        };
        Self { family: self.family, sex }
    }

    /// All twelve single-sex tables
    pub fn single_sex_tables() -> Vec<TableId> {
        let mut families = vec![
            TableFamily::Per2000(Per2000Book::InForce),
            TableFamily::Per2000(Per2000Book::NewBusiness),
        ];
        for book in [Per2020Book::Individual, Per2020Book::Collective] {
            for order in [TableOrder::First, TableOrder::Second] {
                families.push(TableFamily::Per2020 { book, order });
            }
        }

        families
            .into_iter()
            .flat_map(|family| {
                [
                    TableId::new(family, TableSex::Male),
                    TableId::new(family, TableSex::Female),
                ]
            })
            .collect()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sex = match self.sex {
            TableSex::Male => "M",
            TableSex::Female => "F",
            TableSex::Unisex => "",
        };
        match self.family {
            TableFamily::Per2000(book) => {
                let code = match book {
                    Per2000Book::InForce => "C",
                    Per2000Book::NewBusiness => "P",
                };
                write!(f, "PER{sex}2000{code}")
            }
            TableFamily::Per2020 { book, order } => {
                let book = match book {
                    Per2020Book::Individual => "Indiv",
                    Per2020Book::Collective => "Colectivos",
                };
                let order = match order {
                    TableOrder::First => "1Orden",
                    TableOrder::Second => "2Orden",
                };
                write!(f, "PER{sex}_2020_{book}_{order}")
            }
        }
    }
}

impl FromStr for TableId {
    type Err = AnnuityError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || AnnuityError::config(format!("Unknown mortality table: {s}"));

        let rest = s.trim().strip_prefix("PER").ok_or_else(unknown)?;
        let (sex, rest) = if let Some(rest) = rest.strip_prefix('M') {
            (TableSex::Male, rest)
        } else if let Some(rest) = rest.strip_prefix('F') {
            (TableSex::Female, rest)
        } else {
            (TableSex::Unisex, rest)
        };

        let family = match rest {
            "2000C" => TableFamily::Per2000(Per2000Book::InForce),
            "2000P" => TableFamily::Per2000(Per2000Book::NewBusiness),
            _ => {
                let rest = rest.strip_prefix("_2020_").ok_or_else(unknown)?;
                let (book, order) = rest.split_once('_').ok_or_else(unknown)?;
                let book = match book {
                    "Indiv" => Per2020Book::Individual,
                    "Colectivos" => Per2020Book::Collective,
                    _ => return Err(unknown()),
                };
                let order = match order {
                    "1Orden" => TableOrder::First,
                    "2Orden" => TableOrder::Second,
                    _ => return Err(unknown()),
                };
                TableFamily::Per2020 { book, order }
            }
        };

        Ok(TableId { family, sex })
    }
}

impl TryFrom<String> for TableId {
    type Error = AnnuityError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TableId> for String {
    fn from(value: TableId) -> Self {
        value.to_string()
    }
}
