//! Public API surface for the timetabling engine.
//!
//! This file consolidates the identifier newtypes and the report DTOs shared
//! across layers. All types derive Serialize/Deserialize for JSON adapters.

use serde::{Deserialize, Serialize};

pub use crate::models::catalog::{Catalog, QuotaSpec, Section, Subject, Teacher};
pub use crate::models::grid::{Day, Period, PeriodGrid, PeriodKind};
pub use crate::models::timetable::{SlotKey, TimetableCell, TimetableSnapshot};
pub use crate::models::year::AcademicYear;

/// Grade-section identifier (catalog primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionId(pub i64);

/// Subject identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

/// Teacher identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeacherId(pub i64);

/// Period identifier within the weekly grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodId(pub i64);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

impl_id!(SectionId);
impl_id!(SubjectId);
impl_id!(TeacherId);
impl_id!(PeriodId);

/// Remaining and initial weekly allocation for one subject in one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub subject_id: SubjectId,
    pub section_id: SectionId,
    pub remaining: u32,
    pub initial: u32,
}

/// Quota units the generator could not place for one (section, subject) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub unmet_units: u32,
}

/// Options for an automatic generation run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Replaces every teacher's weekly workload cap for this run only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workload_override: Option<u32>,
    /// Seed for tie-breaking between equally scarce queue entries.
    /// Runs with the same inputs and seed are identical.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Outcome of an automatic generation run.
///
/// A non-empty shortfall list is not an error: it enumerates the quota units
/// no admissible slot/teacher combination could absorb, for manual follow-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub year: AcademicYear,
    pub committed: Vec<TimetableCell>,
    pub shortfalls: Vec<Shortfall>,
    pub cancelled: bool,
}

impl GenerationReport {
    /// Total quota units left unplaced.
    pub fn unmet_units(&self) -> u32 {
        self.shortfalls.iter().map(|s| s.unmet_units).sum()
    }
}
