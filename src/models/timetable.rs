//! Committed timetable cells and the persisted snapshot form.
//!
//! A cell's (subject, teacher) pair is atomic: the store only ever holds
//! fully-populated cells, so the pair can never be half-updated. Empty slots
//! are represented by absence.

use crate::api::{PeriodId, SectionId, SubjectId, TeacherId};
use crate::models::grid::Day;
use crate::models::year::AcademicYear;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A (day, period, section) coordinate in the timetable.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotKey {
    pub day: Day,
    pub period_id: PeriodId,
    pub section_id: SectionId,
}

/// One committed timetable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableCell {
    pub day: Day,
    pub period_id: PeriodId,
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
}

impl TimetableCell {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            period_id: self.period_id,
            section_id: self.section_id,
        }
    }
}

/// Persisted form of one academic year's committed cells.
///
/// The checksum covers the canonical JSON of the cell list, so a snapshot
/// that was truncated or edited out-of-band is rejected on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableSnapshot {
    pub year: AcademicYear,
    pub cells: Vec<TimetableCell>,
    #[serde(default)]
    pub checksum: String,
}

impl TimetableSnapshot {
    /// Build a snapshot with a freshly computed checksum.
    pub fn new(year: AcademicYear, mut cells: Vec<TimetableCell>) -> Self {
        cells.sort_by_key(|c| c.slot());
        let checksum = cells_checksum(&cells);
        TimetableSnapshot {
            year,
            cells,
            checksum,
        }
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize timetable snapshot")
    }
}

/// Parse a snapshot from its persisted JSON form, verifying the checksum.
///
/// Snapshots written before checksums were recorded (empty checksum field)
/// are accepted and get a checksum on the next save.
///
/// # Arguments
/// * `json` - Persisted snapshot JSON
///
/// # Returns
/// The parsed snapshot with cells in canonical slot order.
pub fn parse_snapshot_json_str(json: &str) -> Result<TimetableSnapshot> {
    let mut snapshot: TimetableSnapshot =
        serde_json::from_str(json).context("Failed to deserialize timetable snapshot")?;

    snapshot.cells.sort_by_key(|c| c.slot());

    if !snapshot.checksum.is_empty() {
        let computed = cells_checksum(&snapshot.cells);
        if computed != snapshot.checksum {
            anyhow::bail!(
                "Snapshot checksum mismatch for {}: expected {}, computed {}",
                snapshot.year,
                snapshot.checksum,
                computed
            );
        }
    }

    Ok(snapshot)
}

/// Checksum of the canonical cell-list JSON.
fn cells_checksum(cells: &[TimetableCell]) -> String {
    // Compact encoding; the pretty form is for humans reading the file.
    let canonical = serde_json::to_string(cells).unwrap_or_default();
    crate::db::checksum::calculate_checksum(&canonical)
}
