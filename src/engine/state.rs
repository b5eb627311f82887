//! Per-year mutable scheduling state.
//!
//! `YearState` is the unit guarded by the year transaction boundary: the
//! committed cells plus the quota ledger and workload tracker, mutated only
//! through the atomic [`YearState::assign`] / [`YearState::remove`]
//! primitives so the aggregates never drift from the cells.

use crate::api::{PeriodId, SectionId, SlotKey, SubjectId, TeacherId, TimetableCell};
use crate::api::{AcademicYear, QuotaStatus};
use crate::engine::ledger::QuotaLedger;
use crate::engine::validator;
use crate::engine::workload::WorkloadTracker;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::catalog::Catalog;
use crate::models::grid::{Day, PeriodGrid};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The (subject, teacher) payload of an occupied cell. Atomic: committed and
/// removed as one value, never updated field-by-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAssignment {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
}

/// A proposed single-cell assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub day: Day,
    pub period_id: PeriodId,
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
}

impl AssignmentRequest {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            period_id: self.period_id,
            section_id: self.section_id,
        }
    }

    fn cell(&self) -> TimetableCell {
        TimetableCell {
            day: self.day,
            period_id: self.period_id,
            section_id: self.section_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
        }
    }
}

impl From<TimetableCell> for AssignmentRequest {
    fn from(cell: TimetableCell) -> Self {
        AssignmentRequest {
            day: cell.day,
            period_id: cell.period_id,
            section_id: cell.section_id,
            subject_id: cell.subject_id,
            teacher_id: cell.teacher_id,
        }
    }
}

/// Committed cells and running aggregates for one academic year.
#[derive(Debug, Clone)]
pub struct YearState {
    year: AcademicYear,
    grid: Arc<PeriodGrid>,
    catalog: Arc<Catalog>,
    cells: BTreeMap<SlotKey, CellAssignment>,
    ledger: QuotaLedger,
    tracker: WorkloadTracker,
}

impl YearState {
    /// Fresh state with an empty grid and full quotas.
    pub fn new(year: AcademicYear, grid: Arc<PeriodGrid>, catalog: Arc<Catalog>) -> Self {
        let ledger = QuotaLedger::from_catalog(&catalog);
        let tracker = WorkloadTracker::from_catalog(&catalog);
        YearState {
            year,
            grid,
            catalog,
            cells: BTreeMap::new(),
            ledger,
            tracker,
        }
    }

    /// Rebuild state from a persisted snapshot by replaying every cell
    /// through the assign primitive, recomputing ledger and tracker.
    ///
    /// A snapshot that violates any invariant (double-booked teacher,
    /// over-quota subject, cell on a break period) is rejected as a
    /// persistence failure rather than silently repaired.
    pub fn from_cells(
        year: AcademicYear,
        grid: Arc<PeriodGrid>,
        catalog: Arc<Catalog>,
        cells: Vec<TimetableCell>,
    ) -> ScheduleResult<Self> {
        let mut state = Self::new(year, grid, catalog);
        for cell in cells {
            state.assign(cell.into(), None).map_err(|e| {
                ScheduleError::PersistenceFailure(
                    crate::db::repository::RepositoryError::validation(format!(
                        "stored snapshot for {} violates invariants: {}",
                        state.year, e
                    )),
                )
            })?;
        }
        Ok(state)
    }

    pub fn year(&self) -> &AcademicYear {
        &self.year
    }

    pub fn grid(&self) -> &PeriodGrid {
        &self.grid
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    pub fn tracker(&self) -> &WorkloadTracker {
        &self.tracker
    }

    /// Validate and commit one cell as one atomic unit: check, reserve
    /// quota, reserve workload, write. On any failure nothing changes.
    pub fn assign(
        &mut self,
        request: AssignmentRequest,
        cap_override: Option<u32>,
    ) -> ScheduleResult<TimetableCell> {
        validator::can_assign(
            &self.grid,
            &self.catalog,
            &self.cells,
            &self.ledger,
            &self.tracker,
            &request,
            cap_override,
        )?;

        self.ledger.reserve(request.subject_id, request.section_id)?;
        if let Err(e) = self.tracker.reserve(request.teacher_id, cap_override) {
            // Both reservations land together or not at all.
            let _ = self.ledger.release(request.subject_id, request.section_id);
            return Err(e);
        }

        let cell = request.cell();
        self.cells.insert(request.slot(), CellAssignment {
            subject_id: request.subject_id,
            teacher_id: request.teacher_id,
        });
        log::debug!(
            "committed cell ({}, period {}, section {}) subject {} teacher {}",
            cell.day,
            cell.period_id,
            cell.section_id,
            cell.subject_id,
            cell.teacher_id
        );
        Ok(cell)
    }

    /// Clear one cell, releasing its quota and workload reservations.
    ///
    /// Removing an empty cell is a no-op returning `Ok(None)`. Release
    /// failures indicate a broken invariant and are propagated as fatal.
    pub fn remove(
        &mut self,
        day: Day,
        period_id: PeriodId,
        section_id: SectionId,
    ) -> ScheduleResult<Option<TimetableCell>> {
        let slot = SlotKey {
            day,
            period_id,
            section_id,
        };
        let Some(assignment) = self.cells.get(&slot).copied() else {
            return Ok(None);
        };

        if let Err(e) = self.ledger.release(assignment.subject_id, section_id) {
            log::error!("quota release failed while clearing a committed cell: {}", e);
            return Err(e);
        }
        if let Err(e) = self.tracker.release(assignment.teacher_id) {
            log::error!("workload release failed while clearing a committed cell: {}", e);
            return Err(e);
        }
        self.cells.remove(&slot);

        Ok(Some(TimetableCell {
            day,
            period_id,
            section_id,
            subject_id: assignment.subject_id,
            teacher_id: assignment.teacher_id,
        }))
    }

    /// Remove-then-assign with at-most-once semantics: when the assign step
    /// fails the prior cell is not restored, netting an empty slot. Callers
    /// retry the original assignment explicitly if they want it back.
    pub fn replace(
        &mut self,
        request: AssignmentRequest,
    ) -> ScheduleResult<TimetableCell> {
        self.remove(request.day, request.period_id, request.section_id)?;
        self.assign(request, None)
    }

    /// Payload of one slot, if occupied.
    pub fn cell(&self, slot: &SlotKey) -> Option<&CellAssignment> {
        self.cells.get(slot)
    }

    /// All committed cells in canonical slot order.
    pub fn cells(&self) -> Vec<TimetableCell> {
        self.cells
            .iter()
            .map(|(slot, assignment)| TimetableCell {
                day: slot.day,
                period_id: slot.period_id,
                section_id: slot.section_id,
                subject_id: assignment.subject_id,
                teacher_id: assignment.teacher_id,
            })
            .collect()
    }

    /// Number of committed cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Quota board for one section.
    pub fn quotas_for_section(&self, section_id: SectionId) -> ScheduleResult<Vec<QuotaStatus>> {
        self.catalog
            .section(section_id)
            .ok_or(ScheduleError::NotFound {
                entity: "section",
                id: section_id.value(),
            })?;
        Ok(self.ledger.section_statuses(section_id))
    }

    /// Open (empty) teaching slots for a section, day-major order.
    pub fn open_slots(&self, section_id: SectionId) -> Vec<SlotKey> {
        let mut open = Vec::new();
        for day in Day::ALL {
            for period in self.grid.teaching_periods() {
                let slot = SlotKey {
                    day,
                    period_id: period.id,
                    section_id,
                };
                if !self.cells.contains_key(&slot) {
                    open.push(slot);
                }
            }
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{QuotaSpec, Section, Subject, Teacher};
    use crate::models::grid::{Period, PeriodKind};
    use chrono::NaiveTime;
    use std::collections::BTreeSet;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn grid() -> Arc<PeriodGrid> {
        Arc::new(
            PeriodGrid::new(vec![
                Period {
                    id: PeriodId(1),
                    ordinal: 1,
                    start: t(8, 0),
                    end: t(8, 45),
                    kind: PeriodKind::Teaching,
                },
                Period {
                    id: PeriodId(2),
                    ordinal: 2,
                    start: t(8, 45),
                    end: t(9, 30),
                    kind: PeriodKind::Teaching,
                },
                Period {
                    id: PeriodId(3),
                    ordinal: 3,
                    start: t(9, 30),
                    end: t(9, 50),
                    kind: PeriodKind::Break,
                },
            ])
            .unwrap(),
        )
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog {
            sections: vec![
                Section {
                    id: SectionId(1),
                    grade: 10,
                    name: "A".to_string(),
                },
                Section {
                    id: SectionId(2),
                    grade: 10,
                    name: "B".to_string(),
                },
            ],
            subjects: vec![Subject {
                id: SubjectId(1),
                name: "Mathematics".to_string(),
            }],
            teachers: vec![Teacher {
                id: TeacherId(1),
                name: "T. Amari".to_string(),
                max_weekly_workload: 2,
                eligible_subjects: BTreeSet::from([SubjectId(1)]),
            }],
            quotas: vec![
                QuotaSpec {
                    subject_id: SubjectId(1),
                    section_id: SectionId(1),
                    weekly_quota: 3,
                },
                QuotaSpec {
                    subject_id: SubjectId(1),
                    section_id: SectionId(2),
                    weekly_quota: 3,
                },
            ],
        })
    }

    fn request(day: Day, period: i64, section: i64) -> AssignmentRequest {
        AssignmentRequest {
            day,
            period_id: PeriodId(period),
            section_id: SectionId(section),
            subject_id: SubjectId(1),
            teacher_id: TeacherId(1),
        }
    }

    fn state() -> YearState {
        YearState::new("2024/25".parse().unwrap(), grid(), catalog())
    }

    #[test]
    fn test_assign_updates_aggregates() {
        let mut state = state();
        let cell = state.assign(request(Day::Monday, 1, 1), None).unwrap();
        assert_eq!(cell.subject_id, SubjectId(1));
        assert_eq!(state.ledger().remaining(SubjectId(1), SectionId(1)), Some(2));
        assert_eq!(state.tracker().load(TeacherId(1)), Some(1));
        assert_eq!(state.cell_count(), 1);
    }

    #[test]
    fn test_occupied_slot_rejected() {
        let mut state = state();
        state.assign(request(Day::Monday, 1, 1), None).unwrap();
        let err = state.assign(request(Day::Monday, 1, 1), None).unwrap_err();
        assert!(matches!(err, ScheduleError::SlotOccupied { .. }));
        // Nothing double-counted.
        assert_eq!(state.ledger().remaining(SubjectId(1), SectionId(1)), Some(2));
    }

    #[test]
    fn test_teacher_conflict_across_sections() {
        let mut state = state();
        state.assign(request(Day::Tuesday, 2, 1), None).unwrap();
        let err = state.assign(request(Day::Tuesday, 2, 2), None).unwrap_err();
        assert!(matches!(err, ScheduleError::TeacherConflict { .. }));
    }

    #[test]
    fn test_break_slot_rejected() {
        let mut state = state();
        let err = state.assign(request(Day::Monday, 3, 1), None).unwrap_err();
        assert!(matches!(err, ScheduleError::BreakSlotInvalid { .. }));
    }

    #[test]
    fn test_remove_roundtrip_restores_aggregates() {
        let mut state = state();
        state.assign(request(Day::Monday, 1, 1), None).unwrap();
        let removed = state.remove(Day::Monday, PeriodId(1), SectionId(1)).unwrap();
        assert!(removed.is_some());
        assert_eq!(state.ledger().remaining(SubjectId(1), SectionId(1)), Some(3));
        assert_eq!(state.tracker().load(TeacherId(1)), Some(0));
        assert_eq!(state.cell_count(), 0);
    }

    #[test]
    fn test_remove_empty_slot_is_noop() {
        let mut state = state();
        let removed = state.remove(Day::Friday, PeriodId(1), SectionId(1)).unwrap();
        assert!(removed.is_none());
    }

    #[test]
    fn test_replace_swaps_occupied_cell() {
        let mut state = state();
        state.assign(request(Day::Monday, 1, 1), None).unwrap();

        let replacement = request(Day::Monday, 1, 1);
        let cell = state.replace(replacement).unwrap();
        assert_eq!(cell.teacher_id, TeacherId(1));
        assert_eq!(state.cell_count(), 1);
        // Quota net effect of a same-subject swap is zero.
        assert_eq!(state.ledger().remaining(SubjectId(1), SectionId(1)), Some(2));
    }

    #[test]
    fn test_replace_at_most_once_can_net_empty() {
        let mut state = state();
        state.assign(request(Day::Monday, 1, 1), None).unwrap();

        let mut bad = request(Day::Monday, 1, 1);
        bad.teacher_id = TeacherId(99);
        let err = state.replace(bad).unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound { .. }));
        // At-most-once: the remove stuck, the assign did not, slot is empty.
        assert!(state.cell(&bad.slot()).is_none());
        assert_eq!(state.ledger().remaining(SubjectId(1), SectionId(1)), Some(3));
        assert_eq!(state.tracker().load(TeacherId(1)), Some(0));
    }

    #[test]
    fn test_from_cells_replays_snapshot() {
        let mut original = state();
        original.assign(request(Day::Monday, 1, 1), None).unwrap();
        original.assign(request(Day::Tuesday, 1, 2), None).unwrap();

        let rebuilt = YearState::from_cells(
            original.year().clone(),
            grid(),
            catalog(),
            original.cells(),
        )
        .unwrap();
        assert_eq!(rebuilt.cells(), original.cells());
        assert_eq!(
            rebuilt.ledger().remaining(SubjectId(1), SectionId(1)),
            Some(2)
        );
        assert_eq!(rebuilt.tracker().load(TeacherId(1)), Some(2));
    }

    #[test]
    fn test_from_cells_rejects_invalid_snapshot() {
        // Two cells with the same teacher at the same day/period.
        let cells = vec![
            TimetableCell {
                day: Day::Monday,
                period_id: PeriodId(1),
                section_id: SectionId(1),
                subject_id: SubjectId(1),
                teacher_id: TeacherId(1),
            },
            TimetableCell {
                day: Day::Monday,
                period_id: PeriodId(1),
                section_id: SectionId(2),
                subject_id: SubjectId(1),
                teacher_id: TeacherId(1),
            },
        ];
        let err = YearState::from_cells("2024/25".parse().unwrap(), grid(), catalog(), cells)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::PersistenceFailure(_)));
    }

    #[test]
    fn test_open_slots_day_major() {
        let mut state = state();
        let open = state.open_slots(SectionId(1));
        // 2 teaching periods x 5 days, break excluded.
        assert_eq!(open.len(), 10);
        assert_eq!(open[0].day, Day::Monday);
        assert_eq!(open[0].period_id, PeriodId(1));
        assert_eq!(open[1].period_id, PeriodId(2));

        state.assign(request(Day::Monday, 1, 1), None).unwrap();
        let open = state.open_slots(SectionId(1));
        assert_eq!(open.len(), 9);
        assert_eq!(open[0].period_id, PeriodId(2));
    }
}
