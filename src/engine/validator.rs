//! Conflict validator.
//!
//! Pure admissibility decision for a proposed assignment; no mutation
//! happens here. The caller holds the year transaction boundary, so the
//! state the checks observe cannot change between validation and the
//! subsequent reservation.

use crate::api::SlotKey;
use crate::engine::ledger::QuotaLedger;
use crate::engine::state::{AssignmentRequest, CellAssignment};
use crate::engine::workload::WorkloadTracker;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::catalog::Catalog;
use crate::models::grid::PeriodGrid;
use std::collections::BTreeMap;

/// Decide whether the proposed assignment is admissible.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. all referenced ids resolve (`NotFound`)
/// 2. the period is a TEACHING slot (`BreakSlotInvalid`)
/// 3. the target cell is empty (`SlotOccupied`)
/// 4. the teacher is free at that day/period (`TeacherConflict`)
/// 5. the teacher is eligible for the subject (`TeacherNotEligible`)
/// 6. the pair has remaining quota (`QuotaExhausted`)
/// 7. the teacher is under the workload cap (`WorkloadExceeded`)
pub fn can_assign(
    grid: &PeriodGrid,
    catalog: &Catalog,
    cells: &BTreeMap<SlotKey, CellAssignment>,
    ledger: &QuotaLedger,
    tracker: &WorkloadTracker,
    request: &AssignmentRequest,
    cap_override: Option<u32>,
) -> ScheduleResult<()> {
    let period = grid
        .period(request.period_id)
        .ok_or(ScheduleError::NotFound {
            entity: "period",
            id: request.period_id.value(),
        })?;
    catalog
        .section(request.section_id)
        .ok_or(ScheduleError::NotFound {
            entity: "section",
            id: request.section_id.value(),
        })?;
    catalog
        .subject(request.subject_id)
        .ok_or(ScheduleError::NotFound {
            entity: "subject",
            id: request.subject_id.value(),
        })?;
    let teacher = catalog
        .teacher(request.teacher_id)
        .ok_or(ScheduleError::NotFound {
            entity: "teacher",
            id: request.teacher_id.value(),
        })?;

    if !period.is_teaching() {
        return Err(ScheduleError::BreakSlotInvalid {
            period_id: request.period_id,
        });
    }

    if cells.contains_key(&request.slot()) {
        return Err(ScheduleError::SlotOccupied {
            day: request.day,
            period_id: request.period_id,
            section_id: request.section_id,
        });
    }

    let double_booked = cells.iter().any(|(slot, cell)| {
        slot.day == request.day
            && slot.period_id == request.period_id
            && cell.teacher_id == request.teacher_id
    });
    if double_booked {
        return Err(ScheduleError::TeacherConflict {
            teacher_id: request.teacher_id,
            day: request.day,
            period_id: request.period_id,
        });
    }

    if !teacher.eligible_subjects.contains(&request.subject_id) {
        return Err(ScheduleError::TeacherNotEligible {
            teacher_id: request.teacher_id,
            subject_id: request.subject_id,
        });
    }

    match ledger.remaining(request.subject_id, request.section_id) {
        None => {
            return Err(ScheduleError::NotFound {
                entity: "subject quota",
                id: request.subject_id.value(),
            })
        }
        Some(0) => {
            return Err(ScheduleError::QuotaExhausted {
                subject_id: request.subject_id,
                section_id: request.section_id,
            })
        }
        Some(_) => {}
    }

    let load = tracker.load(request.teacher_id).ok_or(ScheduleError::NotFound {
        entity: "teacher",
        id: request.teacher_id.value(),
    })?;
    let cap = tracker
        .effective_cap(request.teacher_id, cap_override)
        .unwrap_or(0);
    if load >= cap {
        return Err(ScheduleError::WorkloadExceeded {
            teacher_id: request.teacher_id,
            cap,
        });
    }

    Ok(())
}
