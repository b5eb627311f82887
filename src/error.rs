//! Engine error types.
//!
//! One variant per failure kind. Validation errors are expected and
//! recoverable: they are returned synchronously with no partial mutation, and
//! callers decide whether to retry with different parameters. Defensive errors
//! indicate an internal invariant violation and must not be retried.

use crate::api::{Day, PeriodId, SectionId, SubjectId, TeacherId};
use crate::db::repository::RepositoryError;

/// Result type for engine operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Period grid construction failed (ordering, overlap, or kind rules).
    #[error("invalid period grid: {reason}")]
    InvalidGridConfig { reason: String },

    /// Catalog snapshot is internally inconsistent (duplicate ids, dangling
    /// references).
    #[error("invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    /// The target period is a break slot and cannot carry a lesson.
    #[error("period {period_id} is a break slot")]
    BreakSlotInvalid { period_id: PeriodId },

    /// The target cell already holds a committed assignment.
    #[error("slot ({day}, period {period_id}) in section {section_id} is already occupied")]
    SlotOccupied {
        day: Day,
        period_id: PeriodId,
        section_id: SectionId,
    },

    /// The teacher already holds a committed cell at the same day/period in
    /// another section.
    #[error("teacher {teacher_id} is already booked at ({day}, period {period_id})")]
    TeacherConflict {
        teacher_id: TeacherId,
        day: Day,
        period_id: PeriodId,
    },

    /// The weekly quota for this (subject, section) pair is used up.
    #[error("weekly quota for subject {subject_id} in section {section_id} is exhausted")]
    QuotaExhausted {
        subject_id: SubjectId,
        section_id: SectionId,
    },

    /// The teacher reached the weekly workload cap.
    #[error("teacher {teacher_id} reached the weekly workload cap of {cap}")]
    WorkloadExceeded { teacher_id: TeacherId, cap: u32 },

    /// The teacher is not assigned to teach this subject.
    #[error("teacher {teacher_id} is not eligible for subject {subject_id}")]
    TeacherNotEligible {
        teacher_id: TeacherId,
        subject_id: SubjectId,
    },

    /// Defensive: a release was attempted on a quota already at its initial
    /// value. Indicates a bookkeeping bug upstream.
    #[error("quota for subject {subject_id} in section {section_id} is already at capacity")]
    QuotaAtCapacity {
        subject_id: SubjectId,
        section_id: SectionId,
    },

    /// Defensive: a release was attempted on a teacher with zero load.
    #[error("workload underflow for teacher {teacher_id}")]
    WorkloadUnderflow { teacher_id: TeacherId },

    /// Unknown section/subject/teacher/period reference.
    #[error("unknown {entity} id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Propagated from the persistence collaborator, never recovered locally.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] RepositoryError),
}

impl ScheduleError {
    /// Expected, recoverable validation failure: no state changed, callers
    /// may retry with different parameters.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BreakSlotInvalid { .. }
                | Self::SlotOccupied { .. }
                | Self::TeacherConflict { .. }
                | Self::QuotaExhausted { .. }
                | Self::WorkloadExceeded { .. }
                | Self::TeacherNotEligible { .. }
        )
    }

    /// Internal invariant violation: log and abort, never retry.
    pub fn is_defensive(&self) -> bool {
        matches!(
            self,
            Self::QuotaAtCapacity { .. } | Self::WorkloadUnderflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err = ScheduleError::QuotaExhausted {
            subject_id: SubjectId(1),
            section_id: SectionId(2),
        };
        assert!(err.is_validation());
        assert!(!err.is_defensive());
    }

    #[test]
    fn test_defensive_classification() {
        let err = ScheduleError::WorkloadUnderflow {
            teacher_id: TeacherId(7),
        };
        assert!(err.is_defensive());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_not_found_is_neither() {
        let err = ScheduleError::NotFound {
            entity: "teacher",
            id: 3,
        };
        assert!(!err.is_validation());
        assert!(!err.is_defensive());
    }

    #[test]
    fn test_display_names_the_slot() {
        let err = ScheduleError::SlotOccupied {
            day: Day::Monday,
            period_id: PeriodId(1),
            section_id: SectionId(4),
        };
        let msg = err.to_string();
        assert!(msg.contains("Monday"));
        assert!(msg.contains("section 4"));
    }
}
