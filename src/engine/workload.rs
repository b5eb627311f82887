//! Teacher workload tracker.
//!
//! Tracks total assigned periods per teacher per week against the weekly
//! cap. Mutated strictly in lockstep with cell commits and removals, like
//! the quota ledger.

use crate::api::TeacherId;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::catalog::Catalog;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct LoadEntry {
    cap: u32,
    assigned: u32,
}

/// Assigned-period counts per teacher for one academic year.
#[derive(Debug, Clone, Default)]
pub struct WorkloadTracker {
    loads: BTreeMap<TeacherId, LoadEntry>,
}

impl WorkloadTracker {
    /// Build the tracker from the teacher pool, all loads zero.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let loads = catalog
            .teachers
            .iter()
            .map(|t| {
                (
                    t.id,
                    LoadEntry {
                        cap: t.max_weekly_workload,
                        assigned: 0,
                    },
                )
            })
            .collect();
        WorkloadTracker { loads }
    }

    /// Count one more period for the teacher.
    ///
    /// `cap_override`, when set, replaces the teacher's own cap (used by
    /// generator runs with a run-wide workload limit).
    pub fn reserve(
        &mut self,
        teacher_id: TeacherId,
        cap_override: Option<u32>,
    ) -> ScheduleResult<()> {
        let entry = self.loads.get_mut(&teacher_id).ok_or(ScheduleError::NotFound {
            entity: "teacher",
            id: teacher_id.value(),
        })?;
        let cap = cap_override.unwrap_or(entry.cap);
        if entry.assigned >= cap {
            return Err(ScheduleError::WorkloadExceeded { teacher_id, cap });
        }
        entry.assigned += 1;
        Ok(())
    }

    /// Uncount one period for the teacher.
    ///
    /// `WorkloadUnderflow` is defensive: a release without a matching
    /// reserve.
    pub fn release(&mut self, teacher_id: TeacherId) -> ScheduleResult<()> {
        let entry = self.loads.get_mut(&teacher_id).ok_or(ScheduleError::NotFound {
            entity: "teacher",
            id: teacher_id.value(),
        })?;
        if entry.assigned == 0 {
            return Err(ScheduleError::WorkloadUnderflow { teacher_id });
        }
        entry.assigned -= 1;
        Ok(())
    }

    /// Current assigned count for the teacher, if known.
    pub fn load(&self, teacher_id: TeacherId) -> Option<u32> {
        self.loads.get(&teacher_id).map(|e| e.assigned)
    }

    /// The cap that applies to the teacher under an optional override.
    pub fn effective_cap(&self, teacher_id: TeacherId, cap_override: Option<u32>) -> Option<u32> {
        self.loads
            .get(&teacher_id)
            .map(|e| cap_override.unwrap_or(e.cap))
    }

    /// All (teacher, assigned count) pairs in ascending teacher id order.
    pub fn loads(&self) -> Vec<(TeacherId, u32)> {
        self.loads.iter().map(|(id, e)| (*id, e.assigned)).collect()
    }
}
