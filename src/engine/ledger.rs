//! Quota ledger.
//!
//! Single source of truth for the remaining weekly allocation per
//! (subject, section) pair. The ledger is mutated strictly in lockstep with
//! cell commits and removals; `remaining + committed cell count == initial`
//! holds for every pair after every committed mutation.

use crate::api::{QuotaStatus, SectionId, SubjectId};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::catalog::Catalog;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuotaEntry {
    initial: u32,
    remaining: u32,
}

/// Remaining weekly capacity per (subject, section) pair.
#[derive(Debug, Clone, Default)]
pub struct QuotaLedger {
    entries: BTreeMap<(SubjectId, SectionId), QuotaEntry>,
}

impl QuotaLedger {
    /// Build the ledger from the catalog's quota table, all capacity free.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let entries = catalog
            .quotas
            .iter()
            .map(|q| {
                (
                    (q.subject_id, q.section_id),
                    QuotaEntry {
                        initial: q.weekly_quota,
                        remaining: q.weekly_quota,
                    },
                )
            })
            .collect();
        QuotaLedger { entries }
    }

    /// Take one quota unit for the pair.
    ///
    /// Fails with `QuotaExhausted` (no mutation) when nothing remains, and
    /// with `NotFound` when the pair has no configured quota.
    pub fn reserve(&mut self, subject_id: SubjectId, section_id: SectionId) -> ScheduleResult<()> {
        let entry = self
            .entries
            .get_mut(&(subject_id, section_id))
            .ok_or(ScheduleError::NotFound {
                entity: "subject quota",
                id: subject_id.value(),
            })?;
        if entry.remaining == 0 {
            return Err(ScheduleError::QuotaExhausted {
                subject_id,
                section_id,
            });
        }
        entry.remaining -= 1;
        Ok(())
    }

    /// Return one quota unit to the pair.
    ///
    /// Failing with `QuotaAtCapacity` is defensive: it means a release
    /// without a matching reserve, i.e. a bookkeeping bug upstream.
    pub fn release(&mut self, subject_id: SubjectId, section_id: SectionId) -> ScheduleResult<()> {
        let entry = self
            .entries
            .get_mut(&(subject_id, section_id))
            .ok_or(ScheduleError::NotFound {
                entity: "subject quota",
                id: subject_id.value(),
            })?;
        if entry.remaining >= entry.initial {
            return Err(ScheduleError::QuotaAtCapacity {
                subject_id,
                section_id,
            });
        }
        entry.remaining += 1;
        Ok(())
    }

    /// Remaining units for the pair, if configured.
    pub fn remaining(&self, subject_id: SubjectId, section_id: SectionId) -> Option<u32> {
        self.entries
            .get(&(subject_id, section_id))
            .map(|e| e.remaining)
    }

    /// Initial units for the pair, if configured.
    pub fn initial(&self, subject_id: SubjectId, section_id: SectionId) -> Option<u32> {
        self.entries
            .get(&(subject_id, section_id))
            .map(|e| e.initial)
    }

    /// Quota board for one section, ascending subject id.
    pub fn section_statuses(&self, section_id: SectionId) -> Vec<QuotaStatus> {
        self.entries
            .iter()
            .filter(|((_, sec), _)| *sec == section_id)
            .map(|((subject_id, section_id), entry)| QuotaStatus {
                subject_id: *subject_id,
                section_id: *section_id,
                remaining: entry.remaining,
                initial: entry.initial,
            })
            .collect()
    }

    /// All pairs with remaining capacity, in (subject, section) order.
    pub fn open_pairs(&self) -> Vec<(SubjectId, SectionId, u32)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.remaining > 0)
            .map(|((subject, section), e)| (*subject, *section, e.remaining))
            .collect()
    }
}
