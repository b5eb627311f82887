//! Automatic timetable generator.
//!
//! Produces a full weekly schedule from the current year state: a work queue
//! of quota units ordered scarcest-first, a placement pass over the earliest
//! open slot per section, and one deferred retry pass that scans every open
//! slot before giving a unit up as shortfall. Every commit goes through the
//! same atomic assign primitive as the manual API, so generation can never
//! bypass ledger or tracker bookkeeping.

use crate::api::{GeneratorOptions, SectionId, Shortfall, SlotKey, SubjectId, TimetableCell};
use crate::engine::state::{AssignmentRequest, YearState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal, checked at the start of each work-queue
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a generation run.
///
/// Shortfalls enumerate quota units no admissible slot/teacher combination
/// could absorb; they are reported, not raised, so a partially satisfiable
/// catalog still yields the best grid the constraints allow.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub committed: Vec<TimetableCell>,
    pub shortfalls: Vec<Shortfall>,
    pub cancelled: bool,
}

/// One quota unit awaiting placement.
#[derive(Debug, Clone, Copy)]
struct WorkUnit {
    section_id: SectionId,
    subject_id: SubjectId,
    /// remaining quota / open teaching slots at queue build; smaller is
    /// scarcer and goes first.
    scarcity: f64,
}

/// Run the generator against the given year state.
///
/// Deterministic for fixed inputs: sections, subjects and teachers are
/// processed in ascending id order, slots day-major, and teacher ties break
/// on the lower id. `options.seed` permutes only equally-scarce queue
/// entries, so two runs with the same inputs and seed are identical.
pub fn generate(
    state: &mut YearState,
    options: &GeneratorOptions,
    cancel: &CancelToken,
) -> GenerationOutcome {
    let queue = build_queue(state, options.seed);
    log::info!(
        "generator for {}: {} quota units queued",
        state.year(),
        queue.len()
    );

    let mut committed = Vec::new();
    let mut deferred = Vec::new();
    let mut shortfall: BTreeMap<(SectionId, SubjectId), u32> = BTreeMap::new();
    let mut cancelled = false;

    // First pass: offer each unit the earliest open slot of its section.
    let mut pending = queue.into_iter();
    for unit in pending.by_ref() {
        if cancel.is_cancelled() {
            cancelled = true;
            *shortfall
                .entry((unit.section_id, unit.subject_id))
                .or_default() += 1;
            break;
        }
        match place_unit(state, &unit, options, false) {
            Some(cell) => committed.push(cell),
            None => deferred.push(unit),
        }
    }

    // Second pass: retry deferred units with relaxed slot ordering, scanning
    // every open slot of the section instead of just the earliest.
    let mut deferred_iter = deferred.into_iter();
    if !cancelled {
        for unit in deferred_iter.by_ref() {
            if cancel.is_cancelled() {
                cancelled = true;
                *shortfall
                    .entry((unit.section_id, unit.subject_id))
                    .or_default() += 1;
                break;
            }
            match place_unit(state, &unit, options, true) {
                Some(cell) => committed.push(cell),
                None => {
                    *shortfall
                        .entry((unit.section_id, unit.subject_id))
                        .or_default() += 1;
                }
            }
        }
    }

    // Whatever the cancellation interrupted is reported as shortfall;
    // committed cells stay committed.
    for unit in pending.chain(deferred_iter) {
        *shortfall
            .entry((unit.section_id, unit.subject_id))
            .or_default() += 1;
    }

    let shortfalls: Vec<Shortfall> = shortfall
        .into_iter()
        .map(|((section_id, subject_id), unmet_units)| Shortfall {
            section_id,
            subject_id,
            unmet_units,
        })
        .collect();

    log::info!(
        "generator for {}: placed {}, shortfall {} unit(s){}",
        state.year(),
        committed.len(),
        shortfalls.iter().map(|s| s.unmet_units).sum::<u32>(),
        if cancelled { ", cancelled" } else { "" }
    );

    GenerationOutcome {
        committed,
        shortfalls,
        cancelled,
    }
}

/// Expand every (section, subject) pair with remaining quota into one queue
/// entry per unit, scarcest pair first.
fn build_queue(state: &YearState, seed: Option<u64>) -> Vec<WorkUnit> {
    let mut open_per_section: BTreeMap<SectionId, usize> = BTreeMap::new();
    for section in &state.catalog().sections {
        open_per_section.insert(section.id, state.open_slots(section.id).len());
    }

    let mut units = Vec::new();
    for (subject_id, section_id, remaining) in state.ledger().open_pairs() {
        let open = open_per_section.get(&section_id).copied().unwrap_or(0);
        let scarcity = if open == 0 {
            f64::INFINITY
        } else {
            remaining as f64 / open as f64
        };
        for _ in 0..remaining {
            units.push(WorkUnit {
                section_id,
                subject_id,
                scarcity,
            });
        }
    }

    units.sort_by(|a, b| {
        a.scarcity
            .partial_cmp(&b.scarcity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.section_id.cmp(&b.section_id))
            .then(a.subject_id.cmp(&b.subject_id))
    });

    if let Some(seed) = seed {
        shuffle_ties(&mut units, seed);
    }

    units
}

/// Shuffle runs of equally-scarce units, leaving the scarcity order intact.
fn shuffle_ties(units: &mut [WorkUnit], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut start = 0;
    while start < units.len() {
        let mut end = start + 1;
        while end < units.len() && units[end].scarcity == units[start].scarcity {
            end += 1;
        }
        units[start..end].shuffle(&mut rng);
        start = end;
    }
}

/// Try to commit one quota unit.
///
/// `relaxed` widens the slot search from the earliest open slot to every
/// open slot of the section. Within a slot, eligible teachers are tried in
/// ascending (current load, id) order.
fn place_unit(
    state: &mut YearState,
    unit: &WorkUnit,
    options: &GeneratorOptions,
    relaxed: bool,
) -> Option<TimetableCell> {
    let open = state.open_slots(unit.section_id);
    let candidates: &[SlotKey] = if relaxed {
        &open
    } else {
        open.first().map(std::slice::from_ref).unwrap_or(&[])
    };

    for slot in candidates {
        let mut teachers: Vec<_> = state
            .catalog()
            .eligible_teachers(unit.subject_id)
            .iter()
            .map(|t| t.id)
            .collect();
        teachers.sort_by_key(|id| (state.tracker().load(*id).unwrap_or(0), *id));

        for teacher_id in teachers {
            let request = AssignmentRequest {
                day: slot.day,
                period_id: slot.period_id,
                section_id: unit.section_id,
                subject_id: unit.subject_id,
                teacher_id,
            };
            // Validator failures here are expected dead ends, not errors.
            if let Ok(cell) = state.assign(request, options.max_workload_override) {
                return Some(cell);
            }
        }
    }

    None
}
