//! Timetable service facade.
//!
//! `TimetableService` is the single entry point callers use: it owns the
//! per-year transaction boundaries, routes every mutation through the engine
//! primitives, and keeps the repository snapshot in step with memory. One
//! mutex per academic year serializes all writers for that year, so a
//! validator check can never race the commit it guards.

use crate::api::{
    AcademicYear, Day, GenerationReport, GeneratorOptions, PeriodId, QuotaStatus, SectionId,
    SubjectId, TeacherId, TimetableCell,
};
use crate::db::repository::TimetableRepository;
use crate::engine::generator::{self, CancelToken};
use crate::engine::state::{AssignmentRequest, YearState};
use crate::error::ScheduleResult;
use crate::models::catalog::Catalog;
use crate::models::grid::PeriodGrid;
use crate::services::run_tracker::{LogLevel, RunTracker};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// High-level scheduling service for one catalog and period grid.
pub struct TimetableService {
    repo: Arc<dyn TimetableRepository>,
    catalog: Arc<Catalog>,
    grid: Arc<PeriodGrid>,
    years: Mutex<HashMap<AcademicYear, Arc<Mutex<YearState>>>>,
    runs: RunTracker,
}

impl TimetableService {
    /// Create a service over a validated catalog and grid.
    ///
    /// # Arguments
    /// * `repo` - Timetable storage collaborator
    /// * `catalog` - Read-only sections/subjects/teachers/quotas input
    /// * `grid` - The weekly period grid (already validated on construction)
    pub fn new(
        repo: Arc<dyn TimetableRepository>,
        catalog: Catalog,
        grid: PeriodGrid,
    ) -> ScheduleResult<Self> {
        catalog.validate()?;
        Ok(Self {
            repo,
            catalog: Arc::new(catalog),
            grid: Arc::new(grid),
            years: Mutex::new(HashMap::new()),
            runs: RunTracker::new(),
        })
    }

    /// The canonical ordered period sequence.
    pub fn grid(&self) -> &PeriodGrid {
        &self.grid
    }

    /// Generation run tracker (status, logs, cancellation).
    pub fn runs(&self) -> &RunTracker {
        &self.runs
    }

    /// Signal cancellation for a running generation.
    pub fn cancel_run(&self, run_id: &str) -> bool {
        self.runs.cancel_run(run_id)
    }

    /// Get or lazily load the state for an academic year.
    ///
    /// The first access loads the persisted snapshot and rebuilds ledger and
    /// tracker from it; later accesses reuse the cached state. The outer map
    /// lock also serializes concurrent first-loads of the same year.
    async fn year_state(&self, year: &AcademicYear) -> ScheduleResult<Arc<Mutex<YearState>>> {
        let mut years = self.years.lock().await;
        if let Some(state) = years.get(year) {
            return Ok(state.clone());
        }

        let state = match self.repo.load_timetable(year).await? {
            Some(cells) => {
                log::info!(
                    "loaded timetable snapshot for {} ({} cells)",
                    year,
                    cells.len()
                );
                YearState::from_cells(
                    year.clone(),
                    self.grid.clone(),
                    self.catalog.clone(),
                    cells,
                )?
            }
            None => YearState::new(year.clone(), self.grid.clone(), self.catalog.clone()),
        };

        let state = Arc::new(Mutex::new(state));
        years.insert(year.clone(), state.clone());
        Ok(state)
    }

    async fn persist(&self, state: &YearState) -> ScheduleResult<()> {
        self.repo
            .save_timetable(state.year(), &state.cells())
            .await?;
        Ok(())
    }

    /// Validate and commit one cell.
    ///
    /// On success the cell is committed in memory and the snapshot is saved
    /// before the year boundary is released. On a validation failure nothing
    /// changes; on a persistence failure the in-memory commit is undone so
    /// memory never runs ahead of a snapshot the caller saw fail.
    pub async fn assign_cell(
        &self,
        year: &AcademicYear,
        day: Day,
        period_id: PeriodId,
        section_id: SectionId,
        subject_id: SubjectId,
        teacher_id: TeacherId,
    ) -> ScheduleResult<TimetableCell> {
        let state = self.year_state(year).await?;
        let mut guard = state.lock().await;

        let request = AssignmentRequest {
            day,
            period_id,
            section_id,
            subject_id,
            teacher_id,
        };
        let cell = guard.assign(request, None)?;

        if let Err(e) = self.persist(&guard).await {
            let _ = guard.remove(day, period_id, section_id);
            return Err(e);
        }
        Ok(cell)
    }

    /// Clear one cell. Removing an already-empty cell is a successful no-op.
    pub async fn remove_cell(
        &self,
        year: &AcademicYear,
        day: Day,
        period_id: PeriodId,
        section_id: SectionId,
    ) -> ScheduleResult<()> {
        let state = self.year_state(year).await?;
        let mut guard = state.lock().await;

        let Some(removed) = guard.remove(day, period_id, section_id)? else {
            return Ok(());
        };

        if let Err(e) = self.persist(&guard).await {
            let _ = guard.assign(removed.into(), None);
            return Err(e);
        }
        Ok(())
    }

    /// Replace the contents of one cell: remove, then assign.
    ///
    /// At-most-once semantics: when the assign step fails the prior cell is
    /// not restored and the slot nets empty. Callers retry the original
    /// assignment explicitly if they want it back.
    pub async fn replace_cell(
        &self,
        year: &AcademicYear,
        day: Day,
        period_id: PeriodId,
        section_id: SectionId,
        subject_id: SubjectId,
        teacher_id: TeacherId,
    ) -> ScheduleResult<TimetableCell> {
        let state = self.year_state(year).await?;
        let mut guard = state.lock().await;

        let request = AssignmentRequest {
            day,
            period_id,
            section_id,
            subject_id,
            teacher_id,
        };
        match guard.replace(request) {
            Ok(cell) => {
                self.persist(&guard).await?;
                Ok(cell)
            }
            Err(e) => {
                // The remove half may have stuck; persist the net state so
                // the snapshot reflects what the caller will observe.
                self.persist(&guard).await?;
                Err(e)
            }
        }
    }

    /// Run the automatic generator for a year.
    ///
    /// Holds the year boundary for the whole run, so manual edits queue
    /// behind it and at most one generation runs per year. To cancel from
    /// another task, find the running entry via [`Self::runs`] and call
    /// [`Self::cancel_run`], or use [`Self::generate_with_token`] and signal
    /// the token directly.
    pub async fn generate(
        &self,
        year: &AcademicYear,
        options: GeneratorOptions,
    ) -> ScheduleResult<GenerationReport> {
        self.generate_with_token(year, options, CancelToken::new())
            .await
    }

    /// Run the generator with a caller-owned cancellation token.
    ///
    /// Lets a host wire the run to its own wall-clock budget: signalling the
    /// token between work-queue iterations stops the run, keeps everything
    /// already committed, and reports the unprocessed remainder as shortfall.
    pub async fn generate_with_token(
        &self,
        year: &AcademicYear,
        options: GeneratorOptions,
        cancel: CancelToken,
    ) -> ScheduleResult<GenerationReport> {
        let state = self.year_state(year).await?;
        let run_id = self.runs.create_run_with_token(year.clone(), cancel.clone());
        self.runs
            .log(&run_id, LogLevel::Info, "Starting timetable generation...");

        let mut guard = state.lock().await;
        let outcome = generator::generate(&mut guard, &options, &cancel);

        self.runs.log(
            &run_id,
            LogLevel::Success,
            format!("Placed {} cell(s)", outcome.committed.len()),
        );
        if !outcome.shortfalls.is_empty() {
            self.runs.log(
                &run_id,
                LogLevel::Warning,
                format!(
                    "{} quota unit(s) could not be placed",
                    outcome
                        .shortfalls
                        .iter()
                        .map(|s| s.unmet_units)
                        .sum::<u32>()
                ),
            );
        }

        // Committed cells are kept even on a failed save; the next
        // successful save persists them.
        if let Err(e) = self.persist(&guard).await {
            self.runs
                .fail_run(&run_id, format!("Failed to save snapshot: {}", e));
            return Err(e);
        }

        let result = serde_json::json!({
            "placed": outcome.committed.len(),
            "unmet_units": outcome.shortfalls.iter().map(|s| s.unmet_units).sum::<u32>(),
            "cancelled": outcome.cancelled,
        });
        self.runs.complete_run(&run_id, Some(result));

        Ok(GenerationReport {
            run_id,
            year: year.clone(),
            committed: outcome.committed,
            shortfalls: outcome.shortfalls,
            cancelled: outcome.cancelled,
        })
    }

    /// Quota board for one section: (subject, remaining, initial).
    pub async fn quotas(
        &self,
        year: &AcademicYear,
        section_id: SectionId,
    ) -> ScheduleResult<Vec<QuotaStatus>> {
        let state = self.year_state(year).await?;
        let guard = state.lock().await;
        guard.quotas_for_section(section_id)
    }

    /// All committed cells for a year, canonical slot order.
    pub async fn timetable(&self, year: &AcademicYear) -> ScheduleResult<Vec<TimetableCell>> {
        let state = self.year_state(year).await?;
        let guard = state.lock().await;
        Ok(guard.cells())
    }

    /// Current assigned-period count per teacher.
    pub async fn teacher_loads(
        &self,
        year: &AcademicYear,
    ) -> ScheduleResult<Vec<(TeacherId, u32)>> {
        let state = self.year_state(year).await?;
        let guard = state.lock().await;
        Ok(guard.tracker().loads())
    }
}
