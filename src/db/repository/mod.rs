//! Repository trait for timetable persistence.
//!
//! The engine treats durable storage as an external collaborator reachable
//! only through this interface: scoped load-then-mutate-then-save operations
//! on whole per-year snapshots. Every snapshot handed to `save_timetable` is
//! a valid, invariant-satisfying state, never an in-flight partial one, so a
//! crash between operations is recovered by simply reloading.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::api::{AcademicYear, TimetableCell};
use async_trait::async_trait;

/// Abstract interface to timetable storage.
///
/// Implementations must be safe to share across tasks; the engine serializes
/// writers per academic year above this layer, so implementations only need
/// snapshot-level atomicity.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    /// Check whether the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Load the committed cells for an academic year.
    ///
    /// # Returns
    /// * `Ok(Some(cells))` if a snapshot exists for the year
    /// * `Ok(None)` if the year has no snapshot yet
    /// * `Err` on storage or integrity failures
    async fn load_timetable(
        &self,
        year: &AcademicYear,
    ) -> RepositoryResult<Option<Vec<TimetableCell>>>;

    /// Persist the full committed-cell set for an academic year, replacing
    /// any previous snapshot.
    async fn save_timetable(
        &self,
        year: &AcademicYear,
        cells: &[TimetableCell],
    ) -> RepositoryResult<()>;

    /// Academic years with a stored snapshot, in ascending label order.
    async fn list_years(&self) -> RepositoryResult<Vec<AcademicYear>>;
}
