//! In-memory local repository implementation.
//!
//! This module provides a local implementation of the repository trait
//! suitable for unit testing and local development. All data is stored in
//! memory using a HashMap, providing fast, deterministic, isolated execution.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::api::{AcademicYear, TimetableCell};
use crate::db::repository::{RepositoryError, RepositoryResult, TimetableRepository};

/// In-memory local repository.
///
/// Ideal for unit tests that need isolation and speed. A health flag lets
/// tests exercise storage-failure paths.
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    timetables: HashMap<AcademicYear, Vec<TimetableCell>>,
    is_healthy: bool,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                timetables: HashMap::new(),
                is_healthy: true,
            })),
        }
    }

    /// Set the health status for testing storage failures.
    pub fn set_healthy(&self, healthy: bool) {
        let mut data = self.data.write().unwrap();
        data.is_healthy = healthy;
    }

    /// Clear all stored snapshots.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        data.timetables.clear();
    }

    /// Number of academic years with a stored snapshot.
    pub fn year_count(&self) -> usize {
        self.data.read().unwrap().timetables.len()
    }

    /// Check if a snapshot exists for the given year.
    pub fn has_year(&self, year: &AcademicYear) -> bool {
        self.data.read().unwrap().timetables.contains_key(year)
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        let data = self.data.read().unwrap();
        if !data.is_healthy {
            return Err(RepositoryError::storage("Storage is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().unwrap().is_healthy)
    }

    async fn load_timetable(
        &self,
        year: &AcademicYear,
    ) -> RepositoryResult<Option<Vec<TimetableCell>>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data.timetables.get(year).cloned())
    }

    async fn save_timetable(
        &self,
        year: &AcademicYear,
        cells: &[TimetableCell],
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        data.timetables.insert(year.clone(), cells.to_vec());
        Ok(())
    }

    async fn list_years(&self) -> RepositoryResult<Vec<AcademicYear>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut years: Vec<AcademicYear> = data.timetables.keys().cloned().collect();
        years.sort();
        Ok(years)
    }
}
