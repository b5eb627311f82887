//! JSON-file repository implementation.
//!
//! Stores one checksummed snapshot file per academic year under a data
//! directory, e.g. `timetable_2024-25.json`. Writes go through a temp file
//! followed by a rename so readers never observe a half-written snapshot.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::api::{AcademicYear, TimetableCell};
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, TimetableRepository,
};
use crate::models::timetable::{parse_snapshot_json_str, TimetableSnapshot};

const SNAPSHOT_PREFIX: &str = "timetable_";
const SNAPSHOT_SUFFIX: &str = ".json";

/// File-backed repository keeping one snapshot file per academic year.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    data_dir: PathBuf,
}

impl JsonRepository {
    /// Open (and create if necessary) a repository rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            RepositoryError::storage_with_context(
                format!("Failed to create data directory: {}", e),
                ErrorContext::new("open").with_details(data_dir.display().to_string()),
            )
        })?;
        Ok(Self { data_dir })
    }

    /// Directory holding the snapshot files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot_path(&self, year: &AcademicYear) -> PathBuf {
        // "2024/25" is not a valid file name; the slash becomes a dash.
        let file_label = year.label().replace('/', "-");
        self.data_dir
            .join(format!("{}{}{}", SNAPSHOT_PREFIX, file_label, SNAPSHOT_SUFFIX))
    }

    fn year_from_file_name(name: &str) -> Option<AcademicYear> {
        let label = name
            .strip_prefix(SNAPSHOT_PREFIX)?
            .strip_suffix(SNAPSHOT_SUFFIX)?
            .replace('-', "/");
        label.parse().ok()
    }
}

#[async_trait]
impl TimetableRepository for JsonRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(tokio::fs::metadata(&self.data_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn load_timetable(
        &self,
        year: &AcademicYear,
    ) -> RepositoryResult<Option<Vec<TimetableCell>>> {
        let path = self.snapshot_path(year);

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepositoryError::storage_with_context(
                    format!("Failed to read snapshot: {}", e),
                    ErrorContext::new("load_timetable").with_entity_id(year),
                ))
            }
        };

        let snapshot = parse_snapshot_json_str(&json).map_err(|e| {
            RepositoryError::validation_with_context(
                e.to_string(),
                ErrorContext::new("load_timetable")
                    .with_entity("snapshot")
                    .with_entity_id(year),
            )
        })?;

        if &snapshot.year != year {
            return Err(RepositoryError::validation_with_context(
                format!(
                    "Snapshot file for {} contains data for {}",
                    year, snapshot.year
                ),
                ErrorContext::new("load_timetable").with_entity_id(year),
            ));
        }

        Ok(Some(snapshot.cells))
    }

    async fn save_timetable(
        &self,
        year: &AcademicYear,
        cells: &[TimetableCell],
    ) -> RepositoryResult<()> {
        let snapshot = TimetableSnapshot::new(year.clone(), cells.to_vec());
        let json = snapshot
            .to_json()
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        let path = self.snapshot_path(year);
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| {
                RepositoryError::storage_with_context(
                    format!("Failed to write snapshot: {}", e),
                    ErrorContext::new("save_timetable").with_entity_id(year),
                )
            })?;

        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            RepositoryError::storage_with_context(
                format!("Failed to commit snapshot: {}", e),
                ErrorContext::new("save_timetable").with_entity_id(year),
            )
        })?;

        log::debug!("saved timetable snapshot for {} ({} cells)", year, cells.len());
        Ok(())
    }

    async fn list_years(&self) -> RepositoryResult<Vec<AcademicYear>> {
        let mut entries = tokio::fs::read_dir(&self.data_dir).await.map_err(|e| {
            RepositoryError::storage_with_context(
                format!("Failed to read data directory: {}", e),
                ErrorContext::new("list_years"),
            )
        })?;

        let mut years = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(RepositoryError::from)? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(year) = Self::year_from_file_name(name) {
                    years.push(year);
                }
            }
        }
        years.sort();
        Ok(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path_escapes_slash() {
        let repo = JsonRepository {
            data_dir: PathBuf::from("/tmp/tt"),
        };
        let year: AcademicYear = "2024/25".parse().unwrap();
        assert_eq!(
            repo.snapshot_path(&year),
            PathBuf::from("/tmp/tt/timetable_2024-25.json")
        );
    }

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(
            JsonRepository::year_from_file_name("timetable_2024-25.json"),
            Some("2024/25".parse().unwrap())
        );
        assert_eq!(JsonRepository::year_from_file_name("notes.txt"), None);
        assert_eq!(
            JsonRepository::year_from_file_name("timetable_garbage.json"),
            None
        );
    }
}
