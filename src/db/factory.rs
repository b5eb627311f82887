//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository
//! instances based on runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::{JsonRepository, LocalRepository};
use super::repository::{RepositoryResult, TimetableRepository};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory repository
    Local,
    /// JSON snapshot files on disk
    Json,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("local", "json")
    ///
    /// # Returns
    /// * `Ok(RepositoryType)` if valid
    /// * `Err` if invalid
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "json" | "file" => Ok(Self::Json),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Local when unset or unparsable.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }
        Self::Local
    }
}

/// Factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory repository.
    pub fn create_local() -> Arc<dyn TimetableRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a JSON-file repository rooted at the given directory.
    pub fn create_json(data_dir: &str) -> RepositoryResult<Arc<dyn TimetableRepository>> {
        Ok(Arc::new(JsonRepository::new(data_dir)?))
    }

    /// Create a repository from a parsed configuration file.
    pub fn from_config(config: &RepositoryConfig) -> RepositoryResult<Arc<dyn TimetableRepository>> {
        use super::repository::RepositoryError;

        let repo_type = config
            .repository_type()
            .map_err(RepositoryError::configuration)?;

        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Json => Self::create_json(config.json_data_dir()),
        }
    }
}
