//! Generation run tracking.
//!
//! This module provides a simple in-memory tracker that stores progress logs
//! and status for generator runs, plus the cancellation handle a host can use
//! to stop a long run cooperatively.

use crate::api::AcademicYear;
use crate::engine::generator::CancelToken;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Run status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Run metadata and logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GenerationRun {
    pub run_id: String,
    pub year: AcademicYear,
    pub status: RunStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Result summary (placed/unmet counts) once the run finishes.
    pub result: Option<serde_json::Value>,
}

struct RunEntry {
    run: GenerationRun,
    cancel: CancelToken,
}

/// In-memory generation run tracker.
#[derive(Clone, Default)]
pub struct RunTracker {
    runs: Arc<RwLock<HashMap<String, RunEntry>>>,
}

impl RunTracker {
    /// Create a new run tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run and return its ID plus the cancellation handle.
    pub fn create_run(&self, year: AcademicYear) -> (String, CancelToken) {
        let cancel = CancelToken::new();
        let run_id = self.create_run_with_token(year, cancel.clone());
        (run_id, cancel)
    }

    /// Register a new run driven by a caller-owned cancellation token, e.g.
    /// one wired to a host wall-clock budget.
    pub fn create_run_with_token(&self, year: AcademicYear, cancel: CancelToken) -> String {
        let run_id = Uuid::new_v4().to_string();
        let run = GenerationRun {
            run_id: run_id.clone(),
            year,
            status: RunStatus::Running,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
            result: None,
        };
        self.runs
            .write()
            .insert(run_id.clone(), RunEntry { run, cancel });
        run_id
    }

    /// Add a log entry to a run.
    pub fn log(&self, run_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut runs = self.runs.write();
        if let Some(entry) = runs.get_mut(run_id) {
            entry.run.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Signal cancellation for a running run.
    ///
    /// # Returns
    /// `true` if the run exists and was still running.
    pub fn cancel_run(&self, run_id: &str) -> bool {
        let runs = self.runs.read();
        match runs.get(run_id) {
            Some(entry) if entry.run.status == RunStatus::Running => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Mark a run as finished with an optional result summary.
    ///
    /// The final status is Cancelled when the run's token was signalled,
    /// Completed otherwise.
    pub fn complete_run(&self, run_id: &str, result: Option<serde_json::Value>) {
        let mut runs = self.runs.write();
        if let Some(entry) = runs.get_mut(run_id) {
            entry.run.status = if entry.cancel.is_cancelled() {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            };
            entry.run.completed_at = Some(chrono::Utc::now());
            entry.run.result = result;
        }
    }

    /// Mark a run as failed.
    pub fn fail_run(&self, run_id: &str, error_message: impl Into<String>) {
        let mut runs = self.runs.write();
        if let Some(entry) = runs.get_mut(run_id) {
            entry.run.status = RunStatus::Failed;
            entry.run.completed_at = Some(chrono::Utc::now());
            entry.run.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    /// Get a run by ID.
    pub fn get_run(&self, run_id: &str) -> Option<GenerationRun> {
        self.runs.read().get(run_id).map(|e| e.run.clone())
    }

    /// Get all logs for a run.
    pub fn get_logs(&self, run_id: &str) -> Vec<LogEntry> {
        self.runs
            .read()
            .get(run_id)
            .map(|e| e.run.logs.clone())
            .unwrap_or_default()
    }

    /// All known runs, most recent first.
    pub fn list_runs(&self) -> Vec<GenerationRun> {
        let mut runs: Vec<GenerationRun> =
            self.runs.read().values().map(|e| e.run.clone()).collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year() -> AcademicYear {
        "2024/25".parse().unwrap()
    }

    #[test]
    fn test_run_lifecycle() {
        let tracker = RunTracker::new();
        let (run_id, _cancel) = tracker.create_run(year());

        tracker.log(&run_id, LogLevel::Info, "started");
        tracker.complete_run(&run_id, Some(serde_json::json!({"placed": 3})));

        let run = tracker.get_run(&run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.logs.len(), 1);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_cancel_marks_run_cancelled() {
        let tracker = RunTracker::new();
        let (run_id, cancel) = tracker.create_run(year());

        assert!(tracker.cancel_run(&run_id));
        assert!(cancel.is_cancelled());

        tracker.complete_run(&run_id, None);
        let run = tracker.get_run(&run_id).unwrap();
        assert_eq!(run.status, RunStatus::Cancelled);

        // A finished run cannot be cancelled again.
        assert!(!tracker.cancel_run(&run_id));
    }

    #[test]
    fn test_failed_run_records_error() {
        let tracker = RunTracker::new();
        let (run_id, _cancel) = tracker.create_run(year());
        tracker.fail_run(&run_id, "snapshot save failed");

        let run = tracker.get_run(&run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.logs.len(), 1);
    }

    #[test]
    fn test_unknown_run() {
        let tracker = RunTracker::new();
        assert!(tracker.get_run("nope").is_none());
        assert!(tracker.get_logs("nope").is_empty());
        assert!(!tracker.cancel_run("nope"));
    }
}
