//! Service layer for business logic and orchestration.
//!
//! This module contains the service layer that sits between the engine core
//! and the host application. Services hold the per-year transaction
//! boundaries, orchestrate repository calls, and track generation runs.

pub mod run_tracker;

pub mod timetable;

pub use run_tracker::{GenerationRun, LogEntry, LogLevel, RunStatus, RunTracker};
pub use timetable::TimetableService;
