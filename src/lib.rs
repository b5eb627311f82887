//! # STS Rust Backend
//!
//! Weekly timetable scheduling engine for grade-sections.
//!
//! This crate assigns subjects and teachers to fixed weekly period slots for
//! every grade-section of a school, subject to three simultaneous constraints:
//! each subject may only occupy as many slots per section per week as its
//! configured quota allows, no teacher may be double-booked across sections at
//! the same day/period, and no teacher may exceed a configured maximum weekly
//! workload.
//!
//! ## Features
//!
//! - **Period Grid**: validated, immutable weekly slot layout shared by all sections
//! - **Quota Ledger**: remaining weekly allocation per (subject, section) pair
//! - **Workload Tracker**: assigned periods per teacher against a weekly cap
//! - **Conflict Validation**: ordered admissibility checks for proposed assignments
//! - **Manual Assignment**: validated single-cell assign/remove/replace
//! - **Automatic Generation**: scarcity-first full-grid placement with shortfall reporting
//! - **Persistence Contract**: checksummed per-year snapshots behind a repository trait
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: identifier newtypes and report DTOs shared across layers
//! - [`models`]: domain types (academic year, period grid, catalog, timetable cells)
//! - [`engine`]: the scheduling core (ledger, tracker, validator, generator)
//! - [`db`]: repository pattern and persistence layer
//! - [`services`]: high-level orchestration (`TimetableService`, run tracking)
//!
//! ## Concurrency
//!
//! All mutations for a given academic year are serialized behind one
//! transaction boundary: validator-check, ledger/tracker reservation and the
//! cell write happen as a single atomic unit, and the resulting snapshot is
//! persisted before the boundary is released. Generator runs support
//! cooperative cancellation and never roll back committed cells.

pub mod api;

pub mod db;
pub mod engine;
pub mod error;
pub mod models;

pub mod services;

pub use error::{ScheduleError, ScheduleResult};
