//! Persistence module for timetable snapshots.
//!
//! This module provides abstractions for storage operations via the
//! Repository pattern, allowing different backends to be swapped easily.
//!
//! # Architecture
//!
//! The persistence side follows a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Service Layer (services::TimetableService)             │
//! │  - Year transaction boundary                            │
//! │  - Ledger/Tracker bookkeeping                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository) - Abstract Interface     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────────────────┐
//!     │     Local Repository    JSON Repository      │
//!     │       (in-memory)      (snapshot files)      │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The stored form is always a complete, invariant-satisfying snapshot of one
//! academic year; every mutation path is replayable against a freshly loaded
//! store.

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use checksum::calculate_checksum;
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::{JsonRepository, LocalRepository};
pub use repository::{
    ErrorContext, RepositoryError, RepositoryResult, TimetableRepository,
};
