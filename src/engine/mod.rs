//! Scheduling core.
//!
//! The engine owns the per-year mutable state (committed cells plus the two
//! running aggregates, quota ledger and workload tracker) and the logic that
//! mutates it: the conflict validator, the atomic assign/remove primitives,
//! and the automatic generator. Everything here is synchronous and
//! lock-free; the service layer wraps a [`YearState`] in the year transaction
//! boundary.

pub mod generator;
pub mod ledger;
pub mod state;
pub mod validator;
pub mod workload;

pub use generator::{generate, CancelToken, GenerationOutcome};
pub use ledger::QuotaLedger;
pub use state::{AssignmentRequest, CellAssignment, YearState};
pub use validator::can_assign;
pub use workload::WorkloadTracker;
