//! Domain model types.

pub mod catalog;
pub mod grid;
pub mod timetable;
pub mod year;

pub use catalog::{Catalog, QuotaSpec, Section, Subject, Teacher};
pub use grid::{Day, Period, PeriodGrid, PeriodKind};
pub use timetable::{SlotKey, TimetableCell, TimetableSnapshot};
pub use year::AcademicYear;
