//! Weekly period grid.
//!
//! The grid is the canonical ordered sequence of periods for the week, shared
//! by every section, and immutable after its first successful build for a
//! year. Break periods are part of the grid but can never carry a lesson; the
//! kind is fixed at construction time, never inferred downstream.

use crate::api::PeriodId;
use crate::error::{ScheduleError, ScheduleResult};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// School days, Monday through Friday.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All school days in week order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        };
        write!(f, "{}", name)
    }
}

/// Whether a period carries lessons or is a break.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodKind {
    Teaching,
    Break,
}

/// One weekly recurring time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    /// Position within the day; strictly increasing across the grid.
    pub ordinal: u32,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub kind: PeriodKind,
}

impl Period {
    pub fn is_teaching(&self) -> bool {
        self.kind == PeriodKind::Teaching
    }
}

/// Validated, immutable ordered sequence of weekly periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodGrid {
    periods: Vec<Period>,
}

impl PeriodGrid {
    /// Build a grid, validating the layout.
    ///
    /// Construction fails with `InvalidGridConfig` when the sequence is
    /// empty, ordinals are not strictly increasing, any period ends before it
    /// starts, consecutive periods overlap in time, or no TEACHING period
    /// exists.
    pub fn new(periods: Vec<Period>) -> ScheduleResult<Self> {
        if periods.is_empty() {
            return Err(ScheduleError::InvalidGridConfig {
                reason: "grid must contain at least one period".to_string(),
            });
        }

        for period in &periods {
            if period.start >= period.end {
                return Err(ScheduleError::InvalidGridConfig {
                    reason: format!(
                        "period {} ends at or before it starts ({} >= {})",
                        period.id, period.start, period.end
                    ),
                });
            }
        }

        for pair in periods.windows(2) {
            if pair[1].ordinal <= pair[0].ordinal {
                return Err(ScheduleError::InvalidGridConfig {
                    reason: format!(
                        "ordinals must be strictly increasing: {} followed by {}",
                        pair[0].ordinal, pair[1].ordinal
                    ),
                });
            }
            if pair[1].start < pair[0].end {
                return Err(ScheduleError::InvalidGridConfig {
                    reason: format!(
                        "period {} overlaps period {} in time",
                        pair[1].id, pair[0].id
                    ),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for period in &periods {
            if !seen.insert(period.id) {
                return Err(ScheduleError::InvalidGridConfig {
                    reason: format!("duplicate period id {}", period.id),
                });
            }
        }

        if !periods.iter().any(Period::is_teaching) {
            return Err(ScheduleError::InvalidGridConfig {
                reason: "grid must contain at least one TEACHING period".to_string(),
            });
        }

        Ok(PeriodGrid { periods })
    }

    /// Ordered sequence of all periods, breaks included.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Look up a period by id.
    pub fn period(&self, id: PeriodId) -> Option<&Period> {
        self.periods.iter().find(|p| p.id == id)
    }

    /// Teaching periods in grid order.
    pub fn teaching_periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter().filter(|p| p.is_teaching())
    }

    /// Number of teaching slots per section per week (periods x days).
    pub fn weekly_teaching_slots(&self) -> usize {
        self.teaching_periods().count() * Day::ALL.len()
    }
}
