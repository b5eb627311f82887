//! Catalog snapshot consumed by the engine.
//!
//! Sections, subjects and teachers are owned by an external catalog
//! collaborator; the engine only references them by id. The snapshot also
//! carries the weekly quota table and each teacher's subject eligibility,
//! which together define the generator's input.

use crate::api::{SectionId, SubjectId, TeacherId};
use crate::error::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A grade-section, e.g. grade 10 section "B".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub grade: u8,
    pub name: String,
}

/// A subject, referenced by quotas and eligibility sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

/// A teacher with a weekly workload cap and the subjects they may teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub max_weekly_workload: u32,
    /// Subjects this teacher is assigned to; the validator rejects any
    /// pairing outside this set.
    pub eligible_subjects: BTreeSet<SubjectId>,
}

/// Weekly quota for one subject in one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSpec {
    pub subject_id: SubjectId,
    pub section_id: SectionId,
    pub weekly_quota: u32,
}

/// Read-only catalog input for one academic year.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub sections: Vec<Section>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub quotas: Vec<QuotaSpec>,
}

impl Catalog {
    /// Check internal consistency: unique ids, and every quota/eligibility
    /// reference resolving to a declared entity.
    pub fn validate(&self) -> ScheduleResult<()> {
        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if !section_ids.insert(section.id) {
                return Err(ScheduleError::InvalidCatalog {
                    reason: format!("duplicate section id {}", section.id),
                });
            }
        }
        let mut subject_ids = HashSet::new();
        for subject in &self.subjects {
            if !subject_ids.insert(subject.id) {
                return Err(ScheduleError::InvalidCatalog {
                    reason: format!("duplicate subject id {}", subject.id),
                });
            }
        }
        let mut teacher_ids = HashSet::new();
        for teacher in &self.teachers {
            if !teacher_ids.insert(teacher.id) {
                return Err(ScheduleError::InvalidCatalog {
                    reason: format!("duplicate teacher id {}", teacher.id),
                });
            }
            for subject_id in &teacher.eligible_subjects {
                if !subject_ids.contains(subject_id) {
                    return Err(ScheduleError::NotFound {
                        entity: "subject",
                        id: subject_id.value(),
                    });
                }
            }
        }

        let mut quota_keys = HashSet::new();
        for quota in &self.quotas {
            if !subject_ids.contains(&quota.subject_id) {
                return Err(ScheduleError::NotFound {
                    entity: "subject",
                    id: quota.subject_id.value(),
                });
            }
            if !section_ids.contains(&quota.section_id) {
                return Err(ScheduleError::NotFound {
                    entity: "section",
                    id: quota.section_id.value(),
                });
            }
            if !quota_keys.insert((quota.subject_id, quota.section_id)) {
                return Err(ScheduleError::InvalidCatalog {
                    reason: format!(
                        "duplicate quota for subject {} in section {}",
                        quota.subject_id, quota.section_id
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    /// Teachers eligible for a subject, in ascending id order.
    pub fn eligible_teachers(&self, subject_id: SubjectId) -> Vec<&Teacher> {
        let mut teachers: Vec<&Teacher> = self
            .teachers
            .iter()
            .filter(|t| t.eligible_subjects.contains(&subject_id))
            .collect();
        teachers.sort_by_key(|t| t.id);
        teachers
    }

    /// Workload cap lookup by teacher id.
    pub fn workload_caps(&self) -> HashMap<TeacherId, u32> {
        self.teachers
            .iter()
            .map(|t| (t.id, t.max_weekly_workload))
            .collect()
    }
}
