//! Automatic generator integration tests.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use sts_rust::api::{
    AcademicYear, GeneratorOptions, PeriodId, SectionId, SubjectId, TeacherId, TimetableCell,
};
use sts_rust::db::repositories::LocalRepository;
use sts_rust::engine::CancelToken;
use sts_rust::models::catalog::{Catalog, QuotaSpec, Section, Subject, Teacher};
use sts_rust::models::grid::{Period, PeriodGrid, PeriodKind};
use sts_rust::services::{RunStatus, TimetableService};

fn t(h: u32, m: u32) -> chrono::NaiveTime {
    chrono::NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Four teaching periods and one break per day.
fn school_grid() -> PeriodGrid {
    let teaching = |id: i64, ordinal: u32, sh, sm, eh, em| Period {
        id: PeriodId(id),
        ordinal,
        start: t(sh, sm),
        end: t(eh, em),
        kind: PeriodKind::Teaching,
    };
    PeriodGrid::new(vec![
        teaching(1, 1, 8, 0, 8, 45),
        teaching(2, 2, 8, 45, 9, 30),
        Period {
            id: PeriodId(3),
            ordinal: 3,
            start: t(9, 30),
            end: t(9, 50),
            kind: PeriodKind::Break,
        },
        teaching(4, 4, 9, 50, 10, 35),
        teaching(5, 5, 10, 35, 11, 20),
    ])
    .unwrap()
}

fn section(id: i64, grade: u8, name: &str) -> Section {
    Section {
        id: SectionId(id),
        grade,
        name: name.to_string(),
    }
}

fn subject(id: i64, name: &str) -> Subject {
    Subject {
        id: SubjectId(id),
        name: name.to_string(),
    }
}

fn teacher(id: i64, cap: u32, subjects: &[i64]) -> Teacher {
    Teacher {
        id: TeacherId(id),
        name: format!("Teacher {}", id),
        max_weekly_workload: cap,
        eligible_subjects: subjects.iter().map(|s| SubjectId(*s)).collect::<BTreeSet<_>>(),
    }
}

fn quota(subject: i64, section: i64, units: u32) -> QuotaSpec {
    QuotaSpec {
        subject_id: SubjectId(subject),
        section_id: SectionId(section),
        weekly_quota: units,
    }
}

/// Two sections, two subjects, two well-staffed teachers; everything fits.
fn satisfiable_catalog() -> Catalog {
    Catalog {
        sections: vec![section(1, 10, "A"), section(2, 10, "B")],
        subjects: vec![subject(1, "Mathematics"), subject(2, "Science")],
        teachers: vec![teacher(1, 20, &[1, 2]), teacher(2, 20, &[1, 2])],
        quotas: vec![
            quota(1, 1, 4),
            quota(2, 1, 3),
            quota(1, 2, 4),
            quota(2, 2, 3),
        ],
    }
}

fn year() -> AcademicYear {
    "2024/25".parse().unwrap()
}

fn service_with(catalog: Catalog) -> TimetableService {
    TimetableService::new(Arc::new(LocalRepository::new()), catalog, school_grid()).unwrap()
}

fn assert_no_double_booking(cells: &[TimetableCell]) {
    let mut seen = HashSet::new();
    for cell in cells {
        assert!(
            seen.insert((cell.day, cell.period_id, cell.teacher_id)),
            "teacher {} double-booked at ({}, period {})",
            cell.teacher_id,
            cell.day,
            cell.period_id
        );
    }
}

#[tokio::test]
async fn test_generation_fills_all_quotas_when_satisfiable() {
    let service = service_with(satisfiable_catalog());
    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    assert!(report.shortfalls.is_empty());
    assert!(!report.cancelled);
    // 4+3 units per section, two sections.
    assert_eq!(report.committed.len(), 14);

    // Everything went through the ledger: nothing remains.
    for sec in [SectionId(1), SectionId(2)] {
        for status in service.quotas(&year(), sec).await.unwrap() {
            assert_eq!(status.remaining, 0, "quota left for {:?}", status);
        }
    }

    assert_no_double_booking(&report.committed);
}

#[tokio::test]
async fn test_generation_is_deterministic() {
    let first = service_with(satisfiable_catalog())
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();
    let second = service_with(satisfiable_catalog())
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    assert_eq!(first.committed, second.committed);
    assert_eq!(first.shortfalls, second.shortfalls);
}

#[tokio::test]
async fn test_seeded_generation_is_reproducible() {
    let options = GeneratorOptions {
        seed: Some(7),
        ..Default::default()
    };
    let first = service_with(satisfiable_catalog())
        .generate(&year(), options)
        .await
        .unwrap();
    let second = service_with(satisfiable_catalog())
        .generate(&year(), options)
        .await
        .unwrap();

    assert_eq!(first.committed, second.committed);
}

#[tokio::test]
async fn test_understaffed_pool_reports_shortfall() {
    // One teacher, cap 5, against 14 demanded units.
    let mut catalog = satisfiable_catalog();
    catalog.teachers = vec![teacher(1, 5, &[1, 2])];
    let service = service_with(catalog);

    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    assert_eq!(report.committed.len(), 5);
    assert_eq!(report.unmet_units(), 9);
    assert_no_double_booking(&report.committed);

    // Shortfall is reported, never raised: the call succeeded.
    let run = service.runs().get_run(&report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_quota_beyond_open_slots_reports_shortfall() {
    // 20 teaching slots per section per week; demand 25 units for one section.
    let mut catalog = satisfiable_catalog();
    catalog.quotas = vec![quota(1, 1, 25)];
    let service = service_with(catalog);

    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    assert_eq!(report.committed.len(), 20);
    assert_eq!(report.unmet_units(), 5);
}

#[tokio::test]
async fn test_workload_override_lowers_effective_cap() {
    let service = service_with(satisfiable_catalog());

    let report = service
        .generate(
            &year(),
            GeneratorOptions {
                max_workload_override: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Two teachers, three periods each under the override.
    assert_eq!(report.committed.len(), 6);
    assert_eq!(report.unmet_units(), 8);
    for (_, load) in service.teacher_loads(&year()).await.unwrap() {
        assert!(load <= 3);
    }
}

#[tokio::test]
async fn test_pre_cancelled_run_commits_nothing() {
    let service = service_with(satisfiable_catalog());
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = service
        .generate_with_token(&year(), GeneratorOptions::default(), cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.committed.is_empty());
    // The whole queue is reported back as shortfall.
    assert_eq!(report.unmet_units(), 14);

    let run = service.runs().get_run(&report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
}

#[tokio::test]
async fn test_generation_composes_with_manual_edits() {
    let service = service_with(satisfiable_catalog());

    // Pin one Math lesson by hand first; the generator must work around it.
    service
        .assign_cell(
            &year(),
            sts_rust::api::Day::Monday,
            PeriodId(1),
            SectionId(1),
            SubjectId(1),
            TeacherId(1),
        )
        .await
        .unwrap();

    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();
    assert!(report.shortfalls.is_empty());
    // 14 total units, one already placed manually.
    assert_eq!(report.committed.len(), 13);

    let cells = service.timetable(&year()).await.unwrap();
    assert_eq!(cells.len(), 14);
    assert_no_double_booking(&cells);

    // Manual removal still works on generated cells afterwards.
    let victim = cells[0];
    service
        .remove_cell(&year(), victim.day, victim.period_id, victim.section_id)
        .await
        .unwrap();
    assert_eq!(service.timetable(&year()).await.unwrap().len(), 13);
}

#[tokio::test]
async fn test_generation_never_places_on_breaks() {
    let service = service_with(satisfiable_catalog());
    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    assert!(report
        .committed
        .iter()
        .all(|cell| cell.period_id != PeriodId(3)));
}

#[tokio::test]
async fn test_run_tracker_records_progress() {
    let service = service_with(satisfiable_catalog());
    let report = service
        .generate(&year(), GeneratorOptions::default())
        .await
        .unwrap();

    let logs = service.runs().get_logs(&report.run_id);
    assert!(!logs.is_empty());
    let run = service.runs().get_run(&report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.result.is_some());
    assert_eq!(service.runs().list_runs().len(), 1);
}
