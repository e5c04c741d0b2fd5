mod common;

use std::fs;

use common::{date, payment, student};
use dojo_tools::ToolError;
use dojo_tools::config::Settings;
use dojo_tools::dashboard;
use dojo_tools::model::{NewPayment, NewStudent, PaymentStatus, StudentSelector};
use dojo_tools::store::{CachePolicy, RecordStore, Roster};
use dojo_tools::summary::MonthMatching;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn settings_for(path: &std::path::Path) -> Settings {
    Settings {
        workbook: path.to_path_buf(),
        ..Settings::default()
    }
}

fn new_student(id: &str, name: &str) -> NewStudent {
    NewStudent {
        id: id.to_string(),
        name: name.to_string(),
        phone: String::new(),
        enrolled_on: date(2024, 1, 10),
        monthly_tuition: dec!(100),
    }
}

#[test]
fn registration_flow_derives_statuses_and_metrics() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = settings_for(&temp_dir.path().join("students.xlsx"));
    let mut store = settings.record_store();
    let reference = date(2024, 2, 20);

    let ana = dashboard::register_student(&mut store, &settings, new_student("001", "Ana"), reference)
        .expect("student registered");
    assert_eq!(ana.status, PaymentStatus::New);

    let mut bruno = new_student("002", "Bruno");
    bruno.monthly_tuition = dec!(150);
    dashboard::register_student(&mut store, &settings, bruno, reference).expect("student registered");

    let payment = dashboard::register_payment(
        &mut store,
        &settings,
        NewPayment {
            student: StudentSelector::Name("Ana".into()),
            paid_on: date(2024, 1, 15),
            amount: dec!(100),
        },
        reference,
    )
    .expect("payment registered");
    assert_eq!(payment.student_id, "001");
    assert_eq!(payment.reference_period, "January/2024");

    let view = dashboard::load_dashboard(&mut store, &settings, reference).expect("dashboard loaded");
    let statuses: Vec<(&str, PaymentStatus)> = view
        .students
        .iter()
        .map(|s| (s.id.as_str(), s.status))
        .collect();
    assert_eq!(
        statuses,
        vec![("001", PaymentStatus::Current), ("002", PaymentStatus::Overdue)]
    );
    assert_eq!(view.summary.total_students, 2);
    assert_eq!(view.summary.potential_monthly_revenue, dec!(250));
    assert_eq!(view.summary.total_revenue_all_time, dec!(100));
    assert_eq!(view.summary.current_month_revenue, dec!(0));
    assert_eq!(view.summary.overdue_count, 1);
    assert_eq!(view.summary.overdue_value, dec!(150));

    // Two months after the only payment everyone is overdue.
    let later = dashboard::load_dashboard(&mut store, &settings, date(2024, 3, 1)).expect("dashboard loaded");
    assert!(later.students.iter().all(|s| s.status == PaymentStatus::Overdue));
}

#[test]
fn persisted_status_is_refreshed_on_load() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = settings_for(&temp_dir.path().join("students.xlsx"));
    let mut store = settings.record_store();

    dashboard::register_student(&mut store, &settings, new_student("001", "Ana"), date(2024, 1, 10))
        .expect("student registered");
    let stored = Roster::load(&settings.workbook).expect("roster loaded");
    assert_eq!(stored.students[0].status, PaymentStatus::New);

    let view = dashboard::load_dashboard(&mut store, &settings, date(2024, 1, 10)).expect("dashboard loaded");
    assert_eq!(view.students[0].status, PaymentStatus::Overdue);
}

#[test]
fn grace_period_keeps_fresh_enrollments_new() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = Settings {
        grace_months: 1,
        ..settings_for(&temp_dir.path().join("students.xlsx"))
    };
    let mut store = settings.record_store();

    dashboard::register_student(&mut store, &settings, new_student("001", "Ana"), date(2024, 1, 10))
        .expect("student registered");

    let view = dashboard::load_dashboard(&mut store, &settings, date(2024, 1, 31)).expect("dashboard loaded");
    assert_eq!(view.students[0].status, PaymentStatus::New);
    let view = dashboard::load_dashboard(&mut store, &settings, date(2024, 2, 1)).expect("dashboard loaded");
    assert_eq!(view.students[0].status, PaymentStatus::Overdue);
}

#[test]
fn rejected_registrations_write_nothing() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = settings_for(&temp_dir.path().join("students.xlsx"));
    let mut store = settings.record_store();
    let reference = date(2024, 2, 1);

    let error = dashboard::register_student(&mut store, &settings, new_student("001", ""), reference)
        .expect_err("empty name rejected");
    assert!(matches!(error, ToolError::Validation(_)));
    assert!(!settings.workbook.exists());

    dashboard::register_student(&mut store, &settings, new_student("001", "Ana"), reference)
        .expect("student registered");
    let before = fs::read(&settings.workbook).expect("workbook read");

    let error = dashboard::register_payment(
        &mut store,
        &settings,
        NewPayment {
            student: StudentSelector::Id("999".into()),
            paid_on: reference,
            amount: dec!(100),
        },
        reference,
    )
    .expect_err("unknown student rejected");
    assert!(matches!(error, ToolError::UnknownStudent(_)));

    let after = fs::read(&settings.workbook).expect("workbook read");
    assert_eq!(before, after);
    assert!(Roster::load(&settings.workbook).expect("roster loaded").payments.is_empty());
}

#[test]
fn orphan_payments_stay_visible_in_listings_and_revenue() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = settings_for(&temp_dir.path().join("students.xlsx"));

    let mut roster = Roster::default();
    roster.students.push(student("1", "Ana", dec!(100)));
    roster.payments.push(payment("1", date(2024, 1, 10), dec!(50)));
    roster.payments.push(payment("gone", date(2024, 2, 5), dec!(70)));
    roster.flush(&settings.workbook).expect("flushed");

    let mut store = settings.record_store();
    let view = dashboard::load_dashboard(&mut store, &settings, date(2024, 2, 20)).expect("dashboard loaded");

    assert_eq!(view.payments.len(), 2);
    assert_eq!(view.summary.total_revenue_all_time, dec!(120));
    assert_eq!(view.summary.orphan_payments, 1);
    assert_eq!(view.students[0].status, PaymentStatus::Current);
}

#[test]
fn month_matching_setting_controls_current_month_revenue() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("students.xlsx");

    let mut roster = Roster::default();
    roster.students.push(student("1", "Ana", dec!(100)));
    roster.payments.push(payment("1", date(2023, 3, 5), dec!(100)));
    roster.flush(&path).expect("flushed");

    let faithful = settings_for(&path);
    let view = dashboard::load_dashboard(&mut faithful.record_store(), &faithful, date(2024, 3, 5))
        .expect("dashboard loaded");
    assert_eq!(view.summary.current_month_revenue, dec!(100));

    let corrected = Settings {
        month_matching: MonthMatching::MonthAndYear,
        ..settings_for(&path)
    };
    let view = dashboard::load_dashboard(&mut corrected.record_store(), &corrected, date(2024, 3, 5))
        .expect("dashboard loaded");
    assert_eq!(view.summary.current_month_revenue, dec!(0));
}

#[test]
fn cached_store_serves_first_load_until_reloaded() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("students.xlsx");

    let mut roster = Roster::default();
    roster.students.push(student("1", "Ana", dec!(100)));
    roster.flush(&path).expect("flushed");

    let mut cached = RecordStore::new(&path, CachePolicy::Cached);
    let mut fresh = RecordStore::new(&path, CachePolicy::Fresh);
    assert_eq!(cached.snapshot().expect("snapshot").students.len(), 1);

    roster.students.push(student("2", "Bruno", dec!(100)));
    roster.flush(&path).expect("flushed");

    assert_eq!(cached.snapshot().expect("snapshot").students.len(), 1);
    assert_eq!(fresh.snapshot().expect("snapshot").students.len(), 2);

    cached.reload();
    assert_eq!(cached.snapshot().expect("snapshot").students.len(), 2);
}

#[test]
fn cached_store_sees_its_own_commits() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = Settings {
        cache_policy: CachePolicy::Cached,
        ..settings_for(&temp_dir.path().join("students.xlsx"))
    };
    let mut store = settings.record_store();
    let reference = date(2024, 2, 1);

    dashboard::register_student(&mut store, &settings, new_student("001", "Ana"), reference)
        .expect("student registered");
    dashboard::register_student(&mut store, &settings, new_student("002", "Bruno"), reference)
        .expect("student registered");

    let view = dashboard::load_dashboard(&mut store, &settings, reference).expect("dashboard loaded");
    assert_eq!(view.students.len(), 2);
}

#[test]
fn csv_export_includes_computed_status() {
    let temp_dir = tempdir().expect("temporary directory");
    let settings = settings_for(&temp_dir.path().join("students.xlsx"));
    let mut store = settings.record_store();
    let reference = date(2024, 2, 20);

    dashboard::register_student(&mut store, &settings, new_student("0007", "Ana"), reference)
        .expect("student registered");
    dashboard::register_student(&mut store, &settings, new_student("0008", "Bruno"), reference)
        .expect("student registered");
    dashboard::register_payment(
        &mut store,
        &settings,
        NewPayment {
            student: StudentSelector::Id("0007".into()),
            paid_on: date(2024, 2, 1),
            amount: dec!(100),
        },
        reference,
    )
    .expect("payment registered");

    let view = dashboard::load_dashboard(&mut store, &settings, reference).expect("dashboard loaded");
    let output = temp_dir.path().join("students.csv");
    dashboard::export_students_csv_file(&view, &output).expect("CSV exported");

    let written = fs::read_to_string(&output).expect("CSV read");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "name,student_id,phone,enrollment_date,monthly_tuition,payment_status",
            "Ana,0007,,2024-01-10,100,Current",
            "Bruno,0008,,2024-01-10,100,Overdue",
        ]
    );
}
