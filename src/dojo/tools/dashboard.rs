use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::dojo::tools::config::Settings;
use crate::dojo::tools::error::Result;
use crate::dojo::tools::io::csv_export;
use crate::dojo::tools::model::{NewPayment, NewStudent, Payment, Student};
use crate::dojo::tools::store::{RecordStore, Roster};
use crate::dojo::tools::summary::{Summary, compute_summary};

/// Everything the dashboard shows for one reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub reference: NaiveDate,
    /// Students with their status derived for `reference`.
    pub students: Vec<Student>,
    /// The raw payment log, orphans included.
    pub payments: Vec<Payment>,
    pub summary: Summary,
}

/// Derives statuses and metrics from an already loaded roster.
pub fn build_dashboard(mut roster: Roster, settings: &Settings, reference: NaiveDate) -> Dashboard {
    roster.refresh_statuses(&settings.status_engine(), reference);
    let summary = compute_summary(
        &roster.students,
        &roster.payments,
        reference,
        settings.month_matching,
    );
    Dashboard {
        reference,
        students: roster.students,
        payments: roster.payments,
        summary,
    }
}

/// Loads the roster and derives statuses and metrics.
#[instrument(
    level = "info",
    skip_all,
    fields(workbook = %store.path().display(), %reference)
)]
pub fn load_dashboard(
    store: &mut RecordStore,
    settings: &Settings,
    reference: NaiveDate,
) -> Result<Dashboard> {
    let roster = store.snapshot()?;
    info!(
        students = roster.students.len(),
        payments = roster.payments.len(),
        "roster loaded"
    );
    Ok(build_dashboard(roster, settings, reference))
}

/// Registers a student and rewrites the workbook.
///
/// Existing statuses are refreshed before writing; the new student is stored
/// as `New`. Nothing is written when validation fails.
#[instrument(
    level = "info",
    skip_all,
    fields(workbook = %store.path().display(), student = %new.id)
)]
pub fn register_student(
    store: &mut RecordStore,
    settings: &Settings,
    new: NewStudent,
    reference: NaiveDate,
) -> Result<Student> {
    let mut roster = store.snapshot()?;
    roster.refresh_statuses(&settings.status_engine(), reference);
    let student = roster.register_student(new)?.clone();
    store.commit(roster)?;
    info!(name = %student.name, "student registered");
    Ok(student)
}

/// Registers a payment and rewrites the workbook with refreshed statuses.
#[instrument(
    level = "info",
    skip_all,
    fields(workbook = %store.path().display(), student = %new.student)
)]
pub fn register_payment(
    store: &mut RecordStore,
    settings: &Settings,
    new: NewPayment,
    reference: NaiveDate,
) -> Result<Payment> {
    let mut roster = store.snapshot()?;
    let payment = roster.register_payment(new)?.clone();
    roster.refresh_statuses(&settings.status_engine(), reference);
    store.commit(roster)?;
    info!(
        student_id = %payment.student_id,
        amount = %payment.amount,
        period = %payment.reference_period,
        "payment registered"
    );
    Ok(payment)
}

/// Writes the students of `dashboard`, with their derived status, as CSV.
pub fn export_students_csv<W: Write>(dashboard: &Dashboard, writer: W) -> Result<()> {
    csv_export::write_students_csv(writer, &dashboard.students)
}

/// Writes the CSV export to `output`.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_students_csv_file(dashboard: &Dashboard, output: &Path) -> Result<()> {
    let file = File::create(output)?;
    export_students_csv(dashboard, BufWriter::new(file))?;
    debug!(students = dashboard.students.len(), "students exported");
    Ok(())
}
