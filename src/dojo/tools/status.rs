//! Payment status derivation.
//!
//! A student's status only depends on the date of their most recent payment
//! and the reference date. Recency is measured in calendar month indexes
//! (`year * 12 + month`), so the day of the month never matters: a payment on
//! the 31st of January and a reference date of the 1st of February are one
//! month apart, exactly like the 1st of January and the 28th of February.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::dojo::tools::model::{Payment, PaymentStatus, Student};

/// Number of calendar months between `earlier` and `reference`, ignoring the
/// day of the month. Negative when `earlier` lies in a later month.
pub fn month_index_diff(reference: NaiveDate, earlier: NaiveDate) -> i32 {
    (reference.year() - earlier.year()) * 12 + (reference.month() as i32 - earlier.month() as i32)
}

/// Derives payment statuses.
///
/// `grace_months` keeps students without any payment in the `New` state while
/// their enrollment month is fewer than that many months before the reference
/// month. The default of zero disables the grace period, so a student with no
/// payments is always `Overdue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusEngine {
    pub grace_months: u32,
}

impl StatusEngine {
    pub fn new(grace_months: u32) -> Self {
        Self { grace_months }
    }

    /// Computes the status of `student` from `payments`.
    ///
    /// Payments whose key differs from the student's are ignored, so callers
    /// may pass either the student's own payments or the whole payment log.
    pub fn status_for<'a, I>(&self, student: &Student, payments: I, reference: NaiveDate) -> PaymentStatus
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let last_paid = payments
            .into_iter()
            .filter(|payment| payment.student_id == student.id)
            .map(|payment| payment.paid_on)
            .max();
        self.status_from_last_payment(student, last_paid, reference)
    }

    /// Recomputes the status of every student in place.
    pub fn annotate(&self, students: &mut [Student], payments: &[Payment], reference: NaiveDate) {
        let latest = latest_payment_dates(payments);
        for student in students.iter_mut() {
            let last_paid = latest.get(student.id.as_str()).copied();
            student.status = self.status_from_last_payment(student, last_paid, reference);
        }
        debug!(
            students = students.len(),
            payments = payments.len(),
            %reference,
            "payment statuses recomputed"
        );
    }

    fn status_from_last_payment(
        &self,
        student: &Student,
        last_paid: Option<NaiveDate>,
        reference: NaiveDate,
    ) -> PaymentStatus {
        match last_paid {
            // A future-dated payment yields a negative difference and counts as current.
            Some(last) if month_index_diff(reference, last) <= 1 => PaymentStatus::Current,
            Some(_) => PaymentStatus::Overdue,
            None if self.within_grace(student, reference) => PaymentStatus::New,
            None => PaymentStatus::Overdue,
        }
    }

    fn within_grace(&self, student: &Student, reference: NaiveDate) -> bool {
        let grace = i32::try_from(self.grace_months).unwrap_or(i32::MAX);
        grace > 0 && month_index_diff(reference, student.enrolled_on) < grace
    }
}

/// Most recent payment date per student key. Orphan keys are included; they
/// simply never get looked up.
pub fn latest_payment_dates(payments: &[Payment]) -> HashMap<&str, NaiveDate> {
    let mut latest: HashMap<&str, NaiveDate> = HashMap::new();
    for payment in payments {
        latest
            .entry(payment.student_id.as_str())
            .and_modify(|date| *date = (*date).max(payment.paid_on))
            .or_insert(payment.paid_on);
    }
    latest
}

/// Computes a student's status with the default policy (no grace period).
pub fn compute_status<'a, I>(student: &Student, payments: I, reference: NaiveDate) -> PaymentStatus
where
    I: IntoIterator<Item = &'a Payment>,
{
    StatusEngine::default().status_for(student, payments, reference)
}

/// Recomputes every student's status with the default policy.
pub fn annotate_statuses(students: &mut [Student], payments: &[Payment], reference: NaiveDate) {
    StatusEngine::default().annotate(students, payments, reference);
}
