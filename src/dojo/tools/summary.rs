//! Financial rollups over the roster.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dojo::tools::model::{Payment, PaymentStatus, Student};

/// Rule deciding whether a payment belongs to the reference month.
///
/// `MonthOnly` compares the month number alone, so a payment from March of
/// any year counts towards March's revenue. It is the default because the
/// dashboard has always reported it that way; `MonthAndYear` is the corrected
/// comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthMatching {
    #[default]
    MonthOnly,
    MonthAndYear,
}

impl MonthMatching {
    pub fn matches(self, date: NaiveDate, reference: NaiveDate) -> bool {
        match self {
            MonthMatching::MonthOnly => date.month() == reference.month(),
            MonthMatching::MonthAndYear => {
                date.month() == reference.month() && date.year() == reference.year()
            }
        }
    }
}

/// Revenue collected under one reference-period label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRevenue {
    pub period: String,
    pub total: Decimal,
}

/// Summary metrics shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_students: usize,
    /// Sum of every student's tuition, whatever their status.
    pub potential_monthly_revenue: Decimal,
    /// Sum of every payment ever recorded, orphans included.
    pub total_revenue_all_time: Decimal,
    pub current_month_revenue: Decimal,
    pub overdue_count: usize,
    pub overdue_value: Decimal,
    /// Only statuses held by at least one student appear.
    pub status_counts: BTreeMap<PaymentStatus, usize>,
    /// Grouped by reference-period label, in order of first appearance.
    pub monthly_revenue_series: Vec<PeriodRevenue>,
    /// Payments whose key matches no registered student.
    pub orphan_payments: usize,
}

/// Computes the summary metrics. `students` must already carry their derived
/// status.
pub fn compute_summary(
    students: &[Student],
    payments: &[Payment],
    reference: NaiveDate,
    matching: MonthMatching,
) -> Summary {
    let potential_monthly_revenue = students.iter().map(|s| s.monthly_tuition).sum();

    let mut status_counts = BTreeMap::new();
    let mut overdue_count = 0;
    let mut overdue_value = Decimal::ZERO;
    for student in students {
        *status_counts.entry(student.status).or_insert(0) += 1;
        if student.status == PaymentStatus::Overdue {
            overdue_count += 1;
            overdue_value += student.monthly_tuition;
        }
    }

    let total_revenue_all_time = payments.iter().map(|p| p.amount).sum();
    let current_month_revenue = payments
        .iter()
        .filter(|p| matching.matches(p.paid_on, reference))
        .map(|p| p.amount)
        .sum();

    let known: HashSet<&str> = students.iter().map(|s| s.id.as_str()).collect();
    let orphan_payments = payments
        .iter()
        .filter(|p| !known.contains(p.student_id.as_str()))
        .count();

    Summary {
        total_students: students.len(),
        potential_monthly_revenue,
        total_revenue_all_time,
        current_month_revenue,
        overdue_count,
        overdue_value,
        status_counts,
        monthly_revenue_series: revenue_by_period(payments),
        orphan_payments,
    }
}

/// Sums payment amounts per reference-period label, keeping the order in
/// which labels first appear in the payment log.
pub fn revenue_by_period(payments: &[Payment]) -> Vec<PeriodRevenue> {
    let mut series: Vec<PeriodRevenue> = Vec::new();
    for payment in payments {
        match series.iter_mut().find(|entry| entry.period == payment.reference_period) {
            Some(entry) => entry.total += payment.amount,
            None => series.push(PeriodRevenue {
                period: payment.reference_period.clone(),
                total: payment.amount,
            }),
        }
    }
    series
}
