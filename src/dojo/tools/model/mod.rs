use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity key assigned to a student. It is kept as the plain string typed in
/// at registration so that leading zeros and punctuation survive the
/// spreadsheet round-trip.
pub type StudentId = String;

/// Payment standing derived for a student from their payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Freshly registered, no tuition cycle has elapsed yet.
    New,
    /// Last payment falls in the reference month or the one before it.
    Current,
    /// No payment, or the last one is older than a month index.
    Overdue,
}

impl PaymentStatus {
    /// Every status in display order.
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::New,
        PaymentStatus::Current,
        PaymentStatus::Overdue,
    ];

    /// Label written to the workbook, the CSV export and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::New => "New",
            PaymentStatus::Current => "Current",
            PaymentStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Workbooks written by the previous dashboard carry Portuguese labels.
        match value.trim().to_lowercase().as_str() {
            "new" | "novo" => Ok(PaymentStatus::New),
            "current" | "em dia" => Ok(PaymentStatus::Current),
            "overdue" | "atrasado" => Ok(PaymentStatus::Overdue),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Identity key, unique across the roster.
    pub id: StudentId,
    pub name: String,
    pub phone: String,
    pub enrolled_on: NaiveDate,
    /// Monthly tuition, never negative.
    pub monthly_tuition: Decimal,
    /// Derived on every load; the persisted value is only a display cache.
    pub status: PaymentStatus,
}

/// A tuition payment. Payments are append-only and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Identity key of the paying student. May not match any student.
    pub student_id: StudentId,
    pub paid_on: NaiveDate,
    pub amount: Decimal,
    /// `"<Month>/<Year>"` label fixed when the payment was recorded.
    pub reference_period: String,
}

impl Payment {
    /// Creates a payment labelled with the month of `paid_on`.
    pub fn new(student_id: impl Into<StudentId>, paid_on: NaiveDate, amount: Decimal) -> Self {
        Self {
            student_id: student_id.into(),
            paid_on,
            amount,
            reference_period: reference_period_label(paid_on),
        }
    }
}

/// Formats the reference-period label for a payment date, e.g.
/// `"January/2024"`. Month names are always English.
pub fn reference_period_label(date: NaiveDate) -> String {
    date.format("%B/%Y").to_string()
}

/// Input accepted when registering a student.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub id: StudentId,
    pub name: String,
    pub phone: String,
    pub enrolled_on: NaiveDate,
    pub monthly_tuition: Decimal,
}

/// How a payment names the student it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentSelector {
    /// Exact identity key.
    Id(StudentId),
    /// Exact student name; the first registered match wins.
    Name(String),
}

impl fmt::Display for StudentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentSelector::Id(id) => write!(f, "id {id}"),
            StudentSelector::Name(name) => write!(f, "name {name}"),
        }
    }
}

/// Input accepted when registering a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub student: StudentSelector,
    pub paid_on: NaiveDate,
    pub amount: Decimal,
}
