#![allow(dead_code)]

use chrono::NaiveDate;
use dojo_tools::model::{Payment, PaymentStatus, Student};
use rust_decimal::Decimal;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn student(id: &str, name: &str, tuition: Decimal) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        phone: "555-0100".to_string(),
        enrolled_on: date(2024, 1, 2),
        monthly_tuition: tuition,
        status: PaymentStatus::New,
    }
}

pub fn payment(id: &str, paid_on: NaiveDate, amount: Decimal) -> Payment {
    Payment::new(id, paid_on, amount)
}
