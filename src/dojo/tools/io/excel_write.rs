use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::dojo::tools::error::{Result, ToolError};
use crate::dojo::tools::io::{PAYMENT_COLUMNS, PAYMENTS_SHEET, STUDENT_COLUMNS, STUDENTS_SHEET};
use crate::dojo::tools::model::{Payment, Student};

/// Cell formats shared by both sheets.
struct Formats {
    header: Format,
    date: Format,
    money: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            money: Format::new().set_num_format("0.00"),
        }
    }
}

/// Writes both record sets to the given path, replacing whatever is there.
///
/// Text columns are written as strings so identity keys keep their leading
/// zeros; dates are Excel serial dates and amounts plain numbers.
pub fn write_roster(path: &Path, students: &[Student], payments: &[Payment]) -> Result<()> {
    let formats = Formats::new();
    let mut workbook_writer = Workbook::new();

    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(STUDENTS_SHEET)?;
    write_header(worksheet, &STUDENT_COLUMNS, &formats)?;
    for (row_idx, student) in students.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, &student.name)?;
        worksheet.write_string(row, 1, &student.id)?;
        worksheet.write_string(row, 2, &student.phone)?;
        write_date(worksheet, row, 3, student.enrolled_on, &formats)?;
        write_amount(worksheet, row, 4, student.monthly_tuition, &formats)?;
        worksheet.write_string(row, 5, student.status.label())?;
    }

    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(PAYMENTS_SHEET)?;
    write_header(worksheet, &PAYMENT_COLUMNS, &formats)?;
    for (row_idx, payment) in payments.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, &payment.student_id)?;
        write_date(worksheet, row, 1, payment.paid_on, &formats)?;
        write_amount(worksheet, row, 2, payment.amount, &formats)?;
        worksheet.write_string(row, 3, &payment.reference_period)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_header(worksheet: &mut Worksheet, columns: &[&str], formats: &Formats) -> Result<()> {
    for (col_idx, header) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *header, &formats.header)?;
        worksheet.set_column_width(col_idx as u16, 18.0)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_date(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    date: NaiveDate,
    formats: &Formats,
) -> Result<()> {
    worksheet.write_number_with_format(row, col, date_to_serial(date), &formats.date)?;
    Ok(())
}

fn write_amount(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    amount: Decimal,
    formats: &Formats,
) -> Result<()> {
    let value = amount.to_f64().ok_or_else(|| {
        ToolError::InvalidWorkbook(format!("amount {amount} cannot be stored as a number"))
    })?;
    worksheet.write_number_with_format(row, col, value, &formats.money)?;
    Ok(())
}

fn date_to_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN);
    date.signed_duration_since(epoch).num_days() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_count_days_from_1899_epoch() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date_to_serial(date), 45292.0);
    }
}
