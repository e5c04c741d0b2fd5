use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::{Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::dojo::tools::error::{Result, ToolError};
use crate::dojo::tools::io::{
    COL_AMOUNT, COL_ENROLLMENT_DATE, COL_MONTHLY_TUITION, COL_NAME, COL_PAYMENT_DATE,
    COL_PAYMENT_STATUS, COL_PHONE, COL_REFERENCE_PERIOD, COL_STUDENT_ID, LEGACY_PAYMENT_HEADERS,
    LEGACY_PAYMENTS_SHEET, LEGACY_STUDENT_HEADERS, LEGACY_STUDENTS_SHEET, PAYMENTS_SHEET,
    STUDENTS_SHEET,
};
use crate::dojo::tools::model::{Payment, PaymentStatus, Student, reference_period_label};

type Range = calamine::Range<DataType>;

/// Reads both record sets from a workbook following the layout produced by
/// the [`excel_write`](crate::io::excel_write) module.
///
/// Workbooks in the older Portuguese layout (`Alunos`/`Pagamentos`) are
/// accepted too. The persisted payment status is loaded as is; callers are
/// expected to recompute it before using it.
pub fn read_roster(path: &Path) -> Result<(Vec<Student>, Vec<Payment>)> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let (students_sheet, students_range) =
        read_required_sheet(&mut workbook, &[STUDENTS_SHEET, LEGACY_STUDENTS_SHEET])?;
    let (payments_sheet, payments_range) =
        read_required_sheet(&mut workbook, &[PAYMENTS_SHEET, LEGACY_PAYMENTS_SHEET])?;

    let students = parse_students(&students_range, students_sheet)?;
    let payments = parse_payments(&payments_range, payments_sheet)?;
    debug!(
        students = students.len(),
        payments = payments.len(),
        "record sets read from workbook"
    );
    Ok((students, payments))
}

/// Returns the first of `names` present in the workbook, with its cells.
fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    names: &[&'static str],
) -> Result<(&'static str, Range)> {
    for &name in names {
        if let Some(range_result) = workbook.worksheet_range(name) {
            let range = range_result.map_err(ToolError::from)?;
            return Ok((name, range));
        }
    }
    let wanted = names.first().copied().unwrap_or_default();
    Err(ToolError::InvalidWorkbook(format!("missing sheet '{wanted}'")))
}

/// Header name → column index for one sheet.
struct Columns<'a> {
    sheet: &'a str,
    index: HashMap<String, usize>,
}

impl<'a> Columns<'a> {
    /// Legacy headers listed in `aliases` are indexed under the column they
    /// stand for.
    fn locate(
        range: &Range,
        sheet: &'a str,
        required: &[&str],
        aliases: &[(&str, &str)],
    ) -> Result<Self> {
        let canonical = |name: String| -> String {
            aliases
                .iter()
                .find(|(legacy, _)| *legacy == name)
                .map(|(_, column)| column.to_string())
                .unwrap_or(name)
        };
        let index: HashMap<String, usize> = match range.rows().next() {
            Some(header) => header
                .iter()
                .enumerate()
                .map(|(idx, cell)| (canonical(cell_to_string(Some(cell)).trim().to_string()), idx))
                .filter(|(name, _)| !name.is_empty())
                .collect(),
            None => HashMap::new(),
        };

        // A sheet without any header row is an empty record set.
        if !index.is_empty() {
            for column in required {
                if !index.contains_key(*column) {
                    return Err(ToolError::InvalidWorkbook(format!(
                        "sheet '{sheet}' is missing column '{column}'"
                    )));
                }
            }
        }

        Ok(Self { sheet, index })
    }

    fn cell<'r>(&self, row: &'r [DataType], column: &str) -> Option<&'r DataType> {
        self.index.get(column).and_then(|idx| row.get(*idx))
    }

    fn text(&self, row: &[DataType], column: &str) -> String {
        cell_to_string(self.cell(row, column)).trim().to_string()
    }

    fn date(&self, row: &[DataType], row_number: usize, column: &str) -> Result<NaiveDate> {
        let cell = self.cell(row, column);
        cell_to_date(cell).ok_or_else(|| self.invalid(row_number, column, cell))
    }

    fn amount(&self, row: &[DataType], row_number: usize, column: &str) -> Result<Decimal> {
        let cell = self.cell(row, column);
        if is_blank(cell) {
            warn!(sheet = self.sheet, row = row_number, column, "blank amount read as zero");
            return Ok(Decimal::ZERO);
        }
        cell_to_decimal(cell).ok_or_else(|| self.invalid(row_number, column, cell))
    }

    fn invalid(&self, row_number: usize, column: &str, cell: Option<&DataType>) -> ToolError {
        ToolError::InvalidCell {
            sheet: self.sheet.to_string(),
            row: row_number,
            column: column.to_string(),
            value: cell_to_string(cell),
        }
    }
}

fn parse_students(range: &Range, sheet: &str) -> Result<Vec<Student>> {
    let columns = Columns::locate(
        range,
        sheet,
        &[COL_NAME, COL_STUDENT_ID, COL_PHONE, COL_ENROLLMENT_DATE, COL_MONTHLY_TUITION],
        &LEGACY_STUDENT_HEADERS,
    )?;
    let mut students = Vec::new();

    for (row_idx, row) in range.rows().enumerate().skip(1) {
        let row_number = row_idx + 1;
        let id = columns.text(row, COL_STUDENT_ID);
        let name = columns.text(row, COL_NAME);
        if id.is_empty() && name.is_empty() {
            continue;
        }

        let status = columns.text(row, COL_PAYMENT_STATUS);
        let status = PaymentStatus::from_str(&status).unwrap_or(PaymentStatus::New);

        students.push(Student {
            id,
            name,
            phone: columns.text(row, COL_PHONE),
            enrolled_on: columns.date(row, row_number, COL_ENROLLMENT_DATE)?,
            monthly_tuition: columns.amount(row, row_number, COL_MONTHLY_TUITION)?,
            status,
        });
    }

    Ok(students)
}

fn parse_payments(range: &Range, sheet: &str) -> Result<Vec<Payment>> {
    let columns = Columns::locate(
        range,
        sheet,
        &[COL_STUDENT_ID, COL_PAYMENT_DATE, COL_AMOUNT],
        &LEGACY_PAYMENT_HEADERS,
    )?;
    let mut payments = Vec::new();

    for (row_idx, row) in range.rows().enumerate().skip(1) {
        let row_number = row_idx + 1;
        if row.iter().all(|cell| is_blank(Some(cell))) {
            continue;
        }

        let paid_on = columns.date(row, row_number, COL_PAYMENT_DATE)?;
        let mut reference_period = columns.text(row, COL_REFERENCE_PERIOD);
        if reference_period.is_empty() {
            reference_period = reference_period_label(paid_on);
        }

        payments.push(Payment {
            student_id: columns.text(row, COL_STUDENT_ID),
            paid_on,
            amount: columns.amount(row, row_number, COL_AMOUNT)?,
            reference_period,
        });
    }

    Ok(payments)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn is_blank(cell: Option<&DataType>) -> bool {
    cell_to_string(cell).trim().is_empty()
}

/// Converts a cell into a calendar date. Serial dates, ISO text and the
/// day-first `DD/MM/YYYY` text used by the old dashboard are accepted.
fn cell_to_date(cell: Option<&DataType>) -> Option<NaiveDate> {
    match cell {
        Some(DataType::DateTime(serial)) | Some(DataType::Float(serial)) => serial_to_date(*serial),
        Some(DataType::Int(serial)) => serial_to_date(*serial as f64),
        Some(DataType::Empty) | None => None,
        other => parse_date_text(&cell_to_string(other)),
    }
}

/// Excel stores dates as days since 1899-12-30 (the 1900 leap-year bug is
/// folded into the epoch).
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|datetime| datetime.date())
        })
}

fn cell_to_decimal(cell: Option<&DataType>) -> Option<Decimal> {
    match cell {
        // Display of an f64 is its shortest round-trip form, so 0.1 stays 0.1.
        Some(DataType::Float(value)) if value.is_finite() => Decimal::from_str(&value.to_string()).ok(),
        Some(DataType::Int(value)) => Some(Decimal::from(*value)),
        other => {
            let text = cell_to_string(other);
            let text = text.trim().replace(',', ".");
            Decimal::from_str(&text).ok()
        }
    }
}
