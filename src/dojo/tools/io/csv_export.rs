use std::io::Write;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dojo::tools::error::Result;
use crate::dojo::tools::model::Student;

/// One exported line. Field names double as the CSV header.
#[derive(Debug, Serialize)]
struct StudentRecord<'a> {
    name: &'a str,
    student_id: &'a str,
    phone: &'a str,
    enrollment_date: String,
    monthly_tuition: Decimal,
    payment_status: &'static str,
}

impl<'a> From<&'a Student> for StudentRecord<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            name: &student.name,
            student_id: &student.id,
            phone: &student.phone,
            enrollment_date: student.enrolled_on.format("%Y-%m-%d").to_string(),
            monthly_tuition: student.monthly_tuition,
            payment_status: student.status.label(),
        }
    }
}

/// Writes the students record set, including the derived status, as CSV.
///
/// The header is always emitted, even for an empty roster.
pub fn write_students_csv<W: Write>(writer: W, students: &[Student]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record([
        "name",
        "student_id",
        "phone",
        "enrollment_date",
        "monthly_tuition",
        "payment_status",
    ])?;
    for student in students {
        writer.serialize(StudentRecord::from(student))?;
    }
    writer.flush()?;
    Ok(())
}
