//! Adapters between the roster and its on-disk representations.

pub mod csv_export;
pub mod excel_read;
pub mod excel_write;

/// Sheet holding one row per registered student.
pub const STUDENTS_SHEET: &str = "Students";
/// Sheet holding the append-only payment log.
pub const PAYMENTS_SHEET: &str = "Payments";

pub const COL_NAME: &str = "Name";
pub const COL_STUDENT_ID: &str = "Student ID";
pub const COL_PHONE: &str = "Phone";
pub const COL_ENROLLMENT_DATE: &str = "Enrollment Date";
pub const COL_MONTHLY_TUITION: &str = "Monthly Tuition";
pub const COL_PAYMENT_STATUS: &str = "Payment Status";
pub const COL_PAYMENT_DATE: &str = "Payment Date";
pub const COL_AMOUNT: &str = "Amount";
pub const COL_REFERENCE_PERIOD: &str = "Reference Period";

/// Sheet names written by the older Portuguese dashboard. They are read but
/// never written; the next flush rewrites the workbook in the layout above.
pub const LEGACY_STUDENTS_SHEET: &str = "Alunos";
pub const LEGACY_PAYMENTS_SHEET: &str = "Pagamentos";

/// Older students-sheet headers, paired with the column each one stands for.
pub const LEGACY_STUDENT_HEADERS: [(&str, &str); 6] = [
    ("Nome do Aluno", COL_NAME),
    ("CPF", COL_STUDENT_ID),
    ("Celular", COL_PHONE),
    ("Data de Matrícula", COL_ENROLLMENT_DATE),
    ("Mensalidade", COL_MONTHLY_TUITION),
    ("Status Pagamento", COL_PAYMENT_STATUS),
];

/// Older payments-sheet headers, paired with the column each one stands for.
pub const LEGACY_PAYMENT_HEADERS: [(&str, &str); 4] = [
    ("CPF do Aluno", COL_STUDENT_ID),
    ("Data do Pagamento", COL_PAYMENT_DATE),
    ("Valor", COL_AMOUNT),
    ("Mês de Referência", COL_REFERENCE_PERIOD),
];

/// Column layout of the students sheet, in write order.
pub const STUDENT_COLUMNS: [&str; 6] = [
    COL_NAME,
    COL_STUDENT_ID,
    COL_PHONE,
    COL_ENROLLMENT_DATE,
    COL_MONTHLY_TUITION,
    COL_PAYMENT_STATUS,
];

/// Column layout of the payments sheet, in write order.
pub const PAYMENT_COLUMNS: [&str; 4] = [
    COL_STUDENT_ID,
    COL_PAYMENT_DATE,
    COL_AMOUNT,
    COL_REFERENCE_PERIOD,
];
