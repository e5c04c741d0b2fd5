use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads, validates, or persists the roster.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the settings file cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the CSV export cannot be produced.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected layout.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a cell holds a value that cannot be converted to the
    /// column's type.
    #[error("invalid value '{value}' in sheet {sheet}, row {row}, column {column}")]
    InvalidCell {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    /// Raised when user input is rejected before anything is written.
    #[error("{0}")]
    Validation(String),

    /// Raised when a payment references a student that is not registered.
    #[error("no registered student matches '{0}'")]
    UnknownStudent(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
