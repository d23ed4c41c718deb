use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failures that stop a report run.
///
/// Malformed lines inside the logs are not errors; the parsers skip them.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the run summary cannot be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the workbook package cannot be opened as a zip archive.
    #[error("workbook archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Raised when a workbook part is not well-formed XML.
    #[error("workbook XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Raised when the template does not follow the expected layout.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a log file is not valid UTF-8. The user has to re-encode it.
    #[error("{path} is not valid UTF-8; re-save it as UTF-8 and retry: {source}")]
    Undecodable {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
