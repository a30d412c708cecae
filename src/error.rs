//! Error types for the sheetstream library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sheetstream operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Main error type for all workbook-writing operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// Error occurred while writing the workbook
    #[error("Failed to write workbook: {0}")]
    WriteError(String),

    /// Output directory does not exist
    #[error("Directory '{}' for output file does not exist", .0.display())]
    OutputDirMissing(PathBuf),

    /// Output file exists and cannot be replaced
    #[error("File '{}' is not writeable", .0.display())]
    FileNotWritable(PathBuf),

    /// Save was called on a workbook without worksheets
    #[error("No worksheets defined")]
    NoWorksheets,

    /// Temporary part file could not be created
    #[error("Unable to create temporary part file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    /// Invalid cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for SheetError {
    fn from(err: zip::result::ZipError) -> Self {
        SheetError::WriteError(err.to_string())
    }
}
