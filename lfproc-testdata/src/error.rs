//! Error types for synthetic archive generation

use thiserror::Error;

/// Result type alias for testdata operations
pub type Result<T> = std::result::Result<T, TestdataError>;

/// Errors raised while generating archives
#[derive(Error, Debug)]
pub enum TestdataError {
    /// Archive configuration cannot be rendered
    #[error("Invalid archive configuration: {0}")]
    InvalidConfig(String),

    /// Core library error
    #[error(transparent)]
    Lfproc(#[from] lfproc::LfprocError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lfproc::SeriesError> for TestdataError {
    fn from(e: lfproc::SeriesError) -> Self {
        TestdataError::Lfproc(e.into())
    }
}

impl From<lfproc::CatalogError> for TestdataError {
    fn from(e: lfproc::CatalogError) -> Self {
        TestdataError::Lfproc(e.into())
    }
}
