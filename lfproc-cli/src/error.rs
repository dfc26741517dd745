//! CLI error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Lfproc(#[from] lfproc::LfprocError),

    #[error(transparent)]
    Testdata(#[from] lfproc_testdata::TestdataError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid arguments: {0}")]
    Usage(String),
}

impl From<lfproc::CatalogError> for CliError {
    fn from(e: lfproc::CatalogError) -> Self {
        CliError::Lfproc(e.into())
    }
}
