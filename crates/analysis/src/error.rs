//! Error types for the analysis pipeline.

use thiserror::Error;

/// Errors produced while building, exporting or retrieving a risk analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("core error: {0}")]
    Core(#[from] firerisk_core::Error),

    #[error("cloud error: {0}")]
    Cloud(#[from] firerisk_cloud::CloudError),

    #[error("folder '{0}' not found in storage")]
    FolderNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
