//! Error types surfaced to the command line

use std::path::PathBuf;
use thiserror::Error;

use crate::fs::FsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database isn't specified")]
    DatabaseNotSpecified,

    #[error("Can't create a CouchApp in {}: default template not found.", .app_dir.display())]
    TemplateNotFound { app_dir: PathBuf },

    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid env entry for '{0}': expected {{\"db\": string | [string], \"name\": string}}")]
    InvalidEnvironment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Failed to walk template: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for helper operations
pub type AppResult<T> = Result<T, AppError>;
