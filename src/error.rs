// src/error.rs
//! Application error types.
//!
//! `AppError` only covers faults the importer cannot report and move past:
//! configuration problems, unreadable input files and transport failures.
//! Non-2xx answers from the server are not errors; they travel as
//! [`ApiOutcome::Rejected`](crate::api::ApiOutcome) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid config file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Network failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read input file {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Import cache error: {0}")]
    Cache(String),
}

impl AppError {
    /// Whether the error came from the HTTP layer rather than local state.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
