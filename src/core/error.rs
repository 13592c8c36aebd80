//! Error handling logic

use crate::submit::SubmitError;
use thiserror::Error;

/// Error types for the fallible parts of the crate.
///
/// The compile stages (running, sampling, normalizing, validating) never fail;
/// they degrade to the default document instead. Everything else reports
/// through this enum.
#[derive(Debug, Error)]
pub enum TacError {
    /// A document is structurally unusable for the requested operation.
    #[error("Invalid Document: {message}")]
    InvalidDocument {
        /// InvalidDocument failure message
        message: String,
    },

    /// An objective or constraint could not be expanded into QUBO form.
    #[error("Expansion Error: {message}")]
    Expansion {
        /// Expansion failure message
        message: String,
    },

    /// The local solver could not produce an assignment.
    #[error("Solver Error: {message}")]
    Solver {
        /// Solver failure message
        message: String,
    },

    /// Process-wide settings were installed twice.
    #[error("Runtime already initialized")]
    AlreadyInitialized,

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigFileMissing {
        /// The path that was requested
        path: String,
    },

    /// A configuration source held a malformed value.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Submitting a document to the remote solver failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}
