//! Error types for CV Assistant.
//!
//! Library crates use [`CvAssistError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CV Assistant operations.
#[derive(Debug, thiserror::Error)]
pub enum CvAssistError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// An input file, job description, or mandatory template could not be found.
    #[error("{message}")]
    NotFound { message: String },

    /// The generative text service failed (transport, HTTP status, or empty reply).
    #[error("generative service error: {0}")]
    Service(String),

    /// Every PDF backend in the cascade failed.
    #[error("failed to generate PDF using any available method ({})", attempts.join("; "))]
    ConversionExhausted { attempts: Vec<String> },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A pipeline run failed after its inputs were resolved.
    #[error("Error during {pipeline}: {source}\nCheck log file for details: {}", log_file.display())]
    RunFailed {
        pipeline: String,
        log_file: PathBuf,
        #[source]
        source: Box<CvAssistError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CvAssistError>;

impl CvAssistError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a not-found error from any displayable message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error (or the error a failed run wraps) is a [`CvAssistError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RunFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The innermost error, looking through [`CvAssistError::RunFailed`] wrappers.
    pub fn root(&self) -> &CvAssistError {
        match self {
            Self::RunFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
