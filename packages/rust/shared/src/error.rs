//! Error types for Scorecard.
//!
//! Library crates use [`ScorecardError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! `Display` carries the diagnostic cause and is meant for logs. Anything
//! shown to an end user goes through [`ScorecardError::user_message`].

use std::path::PathBuf;

/// Generic message shown for any failure the user cannot act on directly.
const TRY_AGAIN: &str = "Failed to analyze meeting notes. Please try again.";

/// Top-level error type for all Scorecard operations.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input rejected before any work started (e.g. blank notes).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Network-level failure talking to the analysis service.
    ///
    /// Transient: the transport retries these internally.
    #[error("network error: {0}")]
    Network(String),

    /// The analysis service answered with a non-success status.
    #[error("analysis service returned HTTP {status}")]
    Http { status: u16, body: String },

    /// The analysis could not be completed after the transport gave up.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// Response body could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or persistence layer error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A stored record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An analysis is already in flight.
    #[error("an analysis is already in progress")]
    Busy,

    /// The in-flight analysis was invalidated by `clear` or a mode switch.
    #[error("analysis result discarded")]
    Discarded,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScorecardError>;

impl ScorecardError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a persistence error from any displayable value.
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the transport should retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// A message safe to show an end user. Never includes raw service output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { .. } => "Please enter some meeting notes to analyze.".into(),
            Self::Busy => "An analysis is already running. Please wait for it to finish.".into(),
            Self::NotFound { entity, .. } => format!("The requested {entity} could not be found."),
            Self::Persistence(_) => "Failed to save the analysis. Please try again.".into(),
            Self::Config { .. } => "Scorecard is not configured correctly.".into(),
            _ => TRY_AGAIN.into(),
        }
    }
}
