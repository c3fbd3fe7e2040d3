//! Error types for scorepull.
//!
//! Library crates use [`ScorePullError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all scorepull operations.
#[derive(Debug, thiserror::Error)]
pub enum ScorePullError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The request could not complete (connection failure, non-success status).
    #[error("network error: {0}")]
    Network(String),

    /// The response body is not the expected JSON envelope.
    #[error("decode error: {0}")]
    Decode(String),

    /// The output sink could not record or persist rows.
    #[error("write error: {0}")]
    Write(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad row offset, invalid setting, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScorePullError>;

impl ScorePullError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ScorePullError::config("concurrency must be at least 1");
        assert_eq!(err.to_string(), "config error: concurrency must be at least 1");

        let err = ScorePullError::Decode("expected value at line 1 column 1".into());
        assert!(err.to_string().starts_with("decode error:"));

        let err = ScorePullError::validation("row 0 is reserved for the header");
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn io_error_carries_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ScorePullError::io("/tmp/out.csv", source);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out.csv"));
        assert!(msg.contains("gone"));
    }
}
