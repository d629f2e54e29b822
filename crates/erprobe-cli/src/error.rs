//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Suite ran and at least one step failed
    #[error("Suite {suite} failed: {failed} step(s) failed, {skipped} skipped")]
    SuiteFailed {
        /// Suite name
        suite: String,
        /// Failed steps
        failed: usize,
        /// Skipped steps
        skipped: usize,
    },

    /// Cleanup left rows behind
    #[error("Cleanup incomplete: {failed} row(s) could not be archived")]
    CleanupIncomplete {
        /// Rows that failed
        failed: usize,
    },

    /// Logging could not be initialised
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// erprobe library error
    #[error("erprobe error: {0}")]
    Erp(#[from] erprobe::ErpError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_suite_failed_message() {
        let err = CliError::SuiteFailed {
            suite: "production-cycle".into(),
            failed: 1,
            skipped: 3,
        };
        assert_eq!(
            err.to_string(),
            "Suite production-cycle failed: 1 step(s) failed, 3 skipped"
        );
    }

    #[test]
    fn test_erp_error_from() {
        let erp = erprobe::ErpError::ConfigError {
            message: "unknown suite".into(),
        };
        let cli: CliError = erp.into();
        assert!(cli.to_string().contains("unknown suite"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
