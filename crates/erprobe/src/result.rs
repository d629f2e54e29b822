//! Result and error types for erprobe.

use thiserror::Error;

/// Result type for erprobe operations
pub type ErpResult<T> = Result<T, ErpError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum ErpError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// An element never reached the required state within its timeout tier
    #[error("Timed out after {ms}ms waiting for {selector} to be {state}{context}")]
    LocatorTimeout {
        /// Selector that was being waited on
        selector: String,
        /// State that was required (visible, enabled, attached, ...)
        state: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Row/column context, pre-formatted as `" (row 3, column Qty)"` or empty
        context: String,
    },

    /// Generic operation timeout
    #[error("Operation timed out after {ms}ms: {what}")]
    Timeout {
        /// What was waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Script evaluation inside the page failed
    #[error("Script evaluation failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// A table cell did not have the expected shape
    #[error("Unexpected value {raw:?} in cell {cell} of row {row}: expected {expected}")]
    TableShape {
        /// Cell (column) name
        cell: String,
        /// Row identity (order number, name, index)
        row: String,
        /// Raw cell text
        raw: String,
        /// Description of the accepted format
        expected: String,
    },

    /// The conflict-retry loop ran out of candidates
    #[error("No free value for {field} after {attempts} attempts (last tried {last_value}): {message}")]
    ConflictExhausted {
        /// Field that kept conflicting
        field: String,
        /// Number of submissions made
        attempts: u32,
        /// Last candidate submitted
        last_value: u32,
        /// Diagnostic message
        message: String,
    },

    /// Cleanup refused to run against an unfiltered result set
    #[error("Cleanup for {prefix:?} aborted: {rows} rows listed before and after search (ceiling {ceiling})")]
    CleanupAborted {
        /// Prefix that was searched for
        prefix: String,
        /// Row count observed
        rows: usize,
        /// Configured ceiling
        ceiling: usize,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Soft assertions collected during a step failed
    #[error("{count} soft assertion(s) failed: {summary}")]
    SoftAssertionsFailed {
        /// Number of failures
        count: usize,
        /// Joined failure messages
        summary: String,
    },

    /// Scenario steps declared in an order that cannot be satisfied
    #[error("Step {step:?} requires {missing} which no earlier step produces")]
    ScenarioOrder {
        /// Step name
        step: String,
        /// Missing context key
        missing: String,
    },

    /// A scenario step finished without producing a declared output
    #[error("Step {step:?} did not produce {key}")]
    MissingOutput {
        /// Step name
        step: String,
        /// Context key that was declared
        key: String,
    },

    /// Fixture error (create/teardown failed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Configuration invalid
    #[error("Invalid configuration: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ErpError {
    /// Locator timeout without row/column context
    #[must_use]
    pub fn locator_timeout(selector: impl Into<String>, state: &str, ms: u64) -> Self {
        Self::LocatorTimeout {
            selector: selector.into(),
            state: state.to_string(),
            ms,
            context: String::new(),
        }
    }

    /// Attach row/column context to a locator timeout; other variants pass through
    #[must_use]
    pub fn with_context(self, ctx: impl AsRef<str>) -> Self {
        match self {
            Self::LocatorTimeout {
                selector,
                state,
                ms,
                context,
            } => Self::LocatorTimeout {
                selector,
                state,
                ms,
                context: if context.is_empty() {
                    format!(" ({})", ctx.as_ref())
                } else {
                    format!("{context} ({})", ctx.as_ref())
                },
            },
            other => other,
        }
    }

    /// Whether this error is a timeout of any kind
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::LocatorTimeout { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_timeout_message_names_selector() {
        let err = ErpError::locator_timeout("[data-testid=\"Users-Save\"]", "visible", 3000);
        let msg = err.to_string();
        assert!(msg.contains("Users-Save"));
        assert!(msg.contains("visible"));
        assert!(msg.contains("3000ms"));
    }

    #[test]
    fn test_with_context_appends_row_info() {
        let err = ErpError::locator_timeout("td.qty", "attached", 500).with_context("row 4, column Qty");
        assert!(err.to_string().ends_with("(row 4, column Qty)"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_with_context_ignores_other_variants() {
        let err = ErpError::PageError {
            message: "closed".into(),
        }
        .with_context("row 1");
        assert_eq!(err.to_string(), "Page error: closed");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_table_shape_message() {
        let err = ErpError::TableShape {
            cell: "Кол-во".into(),
            row: "order 1024".into(),
            raw: "abc".into(),
            expected: "N or N / M".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("order 1024"));
    }
}
