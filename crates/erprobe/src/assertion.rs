//! Soft assertions.
//!
//! Checks that should not stop a scenario (a count that drifted, an input
//! that did not echo its value) are collected here and turned into one
//! `SoftAssertionsFailed` error when the step finishes. Each failure can
//! carry the path of a screenshot taken when it was recorded.

use crate::result::{ErpError, ErpResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;

/// A single assertion failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Message describing the failure
    pub message: String,
    /// Step that was running
    pub step: Option<String>,
    /// Screenshot captured for this failure
    pub screenshot: Option<PathBuf>,
    /// Index of this failure in the sequence
    pub index: usize,
}

impl AssertionFailure {
    /// Create a new assertion failure
    #[must_use]
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            step: None,
            screenshot: None,
            index,
        }
    }
}

/// Soft assertions collector
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    assertion_count: usize,
    step: Option<String>,
}

impl SoftAssertions {
    /// Create a new collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Label subsequent failures with a step name
    pub fn set_step(&mut self, step: impl Into<String>) {
        self.step = Some(step.into());
    }

    /// Assert two values are equal, returning whether they were
    pub fn assert_eq<T: PartialEq + Debug>(&mut self, actual: &T, expected: &T, message: &str) -> bool {
        self.assertion_count += 1;
        if actual == expected {
            return true;
        }
        self.record_failure(format!("{message}: expected {expected:?}, got {actual:?}"));
        false
    }

    /// Assert a condition is true
    pub fn assert_true(&mut self, condition: bool, message: &str) -> bool {
        self.assertion_count += 1;
        if !condition {
            self.record_failure(format!("{message}: expected true, got false"));
        }
        condition
    }

    /// Assert a string contains a substring
    pub fn assert_contains(&mut self, haystack: &str, needle: &str, message: &str) -> bool {
        self.assertion_count += 1;
        let ok = haystack.contains(needle);
        if !ok {
            self.record_failure(format!("{message}: expected '{haystack}' to contain '{needle}'"));
        }
        ok
    }

    /// Record a custom failure
    pub fn fail(&mut self, message: impl Into<String>) {
        self.assertion_count += 1;
        self.record_failure(message.into());
    }

    fn record_failure(&mut self, message: String) {
        tracing::warn!(step = self.step.as_deref().unwrap_or("-"), "soft assertion failed: {message}");
        let mut failure = AssertionFailure::new(message, self.failures.len());
        failure.step.clone_from(&self.step);
        self.failures.push(failure);
    }

    /// Attach a screenshot path to the most recent failure
    pub fn attach_screenshot(&mut self, path: PathBuf) {
        if let Some(last) = self.failures.last_mut() {
            last.screenshot = Some(path);
        }
    }

    /// All failures
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Number of failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total assertions checked
    #[must_use]
    pub const fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Check if all assertions passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Verify all assertions passed
    ///
    /// # Errors
    ///
    /// `SoftAssertionsFailed` with every message joined
    pub fn verify(&self) -> ErpResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(ErpError::SoftAssertionsFailed {
            count: self.failures.len(),
            summary: self
                .failures
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    /// Remove and return every failure, resetting the counters
    pub fn drain(&mut self) -> Vec<AssertionFailure> {
        self.assertion_count = 0;
        std::mem::take(&mut self.failures)
    }

    /// Summary counts
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        AssertionSummary {
            total: self.assertion_count,
            passed: self.assertion_count - self.failures.len(),
            failed: self.failures.len(),
        }
    }
}

/// Summary of assertion results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Total assertions checked
    pub total: usize,
    /// Assertions that passed
    pub passed: usize,
    /// Assertions that failed
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_without_stopping() {
        let mut soft = SoftAssertions::new();
        assert!(!soft.assert_eq(&1, &2, "count"));
        assert!(soft.assert_true(true, "flag"));
        assert!(!soft.assert_contains("ERPTEST_USER", "MATERIAL", "name"));
        assert_eq!(soft.failure_count(), 2);
        assert_eq!(
            soft.summary(),
            AssertionSummary {
                total: 3,
                passed: 1,
                failed: 2
            }
        );
    }

    #[test]
    fn test_verify_joins_messages() {
        let mut soft = SoftAssertions::new();
        soft.assert_eq(&"5".to_string(), &"4".to_string(), "quantity echo");
        soft.fail("stock mismatch");
        let err = soft.verify().unwrap_err();
        match err {
            ErpError::SoftAssertionsFailed { count, summary } => {
                assert_eq!(count, 2);
                assert!(summary.contains("quantity echo"));
                assert!(summary.contains("stock mismatch"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_step_label_and_screenshot() {
        let mut soft = SoftAssertions::new();
        soft.set_step("receive-stock");
        soft.fail("qty");
        soft.attach_screenshot(PathBuf::from("shots/1.png"));
        let f = &soft.failures()[0];
        assert_eq!(f.step.as_deref(), Some("receive-stock"));
        assert_eq!(f.screenshot.as_deref(), Some(std::path::Path::new("shots/1.png")));
    }

    #[test]
    fn test_drain_resets() {
        let mut soft = SoftAssertions::new();
        soft.fail("x");
        assert_eq!(soft.drain().len(), 1);
        assert!(soft.all_passed());
        assert!(soft.verify().is_ok());
        assert_eq!(soft.assertion_count(), 0);
    }
}
