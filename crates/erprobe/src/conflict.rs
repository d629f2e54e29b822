//! Conflict-retry loop for forms that need a unique number.
//!
//! The application assigns nothing itself: the test picks a candidate
//! (for example a personnel table number), submits, and reads the
//! notification. A conflict means the value is taken and the next
//! candidate is exactly one lower. Per attempt:
//!
//! ```text
//! Idle ──prepare(v)──► Submitted ──observe──┬─► Succeeded        (stop)
//!                                           ├─► ConflictDetected  (v - 1)
//!                                           └─► UnknownFailure    (v - 1, WARN)
//! ```
//!
//! The loop stops on success, after `max_attempts` submissions, or when
//! the candidate reaches zero.

use crate::notification::ConflictMatcher;
use crate::result::{ErpError, ErpResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// State of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptState {
    /// Candidate chosen, fields being populated
    Idle,
    /// Primary action clicked, notification being polled
    Submitted,
    /// Form closed with no conflict text
    Succeeded,
    /// Notification reported the value as taken
    ConflictDetected,
    /// Form still open and nothing recognisable was reported
    UnknownFailure,
}

impl AttemptState {
    /// Whether this state ends the loop
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// What the page showed after a submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Notification text, if any appeared while polling
    pub notification: Option<String>,
    /// Whether the form is still open
    pub form_open: bool,
}

/// Classify an observation into one of the post-submit states
#[must_use]
pub fn classify_attempt(observation: &Observation, matcher: &ConflictMatcher) -> AttemptState {
    let conflict = observation
        .notification
        .as_deref()
        .is_some_and(|text| matcher.is_conflict(text));
    if conflict {
        AttemptState::ConflictDetected
    } else if observation.form_open {
        AttemptState::UnknownFailure
    } else {
        AttemptState::Succeeded
    }
}

/// A form that can be filled with a candidate and submitted
#[async_trait]
pub trait ConflictSubmission: Send {
    /// Populate the form for `candidate` (Idle)
    async fn prepare(&mut self, candidate: u32) -> ErpResult<()>;

    /// Click the primary action and observe the result (Submitted)
    async fn submit(&mut self) -> ErpResult<Observation>;
}

/// One submission made by the loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Candidate submitted
    pub candidate: u32,
    /// Classified state
    pub state: AttemptState,
    /// Notification captured
    pub notification: Option<String>,
}

/// Result of a conflict-retry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictOutcome {
    /// Whether a submission succeeded
    pub success: bool,
    /// Value that succeeded
    pub used_value: Option<u32>,
    /// Last value submitted
    pub last_value: Option<u32>,
    /// Submissions made
    pub attempts: u32,
    /// Attempts classified as `UnknownFailure`
    pub unknown_failures: u32,
    /// Per-attempt history, in submission order
    pub history: Vec<AttemptRecord>,
    /// Diagnostic message
    pub message: String,
}

impl ConflictOutcome {
    /// Turn an unsuccessful outcome into `ConflictExhausted`
    pub fn into_value(self, field: &str) -> ErpResult<u32> {
        match (self.success, self.used_value) {
            (true, Some(v)) => Ok(v),
            _ => Err(ErpError::ConflictExhausted {
                field: field.to_string(),
                attempts: self.attempts,
                last_value: self.last_value.unwrap_or(0),
                message: self.message,
            }),
        }
    }
}

/// Descending-candidate retry loop
#[derive(Debug, Clone)]
pub struct ConflictRetry {
    matcher: ConflictMatcher,
    max_attempts: u32,
}

impl ConflictRetry {
    /// Create a loop with a submission bound
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            matcher: ConflictMatcher::default(),
            max_attempts,
        }
    }

    /// Use a different conflict keyword set
    #[must_use]
    pub fn with_matcher(mut self, matcher: ConflictMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Run the loop from `start`
    ///
    /// Driver errors from the submission abort the loop and propagate.
    pub async fn run<S>(&self, field: &str, start: u32, submission: &mut S) -> ErpResult<ConflictOutcome>
    where
        S: ConflictSubmission + ?Sized,
    {
        let mut candidate = start;
        let mut history = Vec::new();
        let mut unknown_failures = 0;

        while (history.len() as u32) < self.max_attempts && candidate > 0 {
            let attempt = history.len() as u32 + 1;
            tracing::debug!(field, candidate, attempt, "preparing submission");
            submission.prepare(candidate).await?;
            let observation = submission.submit().await?;
            let state = classify_attempt(&observation, &self.matcher);
            history.push(AttemptRecord {
                candidate,
                state,
                notification: observation.notification.clone(),
            });

            match state {
                AttemptState::Succeeded => {
                    tracing::info!(field, candidate, attempt, "submission accepted");
                    return Ok(ConflictOutcome {
                        success: true,
                        used_value: Some(candidate),
                        last_value: Some(candidate),
                        attempts: attempt,
                        unknown_failures,
                        history,
                        message: format!("{field} {candidate} accepted after {attempt} attempt(s)"),
                    });
                }
                AttemptState::ConflictDetected => {
                    tracing::info!(field, candidate, attempt, "value taken, trying next lower");
                }
                _ => {
                    unknown_failures += 1;
                    tracing::warn!(
                        field,
                        candidate,
                        attempt,
                        notification = observation.notification.as_deref().unwrap_or("<none>"),
                        "form still open without a conflict message"
                    );
                }
            }
            candidate -= 1;
        }

        let attempts = history.len() as u32;
        let last_value = history.last().map(|r| r.candidate);
        let reason = if candidate == 0 {
            "candidates exhausted at 0"
        } else {
            "attempt limit reached"
        };
        let message = format!(
            "{field}: {reason} after {attempts} attempt(s), {unknown_failures} without a recognisable notification"
        );
        tracing::error!(field, attempts, ?last_value, "{message}");
        Ok(ConflictOutcome {
            success: false,
            used_value: None,
            last_value,
            attempts,
            unknown_failures,
            history,
            message,
        })
    }
}
