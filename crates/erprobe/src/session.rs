//! One scenario's view of the application: the page, the configuration,
//! soft assertions and the artifacts of the step being run.

use crate::assertion::{AssertionFailure, SoftAssertions};
use crate::config::ErpConfig;
use crate::driver::PageDriver;
use crate::network::cross_check_count;
use crate::report::Artifacts;
use crate::result::ErpResult;
use crate::timeouts::{RetryCounts, TimeoutPolicy};
use crate::wait::Waiter;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Annotations and attachments gathered while a step runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepNotes {
    /// Free-form annotations
    pub annotations: Vec<String>,
    /// Screenshot paths
    pub attachments: Vec<PathBuf>,
    /// Soft assertion failures
    pub soft_failures: Vec<AssertionFailure>,
}

/// Page, configuration and per-step state shared by page objects
#[derive(Debug)]
pub struct Session {
    driver: Arc<dyn PageDriver>,
    config: ErpConfig,
    artifacts: Artifacts,
    soft: Mutex<SoftAssertions>,
    notes: Mutex<StepNotes>,
    highlight: bool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Session {
    /// Create a session over a page
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: ErpConfig) -> Self {
        let artifacts = Artifacts::new(config.artifacts_dir.clone());
        let highlight = config.browser.highlight_actions;
        Self {
            driver,
            config,
            artifacts,
            soft: Mutex::new(SoftAssertions::new()),
            notes: Mutex::new(StepNotes::default()),
            highlight,
        }
    }

    /// The page
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// Shared handle to the page
    #[must_use]
    pub fn driver_handle(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.driver)
    }

    /// Configuration
    #[must_use]
    pub const fn config(&self) -> &ErpConfig {
        &self.config
    }

    /// Timeout tiers
    #[must_use]
    pub const fn policy(&self) -> TimeoutPolicy {
        self.config.timeouts
    }

    /// Retry counts
    #[must_use]
    pub const fn retries(&self) -> RetryCounts {
        self.config.retries
    }

    /// Whether successful actions are outlined
    #[must_use]
    pub const fn highlights(&self) -> bool {
        self.highlight
    }

    /// Waiter bound to this page
    #[must_use]
    pub fn waiter(&self) -> Waiter<'_> {
        Waiter::new(self.driver(), self.config.timeouts)
    }

    /// Artifacts sink
    #[must_use]
    pub const fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Start collecting notes for a step
    pub fn begin_step(&self, name: &str) {
        *lock(&self.notes) = StepNotes::default();
        let mut soft = lock(&self.soft);
        soft.drain();
        soft.set_step(name);
    }

    /// Take everything collected since `begin_step`
    pub fn finish_step(&self) -> StepNotes {
        let mut notes = std::mem::take(&mut *lock(&self.notes));
        notes.soft_failures = lock(&self.soft).drain();
        notes
    }

    /// Fail the step if soft assertions failed so far
    pub fn verify_soft(&self) -> ErpResult<()> {
        lock(&self.soft).verify()
    }

    /// Add an annotation to the current step
    pub fn annotate(&self, note: impl Into<String>) {
        let note = note.into();
        tracing::info!(note = %note, "annotation");
        lock(&self.notes).annotations.push(note);
    }

    /// Screenshot the page into the artifacts directory and attach it to the step
    pub async fn screenshot(&self, label: &str) -> ErpResult<PathBuf> {
        let png = self.driver.screenshot().await?;
        let path = self.artifacts.save_screenshot(label, &png).await?;
        lock(&self.notes).attachments.push(path.clone());
        Ok(path)
    }

    async fn after_soft_failure(&self, label: &str) {
        match self.screenshot(label).await {
            Ok(path) => lock(&self.soft).attach_screenshot(path),
            Err(e) => tracing::warn!(error = %e, "could not capture soft-failure screenshot"),
        }
    }

    /// Soft-assert equality; a failure is screenshotted
    pub async fn soft_eq<T>(&self, actual: &T, expected: &T, message: &str) -> bool
    where
        T: PartialEq + Debug + Sync,
    {
        let ok = lock(&self.soft).assert_eq(actual, expected, message);
        if !ok {
            self.after_soft_failure(message).await;
        }
        ok
    }

    /// Soft-assert a condition; a failure is screenshotted
    pub async fn soft_true(&self, condition: bool, message: &str) -> bool {
        let ok = lock(&self.soft).assert_true(condition, message);
        if !ok {
            self.after_soft_failure(message).await;
        }
        ok
    }

    /// Soft-assert that UI and API agree on a count
    pub async fn soft_cross_check(&self, what: &str, ui: usize, api: usize) -> bool {
        let ok = cross_check_count(&mut lock(&self.soft), what, ui, api);
        if !ok {
            self.after_soft_failure(what).await;
        }
        ok
    }

    /// Number of soft failures in the current step
    #[must_use]
    pub fn soft_failure_count(&self) -> usize {
        lock(&self.soft).failure_count()
    }
}
