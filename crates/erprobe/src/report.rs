//! Run report: per-step results, annotations and screenshot attachments,
//! written as JSON into the artifacts directory.

use crate::assertion::AssertionFailure;
use crate::cleanup::CleanupReport;
use crate::result::ErpResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Step result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step passed
    Passed,
    /// Step failed
    Failed,
    /// Step not run because an earlier step failed
    Skipped,
}

impl StepStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Result of one scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// Status
    pub status: StepStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Error message if failed
    pub error: Option<String>,
    /// Free-form annotations (created names, counts, order numbers)
    pub annotations: Vec<String>,
    /// Screenshot paths
    pub attachments: Vec<PathBuf>,
    /// Soft assertion failures recorded during the step
    pub soft_failures: Vec<AssertionFailure>,
}

impl StepRecord {
    /// Create a passing record
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Passed,
            duration_ms: duration.as_millis() as u64,
            error: None,
            annotations: Vec::new(),
            attachments: Vec::new(),
            soft_failures: Vec::new(),
        }
    }

    /// Create a failing record
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            error: Some(error.into()),
            ..Self::passed(name, duration)
        }
    }

    /// Create a skipped record
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            ..Self::passed(name, Duration::ZERO)
        }
    }
}

/// Summary counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Passed steps
    pub passed: usize,
    /// Failed steps
    pub failed: usize,
    /// Skipped steps
    pub skipped: usize,
    /// Soft assertion failures across all steps
    pub soft_failures: usize,
}

/// Report of one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// Environment name
    pub environment: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: Option<DateTime<Utc>>,
    /// Step records in execution order
    pub steps: Vec<StepRecord>,
    /// Cleanup results, when teardown ran
    pub cleanup: Vec<CleanupReport>,
}

impl RunReport {
    /// Start a report
    #[must_use]
    pub fn new(suite: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.into(),
            environment: environment.into(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            cleanup: Vec::new(),
        }
    }

    /// Append a step record
    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    /// Mark the run finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Summary counts
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        self.steps.iter().fold(ReportSummary::default(), |mut acc, s| {
            match s.status {
                StepStatus::Passed => acc.passed += 1,
                StepStatus::Failed => acc.failed += 1,
                StepStatus::Skipped => acc.skipped += 1,
            }
            acc.soft_failures += s.soft_failures.len();
            acc
        })
    }

    /// Every step passed and every cleanup was clean
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_passed()) && self.cleanup.iter().all(CleanupReport::is_clean)
    }

    /// File name of the JSON report
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.suite, self.run_id)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> ErpResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report into `dir`, returning the file path
    pub async fn write_to(&self, dir: &Path) -> ErpResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, self.to_json()?).await?;
        tracing::info!(path = %path.display(), "run report written");
        Ok(path)
    }
}

/// Screenshot sink in the artifacts directory
#[derive(Debug)]
pub struct Artifacts {
    dir: PathBuf,
    seq: AtomicU32,
}

impl Artifacts {
    /// Use `dir` (created on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU32::new(0),
        }
    }

    /// Artifacts directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save PNG bytes as `NNN-<label>.png`
    pub async fn save_screenshot(&self, label: &str, png: &[u8]) -> ErpResult<PathBuf> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let shots = self.dir.join("screenshots");
        tokio::fs::create_dir_all(&shots).await?;
        let path = shots.join(format!("{n:03}-{}.png", slug(label)));
        tokio::fs::write(&path, png).await?;
        Ok(path)
    }
}

fn slug(label: &str) -> String {
    let s: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let trimmed = s.trim_matches('-');
    if trimmed.is_empty() {
        "shot".to_string()
    } else {
        trimmed.to_string()
    }
}
