//! Prefix-based cleanup of test fixtures.
//!
//! Every fixture the suite creates carries a known prefix. Teardown
//! searches a list page for that prefix and archives the matching rows
//! one at a time. Two guards keep this from touching real data:
//!
//! - If the search did not filter (the row count is above the ceiling and
//!   unchanged by the search), the run aborts before archiving anything.
//! - Each row's text is re-read and must contain the prefix (and one of
//!   the explicit names, when given) right before it is archived.

use crate::result::{ErpError, ErpResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of rows a filtered search may still show
pub const DEFAULT_ROW_CEILING: usize = 50;

/// Cleanup limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupPolicy {
    /// Rows above which an unchanged count means the search did not filter
    pub row_ceiling: usize,
    /// Polls for the archive control to become enabled
    pub enable_retries: u32,
    /// Delay between enable polls (ms)
    pub enable_interval_ms: u64,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            row_ceiling: DEFAULT_ROW_CEILING,
            enable_retries: 5,
            enable_interval_ms: 200,
        }
    }
}

impl CleanupPolicy {
    /// Reject unusable limits
    pub fn validate(&self) -> ErpResult<()> {
        if self.row_ceiling == 0 {
            return Err(ErpError::ConfigError {
                message: "cleanup row_ceiling must be greater than 0".into(),
            });
        }
        if self.enable_retries == 0 {
            return Err(ErpError::ConfigError {
                message: "cleanup enable_retries must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// Which rows to archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupTarget {
    prefix: String,
    names: Vec<String>,
}

impl CleanupTarget {
    /// Every row containing `prefix`
    pub fn prefix(prefix: impl Into<String>) -> ErpResult<Self> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(ErpError::FixtureError {
                message: "cleanup prefix must not be empty".into(),
            });
        }
        Ok(Self {
            prefix,
            names: Vec::new(),
        })
    }

    /// Only rows containing one of `names`, each of which must start with `prefix`
    pub fn names(prefix: impl Into<String>, names: Vec<String>) -> ErpResult<Self> {
        let target = Self::prefix(prefix)?;
        if let Some(bad) = names.iter().find(|n| !n.starts_with(&target.prefix)) {
            return Err(ErpError::FixtureError {
                message: format!("{bad:?} does not start with cleanup prefix {:?}", target.prefix),
            });
        }
        Ok(Self { names, ..target })
    }

    /// Search prefix
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.prefix
    }

    /// Explicit names, empty for prefix-only cleanup
    #[must_use]
    pub fn explicit_names(&self) -> &[String] {
        &self.names
    }

    /// Per-row guard
    #[must_use]
    pub fn matches(&self, row_text: &str) -> bool {
        row_text.contains(self.prefix.as_str())
            && (self.names.is_empty() || self.names.iter().any(|n| row_text.contains(n.as_str())))
    }
}

/// A list page whose rows can be searched and archived
///
/// Row indices are positions in the currently rendered (filtered) list.
#[async_trait]
pub trait ArchiveTable: Send + Sync {
    /// Rendered data rows
    async fn row_count(&self) -> ErpResult<usize>;
    /// Type `text` into the list search and wait for the list to settle
    async fn search(&self, text: &str) -> ErpResult<()>;
    /// Full text of a row
    async fn row_text(&self, row: usize) -> ErpResult<String>;
    /// Select a row (checkbox or row click)
    async fn select_row(&self, row: usize) -> ErpResult<()>;
    /// Whether the archive control is enabled
    async fn archive_enabled(&self) -> ErpResult<bool>;
    /// Click the archive control
    async fn open_archive(&self) -> ErpResult<()>;
    /// Confirm the archive modal and wait for it to close
    async fn confirm_archive(&self) -> ErpResult<()>;
}

/// Row that could not be archived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRow {
    /// Row text
    pub text: String,
    /// Error message
    pub reason: String,
}

/// Result of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Row texts archived
    pub archived: Vec<String>,
    /// Row texts skipped by the row guard
    pub skipped: Vec<String>,
    /// Rows whose archive failed
    pub failed: Vec<FailedRow>,
}

impl CleanupReport {
    /// No row failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Prefix cleanup driver
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixCleanup {
    policy: CleanupPolicy,
}

impl PrefixCleanup {
    /// Create with limits
    #[must_use]
    pub const fn new(policy: CleanupPolicy) -> Self {
        Self { policy }
    }

    /// Archive every row matching `target`
    ///
    /// Returns `CleanupAborted` before any destructive action when the
    /// search did not filter the list. Per-row archive errors are recorded
    /// in the report; search and count errors propagate.
    pub async fn run(&self, table: &dyn ArchiveTable, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        let prefix = target.search_text();
        let before = table.row_count().await?;
        table.search(prefix).await?;
        let after = table.row_count().await?;
        tracing::info!(prefix, before, after, "cleanup search");

        if after > self.policy.row_ceiling && after == before {
            tracing::error!(prefix, rows = after, ceiling = self.policy.row_ceiling, "search did not filter, aborting cleanup");
            return Err(ErpError::CleanupAborted {
                prefix: prefix.to_string(),
                rows: after,
                ceiling: self.policy.row_ceiling,
            });
        }

        let mut report = CleanupReport::default();
        if after == 0 {
            tracing::info!(prefix, "nothing to clean up");
            return Ok(report);
        }

        // Bottom-up so archiving a row does not shift the ones still to visit.
        for row in (0..after).rev() {
            let text = match table.row_text(row).await {
                Ok(text) => text,
                Err(e) => {
                    report.failed.push(FailedRow {
                        text: format!("row {row}"),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !target.matches(&text) {
                tracing::info!(row, text = %text, "row does not match cleanup target, skipping");
                report.skipped.push(text);
                continue;
            }
            match self.archive_row(table, row).await {
                Ok(()) => {
                    tracing::info!(row, text = %text, "archived");
                    report.archived.push(text);
                }
                Err(e) => {
                    tracing::warn!(row, text = %text, error = %e, "archive failed");
                    report.failed.push(FailedRow {
                        text,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn archive_row(&self, table: &dyn ArchiveTable, row: usize) -> ErpResult<()> {
        table.select_row(row).await?;
        let mut enabled = false;
        for attempt in 0..self.policy.enable_retries {
            if table.archive_enabled().await? {
                enabled = true;
                break;
            }
            tracing::debug!(row, attempt, "archive control not enabled yet");
            tokio::time::sleep(Duration::from_millis(self.policy.enable_interval_ms)).await;
        }
        if !enabled {
            return Err(ErpError::locator_timeout(
                "archive control",
                "enabled",
                u64::from(self.policy.enable_retries) * self.policy.enable_interval_ms,
            )
            .with_context(format!("row {row}")));
        }
        table.open_archive().await?;
        table.confirm_archive().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory list page; archived rows disappear
    #[derive(Debug, Default)]
    struct FakeTable {
        all: Mutex<Vec<String>>,
        filter: Mutex<Option<String>>,
        selected: Mutex<Option<usize>>,
        search_ignored: bool,
        stuck_disabled: Vec<String>,
        confirmations: Mutex<u32>,
    }

    impl FakeTable {
        fn with_rows(rows: &[&str]) -> Self {
            Self {
                all: Mutex::new(rows.iter().map(ToString::to_string).collect()),
                ..Self::default()
            }
        }

        fn visible(&self) -> Vec<String> {
            let filter = self.filter.lock().unwrap().clone();
            self.all
                .lock()
                .unwrap()
                .iter()
                .filter(|r| filter.as_ref().map_or(true, |f| r.contains(f.as_str())))
                .cloned()
                .collect()
        }

        fn remaining(&self) -> Vec<String> {
            self.all.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArchiveTable for FakeTable {
        async fn row_count(&self) -> ErpResult<usize> {
            Ok(self.visible().len())
        }

        async fn search(&self, text: &str) -> ErpResult<()> {
            if !self.search_ignored {
                *self.filter.lock().unwrap() = Some(text.to_string());
            }
            Ok(())
        }

        async fn row_text(&self, row: usize) -> ErpResult<String> {
            self.visible()
                .get(row)
                .cloned()
                .ok_or_else(|| ErpError::PageError {
                    message: format!("row {row} missing"),
                })
        }

        async fn select_row(&self, row: usize) -> ErpResult<()> {
            *self.selected.lock().unwrap() = Some(row);
            Ok(())
        }

        async fn archive_enabled(&self) -> ErpResult<bool> {
            let Some(row) = *self.selected.lock().unwrap() else {
                return Ok(false);
            };
            let text = self.visible().get(row).cloned().unwrap_or_default();
            Ok(!self.stuck_disabled.contains(&text))
        }

        async fn open_archive(&self) -> ErpResult<()> {
            Ok(())
        }

        async fn confirm_archive(&self) -> ErpResult<()> {
            let row = self.selected.lock().unwrap().take().unwrap();
            let text = self.visible()[row].clone();
            self.all.lock().unwrap().retain(|r| *r != text);
            *self.confirmations.lock().unwrap() += 1;
            Ok(())
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn test_prefix_guard() {
            let t = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            assert!(t.matches("ERPTEST_MATERIAL_17 | кг"));
            assert!(!t.matches("Steel sheet"));
        }

        #[test]
        fn test_names_guard() {
            let t = CleanupTarget::names("ERPTEST_MATERIAL", vec!["ERPTEST_MATERIAL_1".into()]).unwrap();
            assert!(t.matches("ERPTEST_MATERIAL_1"));
            assert!(!t.matches("ERPTEST_MATERIAL_2"));
        }

        #[test]
        fn test_name_outside_prefix_rejected() {
            assert!(CleanupTarget::names("ERPTEST_MATERIAL", vec!["Steel".into()]).is_err());
        }

        #[test]
        fn test_empty_prefix_rejected() {
            assert!(CleanupTarget::prefix("  ").is_err());
        }

        #[test]
        fn test_policy_validation() {
            assert!(CleanupPolicy::default().validate().is_ok());
            let zero = CleanupPolicy {
                row_ceiling: 0,
                ..CleanupPolicy::default()
            };
            assert!(zero.validate().is_err());
        }
    }

    mod run_tests {
        use super::*;

        fn cleanup() -> PrefixCleanup {
            PrefixCleanup::new(CleanupPolicy {
                enable_interval_ms: 10,
                ..CleanupPolicy::default()
            })
        }

        #[tokio::test(start_paused = true)]
        async fn test_archives_only_matching_rows() {
            let table = FakeTable::with_rows(&["ERPTEST_MATERIAL_1", "Steel", "ERPTEST_MATERIAL_2"]);
            let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            let report = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(report.archived, vec!["ERPTEST_MATERIAL_2", "ERPTEST_MATERIAL_1"]);
            assert!(report.is_clean());
            assert_eq!(table.remaining(), vec!["Steel"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_matches_is_success() {
            let table = FakeTable::with_rows(&["Steel", "Copper"]);
            let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            let report = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(report, CleanupReport::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_idempotent() {
            let table = FakeTable::with_rows(&["ERPTEST_ORDER_1", "ERPTEST_ORDER_2", "Real order"]);
            let target = CleanupTarget::prefix("ERPTEST_ORDER").unwrap();
            let first = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(first.archived.len(), 2);
            let second = cleanup().run(&table, &target).await.unwrap();
            assert!(second.archived.is_empty());
            assert!(second.failed.is_empty());
            assert_eq!(table.remaining(), vec!["Real order"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_aborts_when_search_does_not_filter() {
            let rows: Vec<String> = (0..120).map(|i| format!("Customer material {i}")).collect();
            let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
            let table = FakeTable {
                search_ignored: true,
                ..FakeTable::with_rows(&refs)
            };
            let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            let err = cleanup().run(&table, &target).await.unwrap_err();
            assert!(matches!(err, ErpError::CleanupAborted { rows: 120, ceiling: 50, .. }));
            assert_eq!(*table.confirmations.lock().unwrap(), 0);
            assert_eq!(table.remaining().len(), 120);
        }

        #[tokio::test(start_paused = true)]
        async fn test_small_unfiltered_list_uses_row_guard() {
            let table = FakeTable {
                search_ignored: true,
                ..FakeTable::with_rows(&["Steel", "ERPTEST_MATERIAL_9"])
            };
            let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            let report = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(report.archived, vec!["ERPTEST_MATERIAL_9"]);
            assert_eq!(report.skipped, vec!["Steel"]);
        }

        #[derive(Clone, Default)]
        struct LogBuffer(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for LogBuffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_skipped_row_logged_at_info() {
            let logs = LogBuffer::default();
            let writer = logs.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            let _guard = tracing::subscriber::set_default(subscriber);

            let table = FakeTable {
                search_ignored: true,
                ..FakeTable::with_rows(&["Steel", "ERPTEST_MATERIAL_9"])
            };
            let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
            cleanup().run(&table, &target).await.unwrap();

            let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
            let line = output
                .lines()
                .find(|l| l.contains("does not match cleanup target"))
                .unwrap();
            assert!(line.contains("INFO"));
            assert!(line.contains("Steel"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stuck_archive_control_recorded_as_failed() {
            let table = FakeTable {
                stuck_disabled: vec!["ERPTEST_EQUIPMENT_2".into()],
                ..FakeTable::with_rows(&["ERPTEST_EQUIPMENT_1", "ERPTEST_EQUIPMENT_2"])
            };
            let target = CleanupTarget::prefix("ERPTEST_EQUIPMENT").unwrap();
            let report = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(report.archived, vec!["ERPTEST_EQUIPMENT_1"]);
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].text, "ERPTEST_EQUIPMENT_2");
            assert!(report.failed[0].reason.contains("row 1"));
            assert!(!report.is_clean());
        }

        #[tokio::test(start_paused = true)]
        async fn test_explicit_names_only() {
            let table = FakeTable::with_rows(&["ERPTEST_USER_1", "ERPTEST_USER_2"]);
            let target = CleanupTarget::names("ERPTEST_USER", vec!["ERPTEST_USER_2".into()]).unwrap();
            let report = cleanup().run(&table, &target).await.unwrap();
            assert_eq!(report.archived, vec!["ERPTEST_USER_2"]);
            assert_eq!(report.skipped, vec!["ERPTEST_USER_1"]);
        }
    }
}
