//! Named timeout tiers and retry counts.
//!
//! Every wait in the crate goes through a [`Tier`] looked up in a
//! [`TimeoutPolicy`]; literal millisecond values stay in this file.

use crate::result::{ErpError, ErpResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default polling interval for condition waits (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Delay after navigation before the page is considered settled
pub const SETTLE_DELAY_MS: u64 = 300;

/// Timeout tier label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Debounce and popover settling
    VeryShort,
    /// Single element state changes
    Short,
    /// Modals, notifications, dropdown lists
    Medium,
    /// Tables and page sections
    Standard,
    /// Navigation and heavy server operations
    Long,
}

impl Tier {
    /// All tiers, shortest first
    pub const ALL: [Self; 5] = [
        Self::VeryShort,
        Self::Short,
        Self::Medium,
        Self::Standard,
        Self::Long,
    ];

    /// Label used in logs and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryShort => "very_short",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Standard => "standard",
            Self::Long => "long",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duration (ms) per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutPolicy {
    /// VERY_SHORT tier
    pub very_short_ms: u64,
    /// SHORT tier
    pub short_ms: u64,
    /// MEDIUM tier
    pub medium_ms: u64,
    /// STANDARD tier
    pub standard_ms: u64,
    /// LONG tier
    pub long_ms: u64,
    /// Poll interval for condition waits
    pub poll_interval_ms: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            very_short_ms: 500,
            short_ms: 1_000,
            medium_ms: 3_000,
            standard_ms: 10_000,
            long_ms: 30_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl TimeoutPolicy {
    /// Milliseconds for a tier
    #[must_use]
    pub const fn ms(&self, tier: Tier) -> u64 {
        match tier {
            Tier::VeryShort => self.very_short_ms,
            Tier::Short => self.short_ms,
            Tier::Medium => self.medium_ms,
            Tier::Standard => self.standard_ms,
            Tier::Long => self.long_ms,
        }
    }

    /// Duration for a tier
    #[must_use]
    pub const fn get(&self, tier: Tier) -> Duration {
        Duration::from_millis(self.ms(tier))
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Scale every tier by `factor` (slow CI environments)
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        let scale = |ms: u64| ((ms as f64) * factor).round().max(1.0) as u64;
        self.very_short_ms = scale(self.very_short_ms);
        self.short_ms = scale(self.short_ms);
        self.medium_ms = scale(self.medium_ms);
        self.standard_ms = scale(self.standard_ms);
        self.long_ms = scale(self.long_ms);
        self
    }

    /// Check that tiers are strictly increasing and the poll interval is usable
    pub fn validate(&self) -> ErpResult<()> {
        for pair in Tier::ALL.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if self.ms(lo) >= self.ms(hi) {
                return Err(ErpError::ConfigError {
                    message: format!(
                        "timeout tier {lo} ({}ms) must be shorter than {hi} ({}ms)",
                        self.ms(lo),
                        self.ms(hi)
                    ),
                });
            }
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.very_short_ms {
            return Err(ErpError::ConfigError {
                message: format!(
                    "poll interval {}ms must be between 1 and the very_short tier ({}ms)",
                    self.poll_interval_ms, self.very_short_ms
                ),
            });
        }
        Ok(())
    }
}

/// Named retry counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryCounts {
    /// Notification polls after a submit
    pub notification_polls: u32,
    /// Upper bound on conflict-retry submissions
    pub conflict_attempts: u32,
    /// Attempts at opening a row popover
    pub popover_open: u32,
    /// Attempts at picking a dropdown option
    pub dropdown_select: u32,
}

impl Default for RetryCounts {
    fn default() -> Self {
        Self {
            notification_polls: 10,
            conflict_attempts: 100,
            popover_open: 3,
            dropdown_select: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_are_monotonic() {
        let policy = TimeoutPolicy::default();
        assert!(policy.validate().is_ok());
        for pair in Tier::ALL.windows(2) {
            assert!(policy.get(pair[0]) < policy.get(pair[1]));
        }
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let policy = TimeoutPolicy {
            medium_ms: 20_000,
            ..TimeoutPolicy::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("medium"));
    }

    #[test]
    fn test_equal_tiers_rejected() {
        let policy = TimeoutPolicy {
            short_ms: 500,
            ..TimeoutPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_poll_interval_bounds() {
        let zero = TimeoutPolicy {
            poll_interval_ms: 0,
            ..TimeoutPolicy::default()
        };
        assert!(zero.validate().is_err());

        let too_long = TimeoutPolicy {
            poll_interval_ms: 800,
            ..TimeoutPolicy::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_scaled_keeps_order() {
        let policy = TimeoutPolicy::default().scaled(2.5);
        assert_eq!(policy.ms(Tier::Short), 2_500);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::VeryShort.to_string(), "very_short");
        assert_eq!(Tier::Long.as_str(), "long");
        assert!(Tier::Short < Tier::Standard);
    }

    #[test]
    fn test_retry_defaults() {
        let counts = RetryCounts::default();
        assert_eq!(counts.notification_polls, 10);
        assert_eq!(counts.conflict_attempts, 100);
    }
}
