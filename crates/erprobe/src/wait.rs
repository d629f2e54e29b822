//! Wait mechanisms.
//!
//! The driver's own actionability checks are not enough for this
//! application: popovers animate into position, inputs debounce a server
//! call, and tables re-render after every filter. Every wait here polls a
//! condition under a timeout taken from a [`Tier`] and fails with the
//! selector it was waiting on.

use crate::driver::{ElementState, PageDriver};
use crate::locator::Locator;
use crate::result::{ErpError, ErpResult};
use crate::timeouts::{Tier, TimeoutPolicy};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of condition checks made
    pub polls: u32,
}

/// Poll `check` until it returns `true` or `timeout` elapses.
///
/// The condition is always checked at least once. Errors from the
/// condition abort the wait immediately.
pub async fn wait_for<F, Fut>(
    what: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut check: F,
) -> ErpResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ErpResult<bool>>,
{
    let start = Instant::now();
    let mut polls = 0;
    loop {
        polls += 1;
        if check().await? {
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                polls,
            });
        }
        if start.elapsed() >= timeout {
            return Err(ErpError::Timeout {
                what: what.to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Element-state waits bound to a page and a timeout policy
#[derive(Debug, Clone, Copy)]
pub struct Waiter<'a> {
    driver: &'a dyn PageDriver,
    policy: TimeoutPolicy,
}

impl<'a> Waiter<'a> {
    /// Create a waiter
    #[must_use]
    pub const fn new(driver: &'a dyn PageDriver, policy: TimeoutPolicy) -> Self {
        Self { driver, policy }
    }

    /// Timeout policy in use
    #[must_use]
    pub const fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    async fn until_state<P>(&self, locator: &Locator, tier: Tier, state: &str, pred: P) -> ErpResult<ElementState>
    where
        P: Fn(&ElementState) -> bool,
    {
        let timeout = self.policy.get(tier);
        let start = Instant::now();
        loop {
            if let Some(current) = self.driver.element_state(locator).await? {
                if pred(&current) {
                    return Ok(current);
                }
            }
            if start.elapsed() >= timeout {
                tracing::debug!(selector = %locator, state, tier = %tier, "wait timed out");
                return Err(ErpError::locator_timeout(
                    locator.to_string(),
                    state,
                    self.policy.ms(tier),
                ));
            }
            tokio::time::sleep(self.policy.poll_interval()).await;
        }
    }

    /// Wait until the element is attached
    pub async fn attached(&self, locator: &Locator) -> ErpResult<ElementState> {
        self.until_state(locator, locator.tier(), "attached", |_| true)
            .await
    }

    /// Wait until the element is visible
    pub async fn visible(&self, locator: &Locator) -> ErpResult<ElementState> {
        self.until_state(locator, locator.tier(), "visible", |s| s.visible)
            .await
    }

    /// Wait until the element is visible and enabled
    pub async fn actionable(&self, locator: &Locator) -> ErpResult<ElementState> {
        self.until_state(locator, locator.tier(), "visible and enabled", |s| {
            s.visible && s.enabled
        })
        .await
    }

    /// Wait until the element is detached or hidden
    pub async fn hidden(&self, locator: &Locator) -> ErpResult<()> {
        let driver = self.driver;
        wait_for(
            &format!("{locator} to be hidden"),
            self.policy.get(locator.tier()),
            self.policy.poll_interval(),
            || async move {
                Ok(driver
                    .element_state(locator)
                    .await?
                    .map_or(true, |s| !s.visible))
            },
        )
        .await
        .map(|_| ())
        .map_err(|e| match e {
            ErpError::Timeout { ms, .. } => ErpError::locator_timeout(locator.to_string(), "hidden", ms),
            other => other,
        })
    }

    /// Whether the element becomes visible within a tier, without failing
    pub async fn is_visible_within(&self, locator: &Locator, tier: Tier) -> ErpResult<bool> {
        match self.until_state(locator, tier, "visible", |s| s.visible).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Sleep for a tier (settle delays after animations)
    pub async fn settle(&self, tier: Tier) {
        tokio::time::sleep(self.policy.get(tier)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};
    use crate::locator::Selector;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_load_state_event_names() {
            assert_eq!(LoadState::Load.event_name(), "load");
            assert_eq!(LoadState::DomContentLoaded.event_name(), "DOMContentLoaded");
            assert_eq!(LoadState::NetworkIdle.to_string(), "networkidle");
        }
    }

    mod wait_for_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_after_polls() {
            let calls = AtomicU32::new(0);
            let result = wait_for("counter", Duration::from_secs(1), Duration::from_millis(50), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 3) }
            })
            .await
            .unwrap();
            assert_eq!(result.polls, 4);
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out() {
            let err = wait_for("never", Duration::from_millis(200), Duration::from_millis(50), || async {
                Ok(false)
            })
            .await
            .unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("never"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_condition_error_aborts() {
            let err = wait_for("boom", Duration::from_secs(5), Duration::from_millis(50), || async {
                Err(ErpError::PageError {
                    message: "target closed".into(),
                })
            })
            .await
            .unwrap_err();
            assert!(!err.is_timeout());
        }
    }

    mod waiter_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_visible_immediately() {
            let driver = MockDriver::new();
            driver.add(MockElement::test_id("Nav-Users"));
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            let state = waiter.visible(&Locator::test_id("Nav-Users")).await.unwrap();
            assert!(state.visible);
        }

        #[tokio::test(start_paused = true)]
        async fn test_actionable_times_out_with_selector() {
            let driver = MockDriver::new();
            driver.add(MockElement::test_id("Archive").disabled());
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            let err = waiter
                .actionable(&Locator::test_id("Archive").with_tier(Tier::Short))
                .await
                .unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("Archive"));
            assert!(msg.contains("visible and enabled"));
            assert!(msg.contains("1000ms"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_when_missing() {
            let driver = MockDriver::new();
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            assert!(waiter.hidden(&Locator::test_id("Modal")).await.is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_times_out_as_locator_timeout() {
            let driver = MockDriver::new();
            driver.add(MockElement::test_id("UserForm-Modal"));
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            let err = waiter
                .hidden(&Locator::test_id("UserForm-Modal").with_tier(Tier::Medium))
                .await
                .unwrap_err();
            assert!(matches!(err, ErpError::LocatorTimeout { ms: 3000, .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_keeps_driver_errors() {
            let driver = MockDriver::new();
            driver.add(MockElement::test_id("UserForm-Modal"));
            driver.close().await.unwrap();
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            let err = waiter
                .hidden(&Locator::test_id("UserForm-Modal"))
                .await
                .unwrap_err();
            assert!(!err.is_timeout());
            assert!(err.to_string().contains("target closed"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_is_visible_within_false_on_hidden() {
            let driver = MockDriver::new();
            driver.add(MockElement::css(".toast").hidden());
            let waiter = Waiter::new(&driver, TimeoutPolicy::default());
            let shown = waiter
                .is_visible_within(&Locator::from_selector(Selector::css(".toast")), Tier::VeryShort)
                .await
                .unwrap();
            assert!(!shown);
        }
    }
}
