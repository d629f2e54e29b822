//! Notification (toast) reading and classification.
//!
//! The application reports the result of a submitted form through a toast
//! region. Its text is the only signal that distinguishes "saved" from
//! "that number is taken", so classification is plain keyword matching on
//! lower-cased text.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::ErpResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keywords naming the numbered field a conflict is about
pub const NUMBER_DOMAIN_KEYWORDS: &[&str] = &[
    "табельн",
    "номер",
    "table number",
    "personnel number",
    "number",
];

/// Keywords saying the value is already taken
pub const OCCUPIED_KEYWORDS: &[&str] = &[
    "занят",
    "уже существует",
    "уже использ",
    "существует",
    "используется",
    "occupied",
    "already exists",
    "already in use",
    "exists",
    "used",
    "taken",
];

/// Keyword sets deciding whether a notification reports a value conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMatcher {
    /// Field/domain keywords (any must match)
    pub domain: Vec<String>,
    /// Occupied/exists keywords (any must match)
    pub occupied: Vec<String>,
}

impl Default for ConflictMatcher {
    fn default() -> Self {
        Self {
            domain: NUMBER_DOMAIN_KEYWORDS.iter().map(ToString::to_string).collect(),
            occupied: OCCUPIED_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ConflictMatcher {
    /// Matcher with custom domain keywords and the default occupied set
    #[must_use]
    pub fn for_domain(keywords: &[&str]) -> Self {
        Self {
            domain: keywords.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// True iff the text contains a domain keyword AND an occupied keyword
    #[must_use]
    pub fn is_conflict(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        contains_any(&lower, &self.domain) && contains_any(&lower, &self.occupied)
    }
}

fn contains_any<S: AsRef<str>>(haystack: &str, needles: &[S]) -> bool {
    needles
        .iter()
        .any(|n| haystack.contains(n.as_ref().to_lowercase().as_str()))
}

/// Whether a notification reports a table/number conflict (default keyword sets)
#[must_use]
pub fn classify_conflict(text: &str) -> bool {
    ConflictMatcher::default().is_conflict(text)
}

/// Poll a notification region up to `polls` times, returning the first
/// non-empty text seen.
pub async fn poll_notification(
    driver: &dyn PageDriver,
    region: &Selector,
    polls: u32,
    interval: Duration,
) -> ErpResult<Option<String>> {
    for poll in 0..polls.max(1) {
        let texts = driver.texts(region).await?;
        let joined = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        if !joined.is_empty() {
            tracing::debug!(poll, text = %joined, "notification captured");
            return Ok(Some(joined));
        }
        tokio::time::sleep(interval).await;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};
    use proptest::prelude::*;

    mod classify_tests {
        use super::*;

        #[test]
        fn test_table_number_in_use_is_conflict() {
            assert!(classify_conflict("табельный номер уже используется"));
        }

        #[test]
        fn test_success_is_not_conflict() {
            assert!(!classify_conflict("Пользователь успешно создан"));
        }

        #[test]
        fn test_case_insensitive() {
            assert!(classify_conflict("ТАБЕЛЬНЫЙ НОМЕР ЗАНЯТ"));
            assert!(classify_conflict("Table Number Already Exists"));
        }

        #[test]
        fn test_needs_both_keyword_sets() {
            assert!(!classify_conflict("табельный номер"));
            assert!(!classify_conflict("уже существует"));
        }

        #[test]
        fn test_custom_domain() {
            let matcher = ConflictMatcher::for_domain(&["инвентарн"]);
            assert!(matcher.is_conflict("Инвентарный номер уже существует"));
            assert!(!matcher.is_conflict("табельный номер уже существует"));
        }
    }

    proptest! {
        #[test]
        fn prop_classify_is_case_insensitive(s in "\\PC{0,40}") {
            prop_assert_eq!(classify_conflict(&s), classify_conflict(&s.to_uppercase()));
        }

        #[test]
        fn prop_conflict_iff_both_sets(
            prefix in "[a-z ]{0,8}",
            domain in prop::sample::select(NUMBER_DOMAIN_KEYWORDS),
            occupied in prop::sample::select(OCCUPIED_KEYWORDS),
        ) {
            let both = format!("{prefix}{domain} {occupied}");
            prop_assert!(classify_conflict(&both));
            let only_domain = format!("{prefix}{domain}");
            let expected = OCCUPIED_KEYWORDS.iter().any(|k| only_domain.contains(k));
            prop_assert_eq!(classify_conflict(&only_domain), expected);
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_poll_returns_text() {
            let driver = MockDriver::new();
            driver.add(MockElement::css(".toast").with_text("  номер занят "));
            let text = poll_notification(&driver, &Selector::css(".toast"), 3, Duration::from_millis(100))
                .await
                .unwrap();
            assert_eq!(text.as_deref(), Some("номер занят"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_poll_none_when_empty() {
            let driver = MockDriver::new();
            let text = poll_notification(&driver, &Selector::css(".toast"), 3, Duration::from_millis(100))
                .await
                .unwrap();
            assert!(text.is_none());
        }
    }
}
