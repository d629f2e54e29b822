//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a description, not a handle: every driver call resolves
//! it against the live DOM again, so a re-render between two calls is
//! observed instead of hitting a stale node.
//!
//! The application's stable hook is the `data-testid` attribute. Components
//! that are re-mounted with a fresh instance number embed that number in the
//! middle of the id (`OrderRow-17-Popover-v3`), so [`Selector`] has prefix,
//! suffix and prefix+suffix forms alongside the exact one.

use crate::timeouts::Tier;
use serde::{Deserialize, Serialize};

/// Attribute every test id selector targets
pub const TEST_ID_ATTR: &str = "data-testid";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Exact test id
    TestId(String),
    /// Test id starting with the given text
    TestIdPrefix(String),
    /// Test id ending with the given text
    TestIdSuffix(String),
    /// Test id with a volatile middle part
    TestIdAffix {
        /// Stable leading part
        prefix: String,
        /// Stable trailing part
        suffix: String,
    },
    /// Leaf element whose text contains the string
    Text(String),
    /// Matches of the inner selector whose text contains the string
    HasText {
        /// Selector being filtered
        inner: Box<Selector>,
        /// Text content to match
        text: String,
    },
    /// The `index`-th match of the inner selector
    Nth {
        /// Selector whose matches are indexed
        inner: Box<Selector>,
        /// Zero-based position
        index: usize,
    },
    /// Child selector scoped to elements matched by the parent
    Within {
        /// Scope
        parent: Box<Selector>,
        /// Selector applied inside each scope element
        child: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an exact test id selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a test id prefix selector
    #[must_use]
    pub fn test_id_prefix(prefix: impl Into<String>) -> Self {
        Self::TestIdPrefix(prefix.into())
    }

    /// Create a test id suffix selector
    #[must_use]
    pub fn test_id_suffix(suffix: impl Into<String>) -> Self {
        Self::TestIdSuffix(suffix.into())
    }

    /// Create a selector for a test id with a volatile middle part
    #[must_use]
    pub fn test_id_affix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::TestIdAffix {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Filter this selector's matches by text content
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self::HasText {
            inner: Box::new(self),
            text: text.into(),
        }
    }

    /// Scope `child` inside this selector
    #[must_use]
    pub fn within(self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    /// CSS form of the selector, when one exists
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::TestId(id) => Some(format!("[{TEST_ID_ATTR}=\"{id}\"]")),
            Self::TestIdPrefix(p) => Some(format!("[{TEST_ID_ATTR}^=\"{p}\"]")),
            Self::TestIdSuffix(s) => Some(format!("[{TEST_ID_ATTR}$=\"{s}\"]")),
            Self::TestIdAffix { prefix, suffix } => Some(format!(
                "[{TEST_ID_ATTR}^=\"{prefix}\"][{TEST_ID_ATTR}$=\"{suffix}\"]"
            )),
            Self::Text(_) | Self::HasText { .. } | Self::Nth { .. } => None,
            Self::Within { parent, child } => {
                let (parent, child) = (parent.to_css()?, child.to_css()?);
                // `:scope` would bind to the document once flattened
                Some(match child.strip_prefix(":scope") {
                    Some(rest) => format!("{parent}{rest}"),
                    None => format!("{parent} {child}"),
                })
            }
        }
    }

    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_query_all(&self) -> String {
        self.js_all("document", 0)
    }

    fn js_all(&self, root: &str, depth: usize) -> String {
        if let Some(css) = self.to_css() {
            return format!("Array.from({root}.querySelectorAll({}))", js_str(&css));
        }
        match self {
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.children.length === 0 && el.textContent.includes({}))",
                js_str(t)
            ),
            Self::HasText { inner, text } => format!(
                "{}.filter(el => el.textContent.includes({}))",
                inner.js_all(root, depth + 1),
                js_str(text)
            ),
            Self::Nth { inner, index } => format!(
                "[{}[{index}]].filter(Boolean)",
                inner.js_all(root, depth + 1)
            ),
            Self::Within { parent, child } => {
                let var = format!("__scope{depth}");
                format!(
                    "{}.flatMap({var} => {})",
                    parent.js_all(root, depth + 1),
                    child.js_all(&var, depth + 1)
                )
            }
            // CSS-expressible variants returned above
            _ => format!("Array.from({root}.querySelectorAll(':not(*)'))"),
        }
    }

    /// Whether a test id satisfies this selector (test id variants only)
    #[must_use]
    pub fn matches_test_id(&self, id: &str) -> bool {
        match self {
            Self::TestId(exact) => id == exact,
            Self::TestIdPrefix(p) => id.starts_with(p.as_str()),
            Self::TestIdSuffix(s) => id.ends_with(s.as_str()),
            Self::TestIdAffix { prefix, suffix } => {
                id.len() >= prefix.len() + suffix.len()
                    && id.starts_with(prefix.as_str())
                    && id.ends_with(suffix.as_str())
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(t) => write!(f, "text={t:?}"),
            Self::HasText { inner, text } => write!(f, "{inner} >> has-text={text:?}"),
            Self::Nth { inner, index } => write!(f, "{inner} >> nth={index}"),
            Self::Within { parent, child } if self.to_css().is_none() => {
                write!(f, "{parent} >> {child}")
            }
            _ => f.write_str(&self.to_css().unwrap_or_default()),
        }
    }
}

/// Quote a string as a JavaScript literal
pub(crate) fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// A locator: selector, position among matches and the tier used when waiting on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    nth: usize,
    tier: Tier,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            nth: 0,
            tier: Tier::Medium,
        }
    }

    /// Locator for an exact test id
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// Select the `index`-th match (zero based)
    #[must_use]
    pub fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }

    /// Set the timeout tier used when waiting on this locator
    #[must_use]
    pub const fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Selector pinned to this locator's match index
    #[must_use]
    pub fn pinned(&self) -> Selector {
        Selector::Nth {
            inner: Box::new(self.selector.clone()),
            index: self.nth,
        }
    }

    /// Scope a child selector inside this locator's match
    #[must_use]
    pub fn locate(&self, child: Selector) -> Self {
        Self {
            selector: self.pinned().within(child),
            nth: 0,
            tier: self.tier,
        }
    }

    /// Filter by text content
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            selector: self.selector.with_text(text),
            ..self
        }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Index among matches
    #[must_use]
    pub const fn index(&self) -> usize {
        self.nth
    }

    /// Timeout tier
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nth == 0 {
            write!(f, "{}", self.selector)
        } else {
            write!(f, "{} >> nth={}", self.selector, self.nth)
        }
    }
}
