//! PageDriver - abstract browser page automation trait
//!
//! Everything above this module talks to a page through [`PageDriver`].
//! Two implementations ship with the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐   ┌─────────────────────────┐  │
//! │  │  CdpPage                 │   │  MockDriver             │  │
//! │  │  (feature = "browser")   │   │  (unit tests)           │  │
//! │  │  chromiumoxide over CDP  │   │  in-memory element list │  │
//! │  └──────────────────────────┘   └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::{Locator, Selector};
use crate::result::ErpResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Snapshot of one element's interactive state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered with a non-empty box and not hidden by CSS
    pub visible: bool,
    /// Not disabled (attribute or aria-disabled)
    pub enabled: bool,
    /// Trimmed text content
    pub text: String,
    /// Current value for form controls
    pub value: Option<String>,
}

/// An HTTP response observed on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// Full request URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl CapturedResponse {
    /// Parse the body as JSON
    pub fn json(&self) -> ErpResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Receiver of responses whose URL contains a fragment
pub type ResponseStream = mpsc::UnboundedReceiver<CapturedResponse>;

/// Receiver of pages opened by the current page (new tabs, popups)
pub type PageStream = mpsc::UnboundedReceiver<Arc<dyn PageDriver>>;

/// Abstract page automation
///
/// Locators are resolved on every call. Methods that act on a single
/// element use the locator's match index; a missing element is an error
/// from the action methods and `None` from [`PageDriver::element_state`].
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL
    async fn goto(&self, url: &str) -> ErpResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ErpResult<String>;

    /// Wait for a load state
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ErpResult<()>;

    /// Number of elements matching a selector
    async fn count(&self, selector: &Selector) -> ErpResult<usize>;

    /// State of the located element, `None` when it is not attached
    async fn element_state(&self, locator: &Locator) -> ErpResult<Option<ElementState>>;

    /// Text of every element matching a selector, in document order
    async fn texts(&self, selector: &Selector) -> ErpResult<Vec<String>>;

    /// Click the located element
    async fn click(&self, locator: &Locator) -> ErpResult<()>;

    /// Replace the value of an input
    async fn fill(&self, locator: &Locator, value: &str) -> ErpResult<()>;

    /// Press one key in the located element, firing keyboard events
    async fn type_key(&self, locator: &Locator, key: char) -> ErpResult<()>;

    /// Scroll the located element into view
    async fn scroll_into_view(&self, locator: &Locator) -> ErpResult<()>;

    /// Append inline CSS declarations to the located element
    async fn apply_style(&self, locator: &Locator, css: &str) -> ErpResult<()>;

    /// Take a PNG screenshot of the viewport
    async fn screenshot(&self) -> ErpResult<Vec<u8>>;

    /// Start capturing responses whose URL contains `url_fragment`
    async fn capture_responses(&self, url_fragment: &str) -> ErpResult<ResponseStream>;

    /// Start listening for pages opened from this page
    async fn watch_new_pages(&self) -> ErpResult<PageStream>;

    /// Close the page
    async fn close(&self) -> ErpResult<()>;
}
