//! In-memory page for unit testing page objects without a browser.
//!
//! Elements live in a flat list with optional parent links. Selector
//! matching follows the real semantics for test ids, text and scoping;
//! plain CSS selectors are matched literally against each element's `css`
//! key, so tests register elements under the exact CSS string the
//! selector registry produces.
//!
//! Behaviour is scripted with hooks that run on click or key input and may
//! mutate the DOM, queue responses or open new pages.

use crate::driver::{CapturedResponse, ElementState, PageDriver, PageStream, ResponseStream};
use crate::locator::{Locator, Selector};
use crate::result::{ErpError, ErpResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

/// One element in the mock DOM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// `data-testid` value
    pub test_id: Option<String>,
    /// Literal CSS key this element answers to
    pub css: Option<String>,
    /// Text content
    pub text: String,
    /// Value for inputs
    pub value: Option<String>,
    /// Visible flag
    pub visible: bool,
    /// Enabled flag
    pub enabled: bool,
    /// Inputs that ignore fill/typing
    pub read_only: bool,
    /// Parent element index
    pub parent: Option<usize>,
    /// Inline style applied by the driver
    pub style: String,
    /// Removed from the DOM
    pub detached: bool,
}

impl MockElement {
    /// Visible, enabled element with a test id
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self {
            test_id: Some(id.into()),
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// Visible, enabled element answering to a CSS key
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: Some(css.into()),
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// Set text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set parent index
    #[must_use]
    pub const fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark read-only (swallows input)
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Mutable document state shared with hooks
#[derive(Debug, Default)]
pub struct MockDom {
    elements: Vec<MockElement>,
    pending_responses: Vec<CapturedResponse>,
    pending_pages: Vec<Arc<MockDriver>>,
}

impl MockDom {
    /// Add an element, returning its index
    pub fn add(&mut self, element: MockElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Element by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MockElement> {
        self.elements.get(index)
    }

    /// Mutable element by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut MockElement> {
        self.elements.get_mut(index)
    }

    /// Indices of attached elements matching a selector, in document order
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Vec<usize> {
        match selector {
            Selector::Nth { inner, index } => {
                self.resolve(inner).get(*index).copied().into_iter().collect()
            }
            Selector::HasText { inner, text } => self
                .resolve(inner)
                .into_iter()
                .filter(|&i| self.elements[i].text.contains(text.as_str()))
                .collect(),
            Selector::Within { parent, child } => {
                let scopes: HashSet<usize> = self.resolve(parent).into_iter().collect();
                self.resolve(child)
                    .into_iter()
                    .filter(|&i| self.has_ancestor_in(i, &scopes))
                    .collect()
            }
            _ => (0..self.elements.len())
                .filter(|&i| self.is_attached(i) && self.matches_leaf(i, selector))
                .collect(),
        }
    }

    /// First matching element index
    #[must_use]
    pub fn find(&self, selector: &Selector) -> Option<usize> {
        self.resolve(selector).into_iter().next()
    }

    /// Set visibility of every element matching a selector
    pub fn set_visible(&mut self, selector: &Selector, visible: bool) {
        for i in self.resolve(selector) {
            self.elements[i].visible = visible;
        }
    }

    /// Set enabled flag of every element matching a selector
    pub fn set_enabled(&mut self, selector: &Selector, enabled: bool) {
        for i in self.resolve(selector) {
            self.elements[i].enabled = enabled;
        }
    }

    /// Set text of every element matching a selector
    pub fn set_text(&mut self, selector: &Selector, text: &str) {
        for i in self.resolve(selector) {
            self.elements[i].text = text.to_string();
        }
    }

    /// Value of the first element matching a selector
    #[must_use]
    pub fn value_of(&self, selector: &Selector) -> Option<String> {
        self.find(selector)
            .and_then(|i| self.elements[i].value.clone())
    }

    /// Detach an element and its descendants
    pub fn detach(&mut self, index: usize) {
        if let Some(el) = self.elements.get_mut(index) {
            el.detached = true;
        }
    }

    /// Queue a response for capture listeners
    pub fn emit_response(&mut self, response: CapturedResponse) {
        self.pending_responses.push(response);
    }

    /// Queue a new page for page listeners
    pub fn open_page(&mut self, page: impl Into<Arc<MockDriver>>) {
        self.pending_pages.push(page.into());
    }

    fn is_attached(&self, index: usize) -> bool {
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            let Some(el) = self.elements.get(i) else {
                return false;
            };
            if el.detached {
                return false;
            }
            cursor = el.parent;
        }
        true
    }

    fn has_ancestor_in(&self, index: usize, scopes: &HashSet<usize>) -> bool {
        let mut cursor = self.elements.get(index).and_then(|e| e.parent);
        while let Some(i) = cursor {
            if scopes.contains(&i) {
                return true;
            }
            cursor = self.elements.get(i).and_then(|e| e.parent);
        }
        false
    }

    fn matches_leaf(&self, index: usize, selector: &Selector) -> bool {
        let el = &self.elements[index];
        match selector {
            Selector::Css(css) => el.css.as_deref() == Some(css.as_str()),
            Selector::Text(text) => el.text.contains(text.as_str()),
            other => el
                .test_id
                .as_deref()
                .is_some_and(|id| other.matches_test_id(id)),
        }
    }
}

/// Events hooks can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// Element clicked
    Click,
    /// Value changed by fill or key press
    Input,
}

type HookFn = Box<dyn FnMut(&mut MockDom, usize) + Send>;

struct Hook {
    event: MockEvent,
    selector: Selector,
    run: HookFn,
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("event", &self.event)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Mock page driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    dom: Mutex<MockDom>,
    hooks: Mutex<Vec<Hook>>,
    url: Mutex<String>,
    history: Mutex<Vec<String>>,
    response_listeners: Mutex<Vec<(String, mpsc::UnboundedSender<CapturedResponse>)>>,
    page_listeners: Mutex<Vec<mpsc::UnboundedSender<Arc<dyn PageDriver>>>>,
    on_navigate: Mutex<Vec<CapturedResponse>>,
    closed: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MockDriver {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element, returning its index
    pub fn add(&self, element: MockElement) -> usize {
        lock(&self.dom).add(element)
    }

    /// Run a closure against the DOM
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut *lock(&self.dom))
    }

    /// Register a hook for an event on elements matching `selector`
    pub fn on(
        &self,
        event: MockEvent,
        selector: Selector,
        hook: impl FnMut(&mut MockDom, usize) + Send + 'static,
    ) {
        lock(&self.hooks).push(Hook {
            event,
            selector,
            run: Box::new(hook),
        });
    }

    /// Shorthand for a click hook
    pub fn on_click(
        &self,
        selector: Selector,
        hook: impl FnMut(&mut MockDom, usize) + Send + 'static,
    ) {
        self.on(MockEvent::Click, selector, hook);
    }

    /// Emit `response` on every navigation, as a page loading its data would
    pub fn respond_on_goto(&self, response: CapturedResponse) {
        lock(&self.on_navigate).push(response);
    }

    /// Call history for verification
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        lock(&self.history).iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.history)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ErpResult<()> {
        if self.is_closed() {
            return Err(ErpError::PageError {
                message: "target closed".into(),
            });
        }
        Ok(())
    }

    fn record(&self, call: String) {
        lock(&self.history).push(call);
    }

    fn target(&self, locator: &Locator) -> ErpResult<usize> {
        let dom = lock(&self.dom);
        dom.resolve(locator.selector())
            .get(locator.index())
            .copied()
            .ok_or_else(|| ErpError::PageError {
                message: format!("no element matches {locator}"),
            })
    }

    fn fire(&self, event: MockEvent, index: usize) {
        {
            let mut hooks = lock(&self.hooks);
            let mut dom = lock(&self.dom);
            for hook in hooks.iter_mut().filter(|h| h.event == event) {
                if dom.resolve(&hook.selector).contains(&index) {
                    (hook.run)(&mut *dom, index);
                }
            }
        }
        self.flush();
    }

    fn flush(&self) {
        let (responses, pages) = {
            let mut dom = lock(&self.dom);
            (
                std::mem::take(&mut dom.pending_responses),
                std::mem::take(&mut dom.pending_pages),
            )
        };
        let listeners = lock(&self.response_listeners);
        for resp in responses {
            for (fragment, tx) in listeners.iter() {
                if resp.url.contains(fragment.as_str()) {
                    let _ = tx.send(resp.clone());
                }
            }
        }
        let page_listeners = lock(&self.page_listeners);
        for page in pages {
            for tx in page_listeners.iter() {
                let _ = tx.send(page.clone() as Arc<dyn PageDriver>);
            }
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> ErpResult<()> {
        self.record(format!("goto:{url}"));
        *lock(&self.url) = url.to_string();
        let responses = lock(&self.on_navigate).clone();
        self.with_dom(|dom| responses.into_iter().for_each(|r| dom.emit_response(r)));
        self.flush();
        Ok(())
    }

    async fn current_url(&self) -> ErpResult<String> {
        Ok(lock(&self.url).clone())
    }

    async fn wait_for_load_state(&self, state: LoadState, _timeout: Duration) -> ErpResult<()> {
        self.record(format!("load:{state}"));
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ErpResult<usize> {
        self.ensure_open()?;
        Ok(lock(&self.dom).resolve(selector).len())
    }

    async fn element_state(&self, locator: &Locator) -> ErpResult<Option<ElementState>> {
        self.ensure_open()?;
        let dom = lock(&self.dom);
        Ok(dom
            .resolve(locator.selector())
            .get(locator.index())
            .and_then(|&i| dom.get(i))
            .map(|el| ElementState {
                visible: el.visible,
                enabled: el.enabled,
                text: el.text.trim().to_string(),
                value: el.value.clone(),
            }))
    }

    async fn texts(&self, selector: &Selector) -> ErpResult<Vec<String>> {
        self.ensure_open()?;
        let dom = lock(&self.dom);
        Ok(dom
            .resolve(selector)
            .into_iter()
            .filter_map(|i| dom.get(i).map(|e| e.text.trim().to_string()))
            .collect())
    }

    async fn click(&self, locator: &Locator) -> ErpResult<()> {
        let index = self.target(locator)?;
        self.record(format!("click:{locator}"));
        self.fire(MockEvent::Click, index);
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> ErpResult<()> {
        let index = self.target(locator)?;
        self.record(format!("fill:{locator}={value}"));
        {
            let mut dom = lock(&self.dom);
            if let Some(el) = dom.get_mut(index) {
                if !el.read_only {
                    el.value = Some(value.to_string());
                }
            }
        }
        self.fire(MockEvent::Input, index);
        Ok(())
    }

    async fn type_key(&self, locator: &Locator, key: char) -> ErpResult<()> {
        let index = self.target(locator)?;
        self.record(format!("key:{locator}:{key}"));
        {
            let mut dom = lock(&self.dom);
            if let Some(el) = dom.get_mut(index) {
                if !el.read_only {
                    el.value.get_or_insert_with(String::new).push(key);
                }
            }
        }
        self.fire(MockEvent::Input, index);
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ErpResult<()> {
        self.target(locator)?;
        self.record(format!("scroll:{locator}"));
        Ok(())
    }

    async fn apply_style(&self, locator: &Locator, css: &str) -> ErpResult<()> {
        let index = self.target(locator)?;
        self.record(format!("style:{locator}"));
        if let Some(el) = lock(&self.dom).get_mut(index) {
            el.style.push_str(css);
        }
        Ok(())
    }

    async fn screenshot(&self) -> ErpResult<Vec<u8>> {
        self.record("screenshot".to_string());
        Ok(vec![0x89, 0x50, 0x4E, 0x47])
    }

    async fn capture_responses(&self, url_fragment: &str) -> ErpResult<ResponseStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.response_listeners).push((url_fragment.to_string(), tx));
        Ok(rx)
    }

    async fn watch_new_pages(&self) -> ErpResult<PageStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.page_listeners).push(tx);
        Ok(rx)
    }

    async fn close(&self) -> ErpResult<()> {
        self.record("close".to_string());
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
