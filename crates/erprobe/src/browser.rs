//! Chromium over CDP.
//!
//! [`CdpBrowser`] launches Chromium through chromiumoxide and spawns the
//! handler task that pumps protocol messages. [`CdpPage`] implements
//! [`PageDriver`] by evaluating the selector's JavaScript query in the page,
//! so every selector variant resolves the same way it does in the mock.

use crate::config::BrowserSettings;
use crate::driver::{CapturedResponse, ElementState, PageDriver, PageStream, ResponseStream};
use crate::locator::{js_str, Locator, Selector};
use crate::result::{ErpError, ErpResult};
use crate::wait::{LoadState, NETWORK_IDLE_THRESHOLD_MS};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Interval between polls for load states and new tabs
const PAGE_POLL: Duration = Duration::from_millis(100);

fn page_error(e: impl std::fmt::Display) -> ErpError {
    ErpError::PageError {
        message: e.to_string(),
    }
}

/// A running Chromium instance
#[derive(Debug)]
pub struct CdpBrowser {
    settings: BrowserSettings,
    inner: Arc<Mutex<Browser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch Chromium with the given settings
    pub async fn launch(settings: BrowserSettings) -> ErpResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .arg("--disable-popup-blocking");
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|message| ErpError::BrowserLaunchError { message })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ErpError::BrowserLaunchError {
                message: e.to_string(),
            })?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        tracing::info!(headless = settings.headless, "browser launched");

        Ok(Self {
            settings,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a blank page
    pub async fn new_page(&self) -> ErpResult<CdpPage> {
        let page = self
            .inner
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(page_error)?;
        Ok(CdpPage::new(page, Arc::clone(&self.inner)))
    }

    /// Launch settings
    #[must_use]
    pub const fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Close the browser and stop the handler task
    pub async fn close(self) -> ErpResult<()> {
        let result = self.inner.lock().await.close().await;
        self.handle.abort();
        result.map(|_| ()).map_err(|e| ErpError::BrowserLaunchError {
            message: e.to_string(),
        })
    }
}

/// One browser tab
#[derive(Debug, Clone)]
pub struct CdpPage {
    page: Page,
    browser: Arc<Mutex<Browser>>,
}

#[derive(Debug, Deserialize)]
struct ClickPoint {
    x: f64,
    y: f64,
}

impl CdpPage {
    fn new(page: Page, browser: Arc<Mutex<Browser>>) -> Self {
        Self { page, browser }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> ErpResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ErpError::ScriptError {
                message: e.to_string(),
            })?
            .into_value()
            .map_err(|e| ErpError::ScriptError {
                message: e.to_string(),
            })
    }

    /// Run `body` with `el` bound to the located element; `null` when missing
    fn on_element(locator: &Locator, body: &str) -> String {
        format!(
            "(() => {{ const el = ({})[{}]; if (!el) return null; {body} }})()",
            locator.selector().to_query_all(),
            locator.index()
        )
    }

    /// Run an action script, mapping a missing element to a timeout
    async fn act(&self, locator: &Locator, body: &str) -> ErpResult<()> {
        let done: Option<bool> = self.eval(Self::on_element(locator, body)).await?;
        match done {
            Some(_) => Ok(()),
            None => Err(ErpError::locator_timeout(locator.to_string(), "attached", 0)),
        }
    }

    async fn ready_state(&self) -> ErpResult<String> {
        self.eval("document.readyState".to_string()).await
    }

    async fn resource_count(&self) -> ErpResult<usize> {
        self.eval("performance.getEntriesByType('resource').length".to_string())
            .await
    }

    async fn wait_for_state(&self, state: LoadState) -> ErpResult<()> {
        loop {
            let ready = self.ready_state().await?;
            let reached = match state {
                LoadState::DomContentLoaded => ready != "loading",
                LoadState::Load | LoadState::NetworkIdle => ready == "complete",
            };
            if reached {
                break;
            }
            tokio::time::sleep(PAGE_POLL).await;
        }
        if state == LoadState::NetworkIdle {
            // idle once no new resource entry appears for the threshold
            let mut seen = self.resource_count().await?;
            loop {
                tokio::time::sleep(Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS)).await;
                let now = self.resource_count().await?;
                if now == seen {
                    break;
                }
                seen = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> ErpResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ErpError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ErpResult<String> {
        Ok(self.page.url().await.map_err(page_error)?.unwrap_or_default())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ErpResult<()> {
        tokio::time::timeout(timeout, self.wait_for_state(state))
            .await
            .map_err(|_| ErpError::Timeout {
                what: format!("load state {state}"),
                ms: timeout.as_millis() as u64,
            })?
    }

    async fn count(&self, selector: &Selector) -> ErpResult<usize> {
        self.eval(format!("({}).length", selector.to_query_all())).await
    }

    async fn element_state(&self, locator: &Locator) -> ErpResult<Option<ElementState>> {
        self.eval(Self::on_element(
            locator,
            "const r = el.getBoundingClientRect(); \
             const s = getComputedStyle(el); \
             return { \
               visible: r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none', \
               enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true', \
               text: (el.innerText ?? el.textContent ?? '').trim(), \
               value: ('value' in el && typeof el.value === 'string') ? el.value : null \
             };",
        ))
        .await
    }

    async fn texts(&self, selector: &Selector) -> ErpResult<Vec<String>> {
        self.eval(format!(
            "({}).map(el => (el.innerText ?? el.textContent ?? '').trim())",
            selector.to_query_all()
        ))
        .await
    }

    async fn click(&self, locator: &Locator) -> ErpResult<()> {
        let point: Option<ClickPoint> = self
            .eval(Self::on_element(
                locator,
                "el.scrollIntoView({ block: 'center', inline: 'center' }); \
                 const r = el.getBoundingClientRect(); \
                 return { x: r.left + r.width / 2, y: r.top + r.height / 2 };",
            ))
            .await?;
        let point = point.ok_or_else(|| ErpError::locator_timeout(locator.to_string(), "attached", 0))?;
        self.page
            .click(Point::new(point.x, point.y))
            .await
            .map_err(|e| ErpError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> ErpResult<()> {
        let body = format!(
            "el.focus(); \
             const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set; \
             if (setter) {{ setter.call(el, {v}); }} else {{ el.value = {v}; }} \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;",
            v = js_str(value)
        );
        self.act(locator, &body).await
    }

    async fn type_key(&self, locator: &Locator, key: char) -> ErpResult<()> {
        self.act(locator, "el.focus(); return true;").await?;
        self.page
            .execute(InsertTextParams::new(key.to_string()))
            .await
            .map_err(|e| ErpError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ErpResult<()> {
        self.act(
            locator,
            "el.scrollIntoView({ block: 'center', inline: 'nearest' }); return true;",
        )
        .await
    }

    async fn apply_style(&self, locator: &Locator, css: &str) -> ErpResult<()> {
        self.act(locator, &format!("el.style.cssText += {}; return true;", js_str(css)))
            .await
    }

    async fn screenshot(&self) -> ErpResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .page
            .execute(params)
            .await
            .map_err(|e| ErpError::ScreenshotError {
                message: e.to_string(),
            })?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.result.data)
            .map_err(|e| ErpError::ScreenshotError {
                message: e.to_string(),
            })
    }

    async fn capture_responses(&self, url_fragment: &str) -> ErpResult<ResponseStream> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(page_error)?;
        let received = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(page_error)?;
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(page_error)?;

        enum Network {
            Received(Arc<EventResponseReceived>),
            Finished(Arc<EventLoadingFinished>),
        }
        let mut events = Box::pin(futures::stream::select(
            received.map(Network::Received),
            finished.map(Network::Finished),
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let page = self.page.clone();
        let fragment = url_fragment.to_string();
        tokio::spawn(async move {
            // bodies are only readable once loading finished
            let mut pending: HashMap<String, (RequestId, String, u16)> = HashMap::new();
            while let Some(event) = events.next().await {
                if tx.is_closed() {
                    break;
                }
                match event {
                    Network::Received(ev) if ev.response.url.contains(&fragment) => {
                        pending.insert(
                            ev.request_id.inner().clone(),
                            (
                                ev.request_id.clone(),
                                ev.response.url.clone(),
                                u16::try_from(ev.response.status).unwrap_or_default(),
                            ),
                        );
                    }
                    Network::Received(_) => {}
                    Network::Finished(ev) => {
                        let Some((id, url, status)) = pending.remove(ev.request_id.inner()) else {
                            continue;
                        };
                        let body = match page.execute(GetResponseBodyParams::new(id)).await {
                            Ok(resp) if resp.result.base64_encoded => base64::engine::general_purpose::STANDARD
                                .decode(&resp.result.body)
                                .map(|b| String::from_utf8_lossy(&b).into_owned())
                                .unwrap_or_default(),
                            Ok(resp) => resp.result.body.clone(),
                            Err(e) => {
                                tracing::warn!(url = %url, error = %e, "response body unavailable");
                                String::new()
                            }
                        };
                        if tx.send(CapturedResponse { url, status, body }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn watch_new_pages(&self) -> ErpResult<PageStream> {
        let known: HashSet<String> = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(page_error)?
            .iter()
            .map(|p| p.target_id().inner().clone())
            .collect();

        let (tx, rx) = mpsc::unbounded_channel::<Arc<dyn PageDriver>>();
        let browser = Arc::clone(&self.browser);
        tokio::spawn(async move {
            let mut known = known;
            while !tx.is_closed() {
                tokio::time::sleep(PAGE_POLL).await;
                let pages = match browser.lock().await.pages().await {
                    Ok(pages) => pages,
                    Err(e) => {
                        tracing::warn!(error = %e, "listing pages failed");
                        break;
                    }
                };
                for page in pages {
                    if known.insert(page.target_id().inner().clone()) {
                        tracing::debug!(target = %page.target_id().inner(), "new page");
                        let page: Arc<dyn PageDriver> = Arc::new(CdpPage::new(page, Arc::clone(&browser)));
                        if tx.send(page).is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn close(&self) -> ErpResult<()> {
        self.page.clone().close().await.map_err(page_error)
    }
}
