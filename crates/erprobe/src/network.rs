//! Observing API responses behind a page.
//!
//! Drill-down pages load their rows from an API; comparing the number of
//! rows the UI shows with the number of entities the API returned catches
//! pagination and filtering bugs the UI alone would hide.

use crate::assertion::SoftAssertions;
use crate::driver::{CapturedResponse, ResponseStream};
use crate::result::{ErpError, ErpResult};
use serde_json::Value;
use std::time::Duration;

/// Keys under which list endpoints nest their rows
pub const LIST_KEYS: &[&str] = &["data", "items", "rows", "content", "results"];

/// Keys holding a total count
pub const TOTAL_KEYS: &[&str] = &["total", "totalCount", "total_count", "count"];

/// Number of entities in a list response
///
/// Accepts a bare array, an object with one of [`LIST_KEYS`] holding an
/// array, or an object with a numeric field from [`TOTAL_KEYS`]. A nested
/// array wins over a total, since totals often count across pages.
#[must_use]
pub fn entity_count(json: &Value) -> Option<usize> {
    match json {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array).map(Vec::len))
            .or_else(|| {
                TOTAL_KEYS
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_u64))
                    .and_then(|n| usize::try_from(n).ok())
            }),
        _ => None,
    }
}

/// Soft-assert that the UI shows as many entities as the API returned
pub fn cross_check_count(soft: &mut SoftAssertions, what: &str, ui: usize, api: usize) -> bool {
    tracing::debug!(what, ui, api, "cross-checking counts");
    soft.assert_eq(&ui, &api, &format!("{what}: UI count vs API count"))
}

/// Responses captured for one URL fragment
#[derive(Debug)]
pub struct ResponseWatcher {
    fragment: String,
    stream: ResponseStream,
}

impl ResponseWatcher {
    /// Wrap a stream returned by `PageDriver::capture_responses`
    #[must_use]
    pub fn new(fragment: impl Into<String>, stream: ResponseStream) -> Self {
        Self {
            fragment: fragment.into(),
            stream,
        }
    }

    /// URL fragment being watched
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Wait for the next successful (2xx) response
    pub async fn next_ok(&mut self, timeout: Duration) -> ErpResult<CapturedResponse> {
        let what = format!("response matching {:?}", self.fragment);
        let wait = async {
            while let Some(resp) = self.stream.recv().await {
                if (200..300).contains(&resp.status) {
                    return Some(resp);
                }
                tracing::debug!(url = %resp.url, status = resp.status, "ignoring non-2xx response");
            }
            None
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(resp)) => Ok(resp),
            Ok(None) => Err(ErpError::PageError {
                message: format!("page closed while waiting for {what}"),
            }),
            Err(_) => Err(ErpError::Timeout {
                what,
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Wait for the next successful response and count its entities
    pub async fn next_count(&mut self, timeout: Duration) -> ErpResult<usize> {
        let resp = self.next_ok(timeout).await?;
        let json = resp.json()?;
        entity_count(&json).ok_or_else(|| ErpError::PageError {
            message: format!("response from {} has no recognisable entity list", resp.url),
        })
    }
}
