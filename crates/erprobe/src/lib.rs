//! erprobe: end-to-end browser tests for an ERP web application
//!
//! A reliable interaction layer over a browser page, page objects for the
//! application's screens and an ordered scenario runner with fixture
//! teardown.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      erprobe Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page       │    │ Session /  │            │
//! │   │ Pipeline   │───►│ Objects    │───►│ Interact   │            │
//! │   │ + Ledger   │    │            │    │ primitives │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                    │
//! │                     ┌────────────┐    ┌────────────┐            │
//! │                     │ MockDriver │◄───│ PageDriver │───► CDP    │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod assertion;
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
mod browser;
pub mod cleanup;
pub mod config;
pub mod conflict;
mod driver;
pub mod fixture;
mod interact;
mod locator;
#[allow(clippy::missing_const_for_fn)]
pub mod mock;
pub mod network;
pub mod notification;
mod page_object;
pub mod pages;
pub mod report;
mod result;
pub mod scenario;
pub mod selectors;
mod session;
pub mod table;
mod timeouts;
mod wait;

pub use assertion::{AssertionFailure, AssertionSummary, SoftAssertions};
#[cfg(feature = "browser")]
pub use browser::{CdpBrowser, CdpPage};
pub use cleanup::{ArchiveTable, CleanupPolicy, CleanupReport, CleanupTarget, PrefixCleanup};
pub use config::{routes, BrowserSettings, ErpConfig};
pub use conflict::{AttemptState, ConflictOutcome, ConflictRetry, ConflictSubmission};
pub use driver::{CapturedResponse, ElementState, PageDriver, PageStream, ResponseStream};
pub use fixture::{FixtureKind, FixtureLedger, FixtureNamer};
pub use interact::{HighlightStyle, SearchOptions};
pub use locator::{Locator, Selector};
pub use mock::{MockDriver, MockElement};
pub use notification::ConflictMatcher;
pub use page_object::PageObject;
pub use report::{RunReport, StepRecord, StepStatus};
pub use result::{ErpError, ErpResult};
pub use scenario::{Pipeline, ScenarioContext, ScenarioStep, SuiteOptions};
pub use session::{Session, StepNotes};
pub use table::{CountCell, Table};
pub use timeouts::{RetryCounts, Tier, TimeoutPolicy};
pub use wait::{LoadState, WaitResult, Waiter};
