//! Interaction primitives.
//!
//! Each primitive waits for the state the application actually needs
//! before acting (visible AND enabled, rows rendered, popover positioned)
//! and fails with a [`ErpError::LocatorTimeout`] naming the selector.

use crate::driver::PageDriver;
use crate::locator::{Locator, Selector};
use crate::notification::poll_notification;
use crate::result::{ErpError, ErpResult};
use crate::selectors::common;
use crate::session::Session;
use crate::table::Table;
use crate::timeouts::{Tier, SETTLE_DELAY_MS};
use crate::wait::{wait_for, LoadState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Timing of a key-by-key search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Delay between key presses
    pub key_delay: Duration,
    /// Wait after the last key for the list to re-render
    pub wait_after: Duration,
    /// Bound on the whole search
    pub timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            key_delay: Duration::from_millis(50),
            wait_after: Duration::from_millis(1_000),
            timeout: Duration::from_millis(30_000),
        }
    }
}

/// Outline drawn around an element after it was acted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightStyle {
    /// CSS color
    pub color: String,
    /// Outline width in pixels
    pub width_px: u32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: "#e53935".to_string(),
            width_px: 3,
        }
    }
}

impl HighlightStyle {
    /// Inline CSS declarations; outline only, so layout never shifts
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "outline: {}px solid {}; outline-offset: 2px;",
            self.width_px, self.color
        )
    }
}

impl Session {
    /// Open a sidebar section and wait for the page to settle
    pub async fn find_and_open(&self, nav_test_id: &str) -> ErpResult<()> {
        let link = Locator::test_id(nav_test_id).with_tier(Tier::Standard);
        self.waiter().visible(&link).await?;
        self.driver().click(&link).await?;
        self.driver()
            .wait_for_load_state(LoadState::NetworkIdle, self.policy().get(Tier::Long))
            .await?;
        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;
        tracing::info!(section = nav_test_id, "section opened");
        Ok(())
    }

    /// Navigate to a named route
    pub async fn open_route(&self, route: &str) -> ErpResult<()> {
        let url = self.config().route_url(route)?;
        self.driver().goto(&url).await?;
        self.driver()
            .wait_for_load_state(LoadState::NetworkIdle, self.policy().get(Tier::Long))
            .await?;
        tracing::debug!(route, url = %url, "route opened");
        Ok(())
    }

    /// Wait until the table has at least one data row, returning the row count
    pub async fn wait_for_table_body(&self, table: &Table) -> ErpResult<usize> {
        wait_for_rows(self.driver(), table, self.policy().get(Tier::Standard), self.policy().poll_interval()).await
    }

    /// Fill an input, read it back and soft-assert the value stuck
    ///
    /// Returns whether the echoed value matched.
    pub async fn fill_and_verify(&self, locator: &Locator, value: &str) -> ErpResult<bool> {
        self.waiter().actionable(locator).await?;
        self.driver().fill(locator, value).await?;
        let echoed = self
            .driver()
            .element_state(locator)
            .await?
            .and_then(|s| s.value)
            .unwrap_or_default();
        Ok(self
            .soft_eq(&echoed.as_str(), &value, &format!("value of {locator}"))
            .await)
    }

    /// Wait until visible and enabled, optionally scroll, then click
    pub async fn click_when_ready(&self, locator: &Locator, scroll: bool) -> ErpResult<()> {
        self.waiter().actionable(locator).await?;
        if scroll {
            self.driver().scroll_into_view(locator).await?;
        }
        self.driver().click(locator).await?;
        tracing::debug!(selector = %locator, "clicked");
        if self.highlights() {
            self.highlight(locator, &HighlightStyle::default()).await;
        }
        Ok(())
    }

    /// Type `text` one key at a time, then wait for the results to settle
    pub async fn search_sequential(&self, input: &Locator, text: &str, options: SearchOptions) -> ErpResult<()> {
        let typing = async {
            self.waiter().actionable(input).await?;
            self.driver().fill(input, "").await?;
            for key in text.chars() {
                self.driver().type_key(input, key).await?;
                tokio::time::sleep(options.key_delay).await;
            }
            tokio::time::sleep(options.wait_after).await;
            Ok::<_, ErpError>(())
        };
        match tokio::time::timeout(options.timeout, typing).await {
            Ok(result) => result,
            Err(_) => Err(ErpError::Timeout {
                what: format!("typing {text:?} into {input}"),
                ms: options.timeout.as_millis() as u64,
            }),
        }
    }

    /// Outline an element; failures are logged and ignored
    pub async fn highlight(&self, locator: &Locator, style: &HighlightStyle) {
        if let Err(e) = self.driver().apply_style(locator, &style.to_css()).await {
            tracing::debug!(selector = %locator, error = %e, "highlight skipped");
        }
    }

    /// Click `trigger` and return the page it opens
    ///
    /// The new-page listener is registered before the click, so a tab that
    /// opens immediately is not missed.
    pub async fn open_in_new_page(&self, trigger: &Locator) -> ErpResult<Arc<dyn PageDriver>> {
        let mut pages = self.driver().watch_new_pages().await?;
        let timeout = self.policy().get(Tier::Long);
        let (clicked, opened) = tokio::join!(
            self.click_when_ready(trigger, true),
            tokio::time::timeout(timeout, pages.recv())
        );
        clicked?;
        match opened {
            Ok(Some(page)) => {
                page.wait_for_load_state(LoadState::Load, timeout).await?;
                Ok(page)
            }
            Ok(None) => Err(ErpError::PageError {
                message: format!("page closed before {trigger} opened a new page"),
            }),
            Err(_) => Err(ErpError::Timeout {
                what: format!("new page opened by {trigger}"),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Open a dropdown and pick the option showing `option_text`
    pub async fn select_dropdown_option(&self, dropdown: &Selector, option_text: &str) -> ErpResult<()> {
        let trigger = Locator::from_selector(dropdown.clone());
        let option = Locator::from_selector(common::dropdown_option(option_text));
        let attempts = self.retries().dropdown_select.max(1);
        for attempt in 1..=attempts {
            self.click_when_ready(&trigger, true).await?;
            if self.waiter().is_visible_within(&option, Tier::Medium).await? {
                self.driver().click(&option).await?;
                let shown = self
                    .driver()
                    .element_state(&trigger)
                    .await?
                    .is_some_and(|s| s.text.contains(option_text));
                if shown {
                    tracing::debug!(dropdown = %dropdown, option = option_text, attempt, "option selected");
                    return Ok(());
                }
            }
            tracing::debug!(dropdown = %dropdown, option = option_text, attempt, "dropdown selection did not stick");
            self.waiter().settle(Tier::VeryShort).await;
        }
        Err(ErpError::locator_timeout(
            option.to_string(),
            "selected",
            self.policy().ms(Tier::Medium) * u64::from(attempts),
        )
        .with_context(format!("dropdown {dropdown}, {attempts} attempts")))
    }

    /// Open the popover menu of a table row, returning the menu locator
    pub async fn open_row_popover(&self, table: &Table, row: usize) -> ErpResult<Locator> {
        let trigger = table.row(row).locate(common::row_actions_button());
        let menu = Locator::from_selector(common::popover_menu()).with_tier(Tier::Short);
        let attempts = self.retries().popover_open.max(1);
        for attempt in 1..=attempts {
            self.click_when_ready(&trigger, true)
                .await
                .map_err(|e| e.with_context(format!("row {row}")))?;
            if self.waiter().is_visible_within(&menu, Tier::Short).await? {
                // the menu animates into place after it becomes visible
                self.waiter().settle(Tier::VeryShort).await;
                return Ok(menu);
            }
            tracing::debug!(row, attempt, "row popover did not open");
        }
        Err(ErpError::locator_timeout(menu.to_string(), "visible", self.policy().ms(Tier::Short))
            .with_context(format!("row {row}, {attempts} attempts")))
    }

    /// Click an item of the currently open row popover
    pub async fn click_popover_item(&self, action: &str) -> ErpResult<()> {
        let item = Locator::from_selector(common::popover_item(action)).with_tier(Tier::Short);
        self.click_when_ready(&item, false).await
    }

    /// Poll the notification region
    pub async fn read_notification(&self) -> ErpResult<Option<String>> {
        poll_notification(
            self.driver(),
            &common::notification(),
            self.retries().notification_polls,
            self.policy().get(Tier::VeryShort),
        )
        .await
    }

    /// Whether a form is still open after waiting a MEDIUM tier for it to close
    pub async fn form_still_open(&self, form_test_id: &str) -> ErpResult<bool> {
        match self.waiter().hidden(&Locator::test_id(form_test_id)).await {
            Ok(()) => Ok(false),
            Err(e) if e.is_timeout() => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Accept the confirmation modal and wait for it to close
    pub async fn confirm_modal(&self) -> ErpResult<()> {
        self.click_when_ready(&Locator::test_id(common::CONFIRM_YES), false)
            .await?;
        self.waiter()
            .hidden(&Locator::test_id(common::CONFIRM_MODAL))
            .await
    }
}

/// Wait for at least one data row on any page
pub(crate) async fn wait_for_rows(
    driver: &dyn PageDriver,
    table: &Table,
    timeout: Duration,
    poll: Duration,
) -> ErpResult<usize> {
    let rows = table.rows();
    let rows_ref = &rows;
    wait_for(&format!("rows of {rows}"), timeout, poll, || async move {
        Ok(driver.count(rows_ref).await? > 0)
    })
    .await
    .map_err(|e| match e {
        ErpError::Timeout { ms, .. } => ErpError::locator_timeout(rows.to_string(), "attached", ms),
        other => other,
    })?;
    driver.count(&rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErpConfig;
    use crate::mock::{MockDriver, MockElement, MockEvent};
    use tempfile::TempDir;

    struct Fixture {
        driver: Arc<MockDriver>,
        session: Session,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let driver = Arc::new(MockDriver::new());
        let config = ErpConfig {
            artifacts_dir: dir.path().to_path_buf(),
            ..ErpConfig::default()
        };
        let session = Session::new(Arc::clone(&driver) as Arc<dyn PageDriver>, config);
        Fixture {
            driver,
            session,
            _dir: dir,
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_find_and_open_waits_for_idle() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Sidebar-Link-Warehouse"));
            f.session.find_and_open("Sidebar-Link-Warehouse").await.unwrap();
            let history = f.driver.history();
            let click = history.iter().position(|c| c.starts_with("click:")).unwrap();
            let idle = history.iter().position(|c| c == "load:networkidle").unwrap();
            assert!(click < idle);
        }

        #[tokio::test(start_paused = true)]
        async fn test_find_and_open_hidden_link_times_out() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Sidebar-Link-Warehouse").hidden());
            let err = f.session.find_and_open("Sidebar-Link-Warehouse").await.unwrap_err();
            assert!(matches!(err, ErpError::LocatorTimeout { ms: 10_000, .. }));
            assert!(!f.driver.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_route() {
            let f = fixture();
            f.session.open_route("warehouse").await.unwrap();
            assert!(f.driver.was_called("goto:http://localhost:8080/warehouse"));
        }
    }

    mod table_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_table_body_sees_late_rows() {
            let f = fixture();
            let root = f.driver.add(MockElement::test_id("Users-Table"));
            let table = Table::test_id("Users-Table");
            let driver = Arc::clone(&f.driver);
            let late = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                driver.add(MockElement::css(common::BODY_ROW).with_text("row").child_of(root));
            });
            assert_eq!(f.session.wait_for_table_body(&table).await.unwrap(), 1);
            late.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_empty_table_times_out_with_selector() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Users-Table"));
            let err = f
                .session
                .wait_for_table_body(&Table::test_id("Users-Table"))
                .await
                .unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("Users-Table"));
            assert!(msg.contains("tbody tr"));
        }
    }

    mod input_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_fill_and_verify_echo() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Qty").with_value(""));
            f.session.begin_step("fill");
            assert!(f.session.fill_and_verify(&Locator::test_id("Qty"), "5").await.unwrap());
            assert!(f.session.verify_soft().is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn test_fill_and_verify_records_soft_failure() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Qty").with_value("1").read_only());
            f.session.begin_step("fill");
            assert!(!f.session.fill_and_verify(&Locator::test_id("Qty"), "5").await.unwrap());
            assert_eq!(f.session.soft_failure_count(), 1);
            assert!(f.driver.was_called("screenshot"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_when_ready_waits_for_enabled() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Save").disabled());
            let driver = Arc::clone(&f.driver);
            let enable = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                driver.with_dom(|dom| dom.set_enabled(&Selector::test_id("Save"), true));
            });
            f.session.click_when_ready(&Locator::test_id("Save"), true).await.unwrap();
            enable.await.unwrap();
            let history = f.driver.history();
            assert_eq!(history, vec!["scroll:[data-testid=\"Save\"]", "click:[data-testid=\"Save\"]"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_types_each_key() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Search").with_value("old"));
            f.session
                .search_sequential(&Locator::test_id("Search"), "ERP", SearchOptions::default())
                .await
                .unwrap();
            assert_eq!(f.driver.call_count("key:"), 3);
            let value = f.driver.with_dom(|dom| dom.value_of(&Selector::test_id("Search")));
            assert_eq!(value.as_deref(), Some("ERP"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_timeout() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Search"));
            let options = SearchOptions {
                timeout: Duration::from_millis(100),
                ..SearchOptions::default()
            };
            let err = f
                .session
                .search_sequential(&Locator::test_id("Search"), "ERPTEST", options)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod highlight_tests {
        use super::*;

        #[test]
        fn test_style_uses_outline_only() {
            let css = HighlightStyle::default().to_css();
            assert!(css.contains("outline:"));
            assert!(!css.contains("border"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_highlight_after_click_when_enabled() {
            let dir = TempDir::new().unwrap();
            let driver = Arc::new(MockDriver::new());
            let mut config = ErpConfig {
                artifacts_dir: dir.path().to_path_buf(),
                ..ErpConfig::default()
            };
            config.browser.highlight_actions = true;
            let session = Session::new(Arc::clone(&driver) as Arc<dyn PageDriver>, config);
            driver.add(MockElement::test_id("Save"));
            session.click_when_ready(&Locator::test_id("Save"), false).await.unwrap();
            let history = driver.history();
            assert!(history[0].starts_with("click:"));
            assert!(history[1].starts_with("style:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_no_highlight_when_click_fails() {
            let dir = TempDir::new().unwrap();
            let driver = Arc::new(MockDriver::new());
            let mut config = ErpConfig {
                artifacts_dir: dir.path().to_path_buf(),
                ..ErpConfig::default()
            };
            config.browser.highlight_actions = true;
            let session = Session::new(Arc::clone(&driver) as Arc<dyn PageDriver>, config);
            driver.add(MockElement::test_id("Save").disabled());
            assert!(session.click_when_ready(&Locator::test_id("Save"), false).await.is_err());
            assert!(!driver.was_called("style:"));
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_open_in_new_page() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Details"));
            f.driver.on_click(Selector::test_id("Details"), |dom, _| {
                let page = MockDriver::new();
                page.add(MockElement::test_id("Lots"));
                dom.open_page(page);
            });
            let page = f.session.open_in_new_page(&Locator::test_id("Details")).await.unwrap();
            assert_eq!(page.count(&Selector::test_id("Lots")).await.unwrap(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_in_new_page_times_out() {
            let f = fixture();
            f.driver.add(MockElement::test_id("Details"));
            let err = f
                .session
                .open_in_new_page(&Locator::test_id("Details"))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod dropdown_tests {
        use super::*;
        use crate::selectors::users;

        fn role_dropdown(f: &Fixture, open_after_clicks: u32) {
            let dropdown = f.driver.add(MockElement::test_id("UserForm-Role-Select-v7-Dropdown"));
            let option = f
                .driver
                .add(MockElement::test_id("Dropdown-Option-3").with_text("Кладовщик").hidden());
            let mut clicks = 0;
            f.driver.on_click(users::role_dropdown(), move |dom, _| {
                clicks += 1;
                if clicks >= open_after_clicks {
                    if let Some(el) = dom.get_mut(option) {
                        el.visible = true;
                    }
                }
            });
            f.driver.on(MockEvent::Click, Selector::test_id("Dropdown-Option-3"), move |dom, _| {
                if let Some(el) = dom.get_mut(dropdown) {
                    el.text = "Кладовщик".into();
                }
            });
        }

        #[tokio::test(start_paused = true)]
        async fn test_selects_option_across_versions() {
            let f = fixture();
            role_dropdown(&f, 1);
            f.session
                .select_dropdown_option(&users::role_dropdown(), "Кладовщик")
                .await
                .unwrap();
            assert_eq!(f.driver.call_count("click:"), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_retries_when_list_is_slow() {
            let f = fixture();
            role_dropdown(&f, 2);
            f.session
                .select_dropdown_option(&users::role_dropdown(), "Кладовщик")
                .await
                .unwrap();
            assert_eq!(f.driver.call_count("click:[data-testid^=\"UserForm-Role-Select-v\"]"), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_gives_up_after_retries() {
            let f = fixture();
            role_dropdown(&f, 99);
            let err = f
                .session
                .select_dropdown_option(&users::role_dropdown(), "Кладовщик")
                .await
                .unwrap_err();
            assert!(err.to_string().contains("3 attempts"));
        }
    }

    mod popover_tests {
        use super::*;

        fn orders_table(f: &Fixture, opens: bool) -> Table {
            let root = f.driver.add(MockElement::test_id("ProductionOrders-Table"));
            for n in ["1024", "1025"] {
                let row = f.driver.add(MockElement::css(common::BODY_ROW).with_text(n).child_of(root));
                f.driver.add(MockElement::test_id("RowActions-v2-Button").child_of(row));
            }
            let menu = f.driver.add(MockElement::test_id("Popover-v4-Menu").hidden());
            f.driver.add(MockElement::test_id("Popover-Item-Complete").child_of(menu));
            if opens {
                f.driver.on_click(common::row_actions_button(), move |dom, _| {
                    if let Some(el) = dom.get_mut(menu) {
                        el.visible = true;
                    }
                });
            }
            Table::test_id("ProductionOrders-Table")
        }

        #[tokio::test(start_paused = true)]
        async fn test_opens_popover_of_row() {
            let f = fixture();
            let table = orders_table(&f, true);
            f.session.open_row_popover(&table, 1).await.unwrap();
            f.session.click_popover_item("Complete").await.unwrap();
            assert!(f.driver.was_called("click:[data-testid^=\"Popover-v\"]"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_popover_failure_names_row() {
            let f = fixture();
            let table = orders_table(&f, false);
            let err = f.session.open_row_popover(&table, 1).await.unwrap_err();
            assert!(err.to_string().contains("row 1, 3 attempts"));
        }
    }

    mod notification_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_form_still_open() {
            let f = fixture();
            f.driver.add(MockElement::test_id("UserForm-Modal"));
            assert!(f.session.form_still_open("UserForm-Modal").await.unwrap());
            f.driver.with_dom(|dom| dom.set_visible(&Selector::test_id("UserForm-Modal"), false));
            assert!(!f.session.form_still_open("UserForm-Modal").await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_form_still_open_on_closed_page_is_an_error() {
            let f = fixture();
            f.driver.add(MockElement::test_id("UserForm-Modal"));
            f.driver.close().await.unwrap();
            let err = f.session.form_still_open("UserForm-Modal").await.unwrap_err();
            assert!(matches!(err, ErpError::PageError { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_confirm_modal() {
            let f = fixture();
            let modal = f.driver.add(MockElement::test_id(common::CONFIRM_MODAL));
            f.driver.add(MockElement::test_id(common::CONFIRM_YES).child_of(modal));
            f.driver.on_click(Selector::test_id(common::CONFIRM_YES), move |dom, _| dom.detach(modal));
            f.session.confirm_modal().await.unwrap();
        }
    }
}
