//! Warehouse stock list, receipts and the per-material drill-down.

use super::submit_form;
use crate::config::routes;
use crate::driver::PageDriver;
use crate::interact::wait_for_rows;
use crate::locator::{Locator, Selector};
use crate::network::ResponseWatcher;
use crate::page_object::PageObject;
use crate::result::{ErpError, ErpResult};
use crate::selectors::warehouse;
use crate::session::Session;
use crate::table::Table;
use crate::timeouts::Tier;
use crate::wait::LoadState;
use serde::{Deserialize, Serialize};

/// UI and API counts of one drill-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Material checked
    pub material: String,
    /// Rows rendered in the drill-down
    pub ui_rows: usize,
    /// Entities in the API response behind it
    pub api_entities: usize,
}

impl Reconciliation {
    /// Both sides agree
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.ui_rows == self.api_entities
    }
}

/// Warehouse stock list
#[derive(Debug, Clone, Copy)]
pub struct WarehousePage<'a> {
    session: &'a Session,
}

impl PageObject for WarehousePage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::WAREHOUSE
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(warehouse::STOCK_TABLE)
    }
}

impl<'a> WarehousePage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Stock table
    #[must_use]
    pub fn stock() -> Table {
        Table::test_id(warehouse::STOCK_TABLE)
    }

    /// Post a receipt of `quantity` units of `material`
    pub async fn receive_stock(&self, material: &str, quantity: u32) -> ErpResult<()> {
        let session = self.session;
        session
            .click_when_ready(&Locator::test_id(warehouse::RECEIVE_BUTTON), false)
            .await?;
        session
            .waiter()
            .visible(&Locator::test_id(warehouse::RECEIPT_FORM))
            .await?;
        session
            .select_dropdown_option(&warehouse::material_dropdown(), material)
            .await?;
        session
            .fill_and_verify(&Locator::test_id(warehouse::RECEIPT_QUANTITY_INPUT), &quantity.to_string())
            .await?;
        submit_form(session, warehouse::RECEIPT_SAVE, warehouse::RECEIPT_FORM).await?;
        session.annotate(format!("received {quantity} x {material}"));
        Ok(())
    }

    async fn material_row(&self, material: &str) -> ErpResult<usize> {
        let table = Self::stock();
        self.session.wait_for_table_body(&table).await?;
        table
            .find_row(self.session.driver(), material)
            .await?
            .ok_or_else(|| {
                ErpError::locator_timeout(
                    table.row_with_text(material).to_string(),
                    "attached",
                    self.session.policy().ms(Tier::Standard),
                )
                .with_context(format!("material {material}"))
            })
    }

    /// Quantity on hand of a material
    pub async fn stock_count(&self, material: &str) -> ErpResult<u64> {
        let row = self.material_row(material).await?;
        let cell = Self::stock()
            .count_cell(self.session.driver(), row, warehouse::QUANTITY_COLUMN, "quantity", material)
            .await?;
        Ok(cell.left)
    }

    /// Compare the lots the drill-down renders with the entities its API returned
    ///
    /// The drill-down opens in a new tab. Responses are captured on that tab
    /// and the tab reloaded, so the API call is observed in full. A mismatch
    /// is a soft failure of the current step.
    pub async fn reconcile(&self, material: &str) -> ErpResult<Reconciliation> {
        let session = self.session;
        let row = self.material_row(material).await?;
        let link = Locator::test_id(warehouse::details_link(row));
        let page = session.open_in_new_page(&link).await?;

        let counted = self.drill_down_counts(page.as_ref()).await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "drill-down page did not close cleanly");
        }
        let (ui_rows, api_entities) = counted?;
        session
            .soft_cross_check(&format!("lots of {material}"), ui_rows, api_entities)
            .await;
        tracing::info!(material, ui_rows, api_entities, "drill-down reconciled");
        Ok(Reconciliation {
            material: material.to_string(),
            ui_rows,
            api_entities,
        })
    }

    /// Reload the drill-down tab and count its rows and API entities
    async fn drill_down_counts(&self, page: &dyn PageDriver) -> ErpResult<(usize, usize)> {
        let policy = self.session.policy();
        let long = policy.get(Tier::Long);
        let stream = page.capture_responses(warehouse::DETAILS_API_FRAGMENT).await?;
        let mut watcher = ResponseWatcher::new(warehouse::DETAILS_API_FRAGMENT, stream);
        let url = page.current_url().await?;
        page.goto(&url).await?;
        page.wait_for_load_state(LoadState::NetworkIdle, long).await?;
        let api_entities = watcher.next_count(long).await?;

        let lots = Table::test_id(warehouse::DETAILS_TABLE).headerless();
        let ui_rows = if api_entities == 0 {
            lots.row_count(page).await?
        } else {
            wait_for_rows(page, &lots, policy.get(Tier::Standard), policy.poll_interval()).await?
        };
        Ok((ui_rows, api_entities))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::driver::CapturedResponse;
    use crate::mock::{MockDriver, MockElement};
    use crate::selectors::common;
    use std::sync::Arc;

    fn stock(h: &Harness) {
        let (_root, rows) = table(
            &h.driver,
            warehouse::STOCK_TABLE,
            &["Steel 40X kg 120", "ERPTEST_MATERIAL_t_1 pcs 15"],
        );
        cells(&h.driver, rows[0], &["Steel 40X", "kg", "120"]);
        cells(&h.driver, rows[1], &["ERPTEST_MATERIAL_t_1", "pcs", "15"]);
    }

    fn drill_down(h: &Harness, ui_lots: usize, api_lots: usize) {
        h.driver
            .add(MockElement::test_id(warehouse::details_link(1)));
        h.driver.on_click(Selector::test_id(warehouse::details_link(1)), move |dom, _| {
            let page = MockDriver::new();
            let root = page.add(MockElement::test_id(warehouse::DETAILS_TABLE));
            for lot in 0..ui_lots {
                page.add(
                    MockElement::css(common::DIRECT_ROW)
                        .with_text(format!("lot {lot}"))
                        .child_of(root),
                );
            }
            let data: Vec<u32> = (0..api_lots as u32).collect();
            page.respond_on_goto(CapturedResponse {
                url: "http://localhost:8080/api/warehouse/stock/17/lots".into(),
                status: 200,
                body: serde_json::json!({ "data": data, "total": 99 }).to_string(),
            });
            dom.open_page(page);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stock_count() {
        let h = harness();
        stock(&h);
        let page = WarehousePage::new(&h.session);
        assert_eq!(page.stock_count("ERPTEST_MATERIAL_t_1").await.unwrap(), 15);
        let err = page.stock_count("Copper").await.unwrap_err();
        assert!(err.to_string().contains("material Copper"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_agreeing_counts() {
        let h = harness();
        stock(&h);
        drill_down(&h, 3, 3);
        h.session.begin_step("reconcile");
        let result = WarehousePage::new(&h.session)
            .reconcile("ERPTEST_MATERIAL_t_1")
            .await
            .unwrap();
        assert!(result.matches());
        assert_eq!(result.api_entities, 3);
        assert!(h.session.verify_soft().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_mismatch_is_soft() {
        let h = harness();
        stock(&h);
        drill_down(&h, 2, 3);
        h.session.begin_step("reconcile");
        let result = WarehousePage::new(&h.session)
            .reconcile("ERPTEST_MATERIAL_t_1")
            .await
            .unwrap();
        assert!(!result.matches());
        assert_eq!(h.session.soft_failure_count(), 1);
        let notes = h.session.finish_step();
        assert!(notes.soft_failures[0].screenshot.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_closes_tab_when_api_is_silent() {
        let h = harness();
        stock(&h);
        let tab = Arc::new(MockDriver::new());
        tab.add(MockElement::test_id(warehouse::DETAILS_TABLE));
        h.driver
            .add(MockElement::test_id(warehouse::details_link(1)));
        let opened = Arc::clone(&tab);
        h.driver.on_click(Selector::test_id(warehouse::details_link(1)), move |dom, _| {
            dom.open_page(Arc::clone(&opened));
        });
        let err = WarehousePage::new(&h.session)
            .reconcile("ERPTEST_MATERIAL_t_1")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(tab.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_stock() {
        let h = harness();
        notification(&h.driver);
        h.driver.add(MockElement::test_id(warehouse::RECEIVE_BUTTON));
        let form = h.driver.add(MockElement::test_id(warehouse::RECEIPT_FORM).hidden());
        let dropdown = h.driver.add(
            MockElement::test_id("ReceiptForm-Material-Select-v9-Dropdown").child_of(form),
        );
        h.driver
            .add(MockElement::test_id("Dropdown-Option-5").with_text("ERPTEST_MATERIAL_t_1"));
        h.driver.add(
            MockElement::test_id(warehouse::RECEIPT_QUANTITY_INPUT)
                .with_value("")
                .child_of(form),
        );
        h.driver
            .add(MockElement::test_id(warehouse::RECEIPT_SAVE).child_of(form));
        opens(&h.driver, warehouse::RECEIVE_BUTTON, form);
        h.driver.on_click(Selector::test_id("Dropdown-Option-5"), move |dom, _| {
            if let Some(el) = dom.get_mut(dropdown) {
                el.text = "ERPTEST_MATERIAL_t_1".into();
            }
        });
        h.driver.on_click(Selector::test_id(warehouse::RECEIPT_SAVE), |dom, _| {
            dom.set_text(&Selector::test_id(common::NOTIFICATION), "Приход сохранен");
            dom.set_visible(&Selector::test_id(warehouse::RECEIPT_FORM), false);
        });
        WarehousePage::new(&h.session)
            .receive_stock("ERPTEST_MATERIAL_t_1", 15)
            .await
            .unwrap();
        assert!(h.driver.was_called("fill:[data-testid=\"ReceiptForm-Input-Quantity\"]=15"));
    }
}
