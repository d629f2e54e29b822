//! Shipping tasks: one row per order ready to ship.

use super::{row_by_number, submit_form};
use crate::config::routes;
use crate::locator::{Locator, Selector};
use crate::page_object::PageObject;
use crate::result::ErpResult;
use crate::selectors::shipping;
use crate::session::Session;
use crate::table::{CountCell, Table};

/// Column holding the order number
pub const ORDER_COLUMN: usize = 0;

/// Shipping tasks list
#[derive(Debug, Clone, Copy)]
pub struct ShippingPage<'a> {
    session: &'a Session,
}

impl PageObject for ShippingPage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::SHIPPING_TASKS
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(shipping::TASKS_TABLE)
    }
}

impl<'a> ShippingPage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Tasks table
    #[must_use]
    pub fn tasks() -> Table {
        Table::test_id(shipping::TASKS_TABLE)
    }

    /// Ship `quantity` units of an order
    pub async fn ship_order(&self, order: &str, quantity: u32) -> ErpResult<()> {
        let session = self.session;
        let row = row_by_number(session, &Self::tasks(), ORDER_COLUMN, order).await?;
        session
            .click_when_ready(&Locator::test_id(shipping::ship_button(row)), true)
            .await
            .map_err(|e| e.with_context(format!("order {order}")))?;
        session
            .waiter()
            .visible(&Locator::test_id(shipping::SHIP_FORM))
            .await?;
        session
            .fill_and_verify(&Locator::test_id(shipping::SHIP_QUANTITY_INPUT), &quantity.to_string())
            .await?;
        submit_form(session, shipping::SHIP_CONFIRM, shipping::SHIP_FORM).await?;
        session.annotate(format!("order {order}: shipped {quantity}"));
        Ok(())
    }

    /// Shipped/total units of an order
    pub async fn shipped_count(&self, order: &str) -> ErpResult<CountCell> {
        let row = row_by_number(self.session, &Self::tasks(), ORDER_COLUMN, order).await?;
        Self::tasks()
            .count_cell(self.session.driver(), row, shipping::SHIPPED_COLUMN, "shipped", order)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::mock::MockElement;
    use crate::selectors::common;

    fn tasks(h: &Harness, shipped: &'static str) {
        notification(&h.driver);
        let (_root, rows) = table(&h.driver, shipping::TASKS_TABLE, &["№1030", "№1031"]);
        cells(&h.driver, rows[0], &["№1030", "ERPTEST_PRODUCT_t_1", "0 / 5"]);
        cells(&h.driver, rows[1], &["№1031", "ERPTEST_PRODUCT_t_1", "0 / 10"]);
        h.driver.add(MockElement::test_id(shipping::ship_button(1)));
        let form = h.driver.add(MockElement::test_id(shipping::SHIP_FORM).hidden());
        h.driver.add(
            MockElement::test_id(shipping::SHIP_QUANTITY_INPUT)
                .with_value("")
                .child_of(form),
        );
        h.driver
            .add(MockElement::test_id(shipping::SHIP_CONFIRM).child_of(form));
        opens(&h.driver, &shipping::ship_button(1), form);
        h.driver.on_click(Selector::test_id(shipping::SHIP_CONFIRM), move |dom, _| {
            dom.set_visible(&Selector::test_id(shipping::SHIP_FORM), false);
            dom.set_text(&Selector::test_id(common::NOTIFICATION), "Отгрузка выполнена");
            let cell = Table::test_id(shipping::TASKS_TABLE)
                .cell(1, shipping::SHIPPED_COLUMN)
                .pinned();
            dom.set_text(&cell, shipped);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_ship_order_updates_count() {
        let h = harness();
        tasks(&h, "10 / 10");
        let page = ShippingPage::new(&h.session);
        assert_eq!(page.shipped_count("1031").await.unwrap().left, 0);
        page.ship_order("1031", 10).await.unwrap();
        let after = page.shipped_count("1031").await.unwrap();
        assert_eq!(after.left, 10);
        assert_eq!(after.total(), 10);
        assert!(h.driver.was_called("click:[data-testid=\"ShippingTasks-Row1-Ship\"]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ship_unknown_order() {
        let h = harness();
        tasks(&h, "0 / 10");
        let err = ShippingPage::new(&h.session).ship_order("2000", 1).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("order 2000"));
    }
}
