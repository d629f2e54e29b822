//! Production orders and the product catalogue.

use super::{row_by_number, submit_form};
use crate::cleanup::{CleanupReport, CleanupTarget};
use crate::config::routes;
use crate::fixture::FixtureKind;
use crate::locator::{Locator, Selector};
use crate::page_object::PageObject;
use crate::result::{ErpError, ErpResult};
use crate::selectors::production;
use crate::session::Session;
use crate::table::{CountCell, Table};
use crate::timeouts::Tier;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Made and planned units of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCounts {
    /// Units produced so far
    pub made: u64,
    /// Units planned, when the cell shows `made / planned`
    pub planned: Option<u64>,
}

impl From<CountCell> for OrderCounts {
    fn from(cell: CountCell) -> Self {
        Self {
            made: cell.left,
            planned: cell.right,
        }
    }
}

impl OrderCounts {
    /// Every planned unit is made
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.planned.is_some_and(|planned| self.made >= planned)
    }
}

fn order_number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"№\s*(\d+)").ok())
        .as_ref()
}

/// Order number quoted in a notification (`Заказ №1024 запущен`)
#[must_use]
pub fn order_number_in(text: &str) -> Option<String> {
    order_number_pattern()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn catalogue_tab(kind: FixtureKind) -> ErpResult<&'static str> {
    match kind {
        FixtureKind::Product => Ok("Product"),
        FixtureKind::Assembly => Ok("Assembly"),
        FixtureKind::Detail => Ok("Detail"),
        other => Err(ErpError::FixtureError {
            message: format!("{other} fixtures are not listed in the product catalogue"),
        }),
    }
}

/// Production orders list
#[derive(Debug, Clone, Copy)]
pub struct ProductionPage<'a> {
    session: &'a Session,
}

impl PageObject for ProductionPage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::PRODUCTION
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(production::ORDERS_TABLE)
    }
}

impl<'a> ProductionPage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Orders table
    #[must_use]
    pub fn orders() -> Table {
        Table::test_id(production::ORDERS_TABLE)
    }

    /// Launch an order for `quantity` units of `product`, returning its number
    pub async fn launch_order(&self, product: &str, quantity: u32) -> ErpResult<String> {
        self.launch_order_with_note(product, quantity, None).await
    }

    /// Launch an order with a note shown in its row
    ///
    /// The number is read from the confirmation notification, falling back
    /// to the first row of the list (newest first).
    pub async fn launch_order_with_note(&self, product: &str, quantity: u32, note: Option<&str>) -> ErpResult<String> {
        let session = self.session;
        session
            .click_when_ready(&Locator::test_id(production::LAUNCH_BUTTON), false)
            .await?;
        session
            .waiter()
            .visible(&Locator::test_id(production::LAUNCH_FORM))
            .await?;
        session
            .select_dropdown_option(&production::product_dropdown(), product)
            .await?;
        session
            .fill_and_verify(&Locator::test_id(production::LAUNCH_QUANTITY_INPUT), &quantity.to_string())
            .await?;
        if let Some(note) = note {
            session
                .fill_and_verify(&Locator::test_id(production::LAUNCH_NOTE_INPUT), note)
                .await?;
        }
        let notification = submit_form(session, production::LAUNCH_SUBMIT, production::LAUNCH_FORM).await?;

        let number = match notification.as_deref().and_then(order_number_in) {
            Some(number) => number,
            None => {
                tracing::debug!(?notification, "order number not in notification, reading first row");
                session.wait_for_table_body(&Self::orders()).await?;
                Self::orders()
                    .cell_text(session.driver(), 0, production::ORDER_NUMBER_COLUMN)
                    .await?
                    .trim_start_matches('№')
                    .trim()
                    .to_string()
            }
        };
        session.annotate(format!("order {number}: {quantity} x {product}"));
        tracing::info!(order = %number, product, quantity, "order launched");
        Ok(number)
    }

    /// Row index of an order, matched on the order-number cell
    pub async fn order_row(&self, order: &str) -> ErpResult<usize> {
        row_by_number(self.session, &Self::orders(), production::ORDER_NUMBER_COLUMN, order).await
    }

    /// Mark an order complete through its row popover
    pub async fn complete_order(&self, order: &str) -> ErpResult<()> {
        let row = self.order_row(order).await?;
        self.session.open_row_popover(&Self::orders(), row).await?;
        self.session.click_popover_item(production::ACTION_COMPLETE).await?;
        self.session.confirm_modal().await?;
        let notification = self.session.read_notification().await?;
        tracing::info!(order, ?notification, "order completed");
        Ok(())
    }

    /// Disassemble `quantity` produced units of an order
    pub async fn disassemble_order(&self, order: &str, quantity: u32) -> ErpResult<()> {
        let session = self.session;
        let row = self.order_row(order).await?;
        session.open_row_popover(&Self::orders(), row).await?;
        session.click_popover_item(production::ACTION_DISASSEMBLE).await?;
        session
            .waiter()
            .visible(&Locator::test_id(production::DISASSEMBLE_FORM))
            .await?;
        session
            .fill_and_verify(
                &Locator::test_id(production::DISASSEMBLE_QUANTITY_INPUT),
                &quantity.to_string(),
            )
            .await?;
        submit_form(session, production::DISASSEMBLE_SUBMIT, production::DISASSEMBLE_FORM).await?;
        session.annotate(format!("order {order}: disassembled {quantity}"));
        Ok(())
    }

    /// Made/planned counts of an order
    pub async fn order_counts(&self, order: &str) -> ErpResult<OrderCounts> {
        let row = self.order_row(order).await?;
        let cell = Self::orders()
            .count_cell(
                self.session.driver(),
                row,
                production::ORDER_COUNT_COLUMN,
                "made / planned",
                order,
            )
            .await?;
        Ok(cell.into())
    }

    /// Archive orders matching `target`
    pub async fn archive_orders(&self, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        self.open().await?;
        super::archive_in_table(self.session, Self::orders(), target).await
    }

    /// Archive products, assemblies or details matching `target`
    pub async fn archive_by_prefix(&self, kind: FixtureKind, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        let tab = catalogue_tab(kind)?;
        let session = self.session;
        session.open_route(routes::PRODUCTS).await?;
        session
            .click_when_ready(
                &Locator::test_id(production::products_tab(tab)).with_tier(Tier::Standard),
                false,
            )
            .await?;
        session
            .waiter()
            .visible(&Locator::test_id(production::PRODUCTS_TABLE).with_tier(Tier::Standard))
            .await?;
        super::archive_in_table(session, Table::test_id(production::PRODUCTS_TABLE), target).await
    }
}
