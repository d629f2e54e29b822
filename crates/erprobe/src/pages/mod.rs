//! Page objects of the application.
//!
//! Each page borrows the [`Session`] of the scenario running it. List pages
//! share one archive flow, implemented here by [`UiArchiveTable`] over the
//! common toolbar (search input, archive button) and row checkboxes.

pub mod equipment;
pub mod materials;
pub mod production;
pub mod shipping;
pub mod users;
pub mod warehouse;

pub use equipment::{EquipmentForm, EquipmentPage};
pub use materials::{MaterialForm, MaterialsPage};
pub use production::{OrderCounts, ProductionPage};
pub use shipping::ShippingPage;
pub use users::{CreatedUser, UserForm, UsersPage};
pub use warehouse::{Reconciliation, WarehousePage};

use crate::cleanup::{ArchiveTable, CleanupReport, CleanupTarget, PrefixCleanup};
use crate::fixture::FixtureKind;
use crate::interact::SearchOptions;
use crate::locator::{Locator, Selector};
use crate::result::{ErpError, ErpResult};
use crate::selectors::common;
use crate::session::Session;
use crate::table::Table;
use crate::timeouts::Tier;
use async_trait::async_trait;

/// A rendered list page seen through its toolbar and rows
#[derive(Debug)]
pub struct UiArchiveTable<'a> {
    session: &'a Session,
    table: Table,
}

impl<'a> UiArchiveTable<'a> {
    /// Archive rows of `table` on the current page
    #[must_use]
    pub const fn new(session: &'a Session, table: Table) -> Self {
        Self { session, table }
    }

    fn archive_button() -> Locator {
        Locator::test_id(common::ARCHIVE_BUTTON)
    }
}

#[async_trait]
impl ArchiveTable for UiArchiveTable<'_> {
    async fn row_count(&self) -> ErpResult<usize> {
        self.table.row_count(self.session.driver()).await
    }

    async fn search(&self, text: &str) -> ErpResult<()> {
        self.session
            .search_sequential(&Locator::test_id(common::SEARCH_INPUT), text, SearchOptions::default())
            .await
    }

    async fn row_text(&self, row: usize) -> ErpResult<String> {
        let locator = self.table.row(row);
        self.session
            .driver()
            .element_state(&locator)
            .await?
            .map(|s| s.text)
            .ok_or_else(|| {
                ErpError::locator_timeout(locator.to_string(), "attached", 0)
                    .with_context(format!("row {row}"))
            })
    }

    async fn select_row(&self, row: usize) -> ErpResult<()> {
        let checkbox = self.table.row(row).locate(Selector::css(common::ROW_CHECKBOX));
        self.session
            .click_when_ready(&checkbox, true)
            .await
            .map_err(|e| e.with_context(format!("row {row}")))
    }

    async fn archive_enabled(&self) -> ErpResult<bool> {
        Ok(self
            .session
            .driver()
            .element_state(&Self::archive_button())
            .await?
            .is_some_and(|s| s.visible && s.enabled))
    }

    async fn open_archive(&self) -> ErpResult<()> {
        self.session.driver().click(&Self::archive_button()).await
    }

    async fn confirm_archive(&self) -> ErpResult<()> {
        self.session.confirm_modal().await
    }
}

/// Click a form's save button and require the form to close
///
/// Returns the notification shown, if any. A form that stays open is a
/// `FixtureError` carrying that notification.
pub async fn submit_form(session: &Session, save_button: &str, form: &str) -> ErpResult<Option<String>> {
    session
        .click_when_ready(&Locator::test_id(save_button), false)
        .await?;
    let notification = session.read_notification().await?;
    if session.form_still_open(form).await? {
        tracing::warn!(form, notification = notification.as_deref().unwrap_or("<none>"), "form did not close");
        return Err(ErpError::FixtureError {
            message: format!(
                "{form} still open after save: {}",
                notification.as_deref().unwrap_or("no notification")
            ),
        });
    }
    Ok(notification)
}

/// Row whose numbered cell (`№1024` or `1024`) equals `number`
pub async fn row_by_number(session: &Session, table: &Table, column: usize, number: &str) -> ErpResult<usize> {
    let rows = session.wait_for_table_body(table).await?;
    for row in 0..rows {
        let cell = table.cell_text(session.driver(), row, column).await?;
        if cell.trim_start_matches('№').trim() == number {
            return Ok(row);
        }
    }
    Err(ErpError::locator_timeout(
        table.row_with_text(number).to_string(),
        "attached",
        session.policy().ms(Tier::Standard),
    )
    .with_context(format!("order {number}")))
}

/// Archive the rows of `table` matching `target` on the page already open
pub async fn archive_in_table(session: &Session, table: Table, target: &CleanupTarget) -> ErpResult<CleanupReport> {
    let ui = UiArchiveTable::new(session, table);
    PrefixCleanup::new(session.config().cleanup).run(&ui, target).await
}

/// Open the page owning `kind` and archive the rows matching `target`
pub async fn archive_fixtures(session: &Session, kind: FixtureKind, target: &CleanupTarget) -> ErpResult<CleanupReport> {
    tracing::info!(%kind, prefix = target.search_text(), "archiving fixtures");
    match kind {
        FixtureKind::User => UsersPage::new(session).archive_by_prefix(target).await,
        FixtureKind::Material => MaterialsPage::new(session).archive_by_prefix(target).await,
        FixtureKind::Equipment => EquipmentPage::new(session).archive_by_prefix(target).await,
        FixtureKind::Order => ProductionPage::new(session).archive_orders(target).await,
        FixtureKind::Product | FixtureKind::Assembly | FixtureKind::Detail => {
            ProductionPage::new(session).archive_by_prefix(kind, target).await
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::selectors::materials;

    #[tokio::test(start_paused = true)]
    async fn test_archive_in_table_removes_only_prefixed_rows() {
        let h = harness();
        let (_root, rows) = table(
            &h.driver,
            materials::TABLE,
            &["ERPTEST_MATERIAL_a_1", "Steel 40X", "ERPTEST_MATERIAL_a_2"],
        );
        archive_toolbar(&h.driver, &rows);
        let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
        let report = archive_in_table(&h.session, Table::test_id(materials::TABLE), &target)
            .await
            .unwrap();
        assert_eq!(report.archived, vec!["ERPTEST_MATERIAL_a_2", "ERPTEST_MATERIAL_a_1"]);
        assert!(report.is_clean());
        let remaining = h
            .driver
            .with_dom(|dom| dom.resolve(&Table::test_id(materials::TABLE).rows()).len());
        assert_eq!(remaining, 0);
        assert_eq!(h.driver.call_count("click:[data-testid=\"ModalConfirm-Button-Yes\"]"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_archive_in_table_records_disabled_control() {
        let h = harness();
        let (_root, rows) = table(&h.driver, materials::TABLE, &["ERPTEST_MATERIAL_a_1"]);
        archive_toolbar(&h.driver, &rows);
        h.driver
            .with_dom(|dom| dom.set_enabled(&Selector::test_id(common::ARCHIVE_BUTTON), false));
        let target = CleanupTarget::prefix("ERPTEST_MATERIAL").unwrap();
        let report = archive_in_table(&h.session, Table::test_id(materials::TABLE), &target)
            .await
            .unwrap();
        assert!(report.archived.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("row 0"));
    }
}
