//! Equipment catalogue.
//!
//! Inventory numbers are unique like personnel table numbers, so creation
//! reuses the conflict-retry loop with an inventory keyword set.

use crate::cleanup::{CleanupReport, CleanupTarget};
use crate::config::routes;
use crate::conflict::{ConflictRetry, ConflictSubmission, Observation};
use crate::locator::{Locator, Selector};
use crate::notification::ConflictMatcher;
use crate::page_object::PageObject;
use crate::result::ErpResult;
use crate::selectors::equipment;
use crate::session::Session;
use crate::table::Table;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field name used in conflict diagnostics
pub const INVENTORY_FIELD: &str = "inventory number";

/// Keywords naming the inventory-number field in notifications
pub const INVENTORY_KEYWORDS: &[&str] = &["инвентарн", "inventory"];

/// Values typed into the equipment form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentForm {
    /// Name (carries the fixture prefix)
    pub name: String,
    /// Equipment type option text
    pub kind: Option<String>,
    /// First inventory number tried
    pub inventory_start: u32,
}

impl EquipmentForm {
    /// Form for a fixture named `name`
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            inventory_start: 9_999,
        }
    }
}

/// Equipment list and form
#[derive(Debug, Clone, Copy)]
pub struct EquipmentPage<'a> {
    session: &'a Session,
}

impl PageObject for EquipmentPage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::EQUIPMENT
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(equipment::TABLE)
    }
}

impl<'a> EquipmentPage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Equipment table
    #[must_use]
    pub fn table() -> Table {
        Table::test_id(equipment::TABLE)
    }

    /// Create equipment, returning the inventory number accepted
    pub async fn create_equipment(&self, form: &EquipmentForm) -> ErpResult<u32> {
        let session = self.session;
        session
            .click_when_ready(&Locator::test_id(equipment::CREATE_BUTTON), false)
            .await?;
        session.waiter().visible(&Locator::test_id(equipment::FORM)).await?;
        session
            .fill_and_verify(&Locator::test_id(equipment::NAME_INPUT), &form.name)
            .await?;
        if let Some(kind) = &form.kind {
            session.select_dropdown_option(&equipment::type_dropdown(), kind).await?;
        }

        let mut submission = EquipmentSubmission { session };
        let number = ConflictRetry::new(session.retries().conflict_attempts)
            .with_matcher(ConflictMatcher::for_domain(INVENTORY_KEYWORDS))
            .run(INVENTORY_FIELD, form.inventory_start, &mut submission)
            .await?
            .into_value(INVENTORY_FIELD)?;
        session.annotate(format!("equipment {} got inventory number {number}", form.name));
        Ok(number)
    }

    /// Archive equipment matching `target`
    pub async fn archive_by_prefix(&self, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        self.open().await?;
        super::archive_in_table(self.session, Self::table(), target).await
    }
}

struct EquipmentSubmission<'a> {
    session: &'a Session,
}

#[async_trait]
impl ConflictSubmission for EquipmentSubmission<'_> {
    async fn prepare(&mut self, candidate: u32) -> ErpResult<()> {
        self.session
            .fill_and_verify(
                &Locator::test_id(equipment::INVENTORY_NUMBER_INPUT),
                &candidate.to_string(),
            )
            .await
            .map(|_| ())
    }

    async fn submit(&mut self) -> ErpResult<Observation> {
        self.session
            .click_when_ready(&Locator::test_id(equipment::SAVE_BUTTON), false)
            .await?;
        Ok(Observation {
            notification: self.session.read_notification().await?,
            form_open: self.session.form_still_open(equipment::FORM).await?,
        })
    }
}
