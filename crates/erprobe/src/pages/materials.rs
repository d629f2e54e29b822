//! Materials catalogue.

use super::submit_form;
use crate::cleanup::{CleanupReport, CleanupTarget};
use crate::config::routes;
use crate::interact::SearchOptions;
use crate::locator::{Locator, Selector};
use crate::page_object::PageObject;
use crate::result::ErpResult;
use crate::selectors::{common, materials};
use crate::session::Session;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Values typed into the material form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialForm {
    /// Name (carries the fixture prefix)
    pub name: String,
    /// Article code
    pub code: Option<String>,
    /// Unit of measure option text
    pub unit: Option<String>,
}

impl MaterialForm {
    /// Form with just a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Materials list and material form
#[derive(Debug, Clone, Copy)]
pub struct MaterialsPage<'a> {
    session: &'a Session,
}

impl PageObject for MaterialsPage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::MATERIALS
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(materials::TABLE)
    }
}

impl<'a> MaterialsPage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Materials table
    #[must_use]
    pub fn table() -> Table {
        Table::test_id(materials::TABLE)
    }

    /// Create a material from the list page
    pub async fn create_material(&self, form: &MaterialForm) -> ErpResult<()> {
        let session = self.session;
        session
            .click_when_ready(&Locator::test_id(materials::CREATE_BUTTON), false)
            .await?;
        session.waiter().visible(&Locator::test_id(materials::FORM)).await?;
        session
            .fill_and_verify(&Locator::test_id(materials::NAME_INPUT), &form.name)
            .await?;
        if let Some(code) = &form.code {
            session
                .fill_and_verify(&Locator::test_id(materials::CODE_INPUT), code)
                .await?;
        }
        if let Some(unit) = &form.unit {
            session.select_dropdown_option(&materials::unit_dropdown(), unit).await?;
        }
        submit_form(session, materials::SAVE_BUTTON, materials::FORM).await?;
        session.annotate(format!("material {} created", form.name));
        Ok(())
    }

    /// Filter the list by `text`, returning the texts of the rows left
    pub async fn search(&self, text: &str) -> ErpResult<Vec<String>> {
        self.session
            .search_sequential(&Locator::test_id(common::SEARCH_INPUT), text, SearchOptions::default())
            .await?;
        Self::table().row_texts(self.session.driver()).await
    }

    /// Whether a row containing `name` is listed after searching for it
    pub async fn exists(&self, name: &str) -> ErpResult<bool> {
        Ok(self.search(name).await?.iter().any(|row| row.contains(name)))
    }

    /// Archive materials matching `target`
    pub async fn archive_by_prefix(&self, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        self.open().await?;
        super::archive_in_table(self.session, Self::table(), target).await
    }
}
