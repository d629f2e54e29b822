//! Users page (settings → users).
//!
//! Creating a user needs a free personnel table number. The application
//! only says a number is taken after the form is submitted, so creation
//! runs the descending conflict-retry loop over the table-number field.

use crate::cleanup::{CleanupReport, CleanupTarget};
use crate::config::routes;
use crate::conflict::{ConflictRetry, ConflictSubmission, Observation};
use crate::locator::{Locator, Selector};
use crate::page_object::PageObject;
use crate::result::ErpResult;
use crate::selectors::{nav, users};
use crate::session::Session;
use crate::table::Table;
use crate::timeouts::Tier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field name used in conflict diagnostics
pub const TABLE_NUMBER_FIELD: &str = "table number";

/// Values typed into the user form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    /// Last name (carries the fixture prefix)
    pub last_name: String,
    /// First name
    pub first_name: String,
    /// Login
    pub login: String,
    /// Role option text
    pub role: Option<String>,
    /// Department option text
    pub department: Option<String>,
}

impl UserForm {
    /// Form for a fixture user named `name`
    #[must_use]
    pub fn fixture(name: &str) -> Self {
        Self {
            last_name: name.to_string(),
            first_name: "Test".to_string(),
            login: name.to_ascii_lowercase(),
            role: None,
            department: None,
        }
    }
}

/// A user the page created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedUser {
    /// Last name as entered
    pub last_name: String,
    /// Table number accepted by the application
    pub table_number: u32,
    /// Submissions it took
    pub attempts: u32,
    /// Submissions that failed without a conflict message
    pub unknown_failures: u32,
}

/// Users list and user form
#[derive(Debug, Clone, Copy)]
pub struct UsersPage<'a> {
    session: &'a Session,
}

impl PageObject for UsersPage<'_> {
    fn session(&self) -> &Session {
        self.session
    }

    fn route(&self) -> &str {
        routes::USERS
    }

    fn ready_marker(&self) -> Selector {
        Selector::test_id(users::TABLE)
    }
}

impl<'a> UsersPage<'a> {
    /// Page bound to a session
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Users table
    #[must_use]
    pub fn table() -> Table {
        Table::test_id(users::TABLE)
    }

    /// Reach the page the way a user would: sidebar, then the users tab
    pub async fn open_from_sidebar(&self) -> ErpResult<()> {
        self.session.find_and_open(nav::SETTINGS).await?;
        self.session
            .click_when_ready(&Locator::test_id(nav::SETTINGS_USERS).with_tier(Tier::Standard), false)
            .await?;
        self.session
            .waiter()
            .visible(&Locator::test_id(users::TABLE).with_tier(Tier::Standard))
            .await?;
        Ok(())
    }

    /// Create a user, stepping the table number down past taken values
    ///
    /// Starts from the configured `table_number_start`. Fails with
    /// `ConflictExhausted` when every candidate was rejected.
    pub async fn create_user(&self, form: &UserForm) -> ErpResult<CreatedUser> {
        let session = self.session;
        session
            .click_when_ready(&Locator::test_id(users::CREATE_BUTTON), false)
            .await?;
        session.waiter().visible(&Locator::test_id(users::FORM)).await?;

        session
            .fill_and_verify(&Locator::test_id(users::LAST_NAME_INPUT), &form.last_name)
            .await?;
        session
            .fill_and_verify(&Locator::test_id(users::FIRST_NAME_INPUT), &form.first_name)
            .await?;
        session
            .fill_and_verify(&Locator::test_id(users::LOGIN_INPUT), &form.login)
            .await?;
        if let Some(role) = &form.role {
            session.select_dropdown_option(&users::role_dropdown(), role).await?;
        }
        if let Some(department) = &form.department {
            session
                .select_dropdown_option(&users::department_dropdown(), department)
                .await?;
        }

        let mut submission = UserSubmission { session };
        let outcome = ConflictRetry::new(session.retries().conflict_attempts)
            .run(TABLE_NUMBER_FIELD, session.config().table_number_start, &mut submission)
            .await?;
        let (attempts, unknown_failures) = (outcome.attempts, outcome.unknown_failures);
        let table_number = outcome.into_value(TABLE_NUMBER_FIELD)?;

        session.annotate(format!("user {} got table number {table_number}", form.last_name));
        Ok(CreatedUser {
            last_name: form.last_name.clone(),
            table_number,
            attempts,
            unknown_failures,
        })
    }

    /// Archive users matching `target`
    pub async fn archive_by_prefix(&self, target: &CleanupTarget) -> ErpResult<CleanupReport> {
        self.open().await?;
        super::archive_in_table(self.session, Self::table(), target).await
    }
}

/// The open user form, driven by the conflict-retry loop
struct UserSubmission<'a> {
    session: &'a Session,
}

#[async_trait]
impl ConflictSubmission for UserSubmission<'_> {
    async fn prepare(&mut self, candidate: u32) -> ErpResult<()> {
        self.session
            .fill_and_verify(&Locator::test_id(users::TABLE_NUMBER_INPUT), &candidate.to_string())
            .await
            .map(|_| ())
    }

    async fn submit(&mut self) -> ErpResult<Observation> {
        self.session
            .click_when_ready(&Locator::test_id(users::SAVE_BUTTON), false)
            .await?;
        let notification = self.session.read_notification().await?;
        let form_open = self.session.form_still_open(users::FORM).await?;
        Ok(Observation {
            notification,
            form_open,
        })
    }
}
