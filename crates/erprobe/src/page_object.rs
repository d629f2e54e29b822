//! Page Object Model support.
//!
//! A page object knows its route, the element that proves the page has
//! rendered, and the session it drives. Opening a page navigates to the
//! route and waits for that marker under the page's load tier.
//!
//! ```ignore
//! let users = UsersPage::new(&session);
//! users.open().await?;
//! let created = users.create_user(&form).await?;
//! ```

use crate::locator::{Locator, Selector};
use crate::result::ErpResult;
use crate::session::Session;
use crate::timeouts::Tier;
use async_trait::async_trait;

/// A page of the application
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Session driving the page
    fn session(&self) -> &Session;

    /// Route name in the configured route map
    fn route(&self) -> &str;

    /// Element present once the page has rendered
    fn ready_marker(&self) -> Selector;

    /// Tier used when waiting for the marker
    fn load_tier(&self) -> Tier {
        Tier::Standard
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Check if the page is rendered right now
    async fn is_loaded(&self) -> ErpResult<bool> {
        Ok(self.session().driver().count(&self.ready_marker()).await? > 0)
    }

    /// Navigate to the route and wait for the marker
    async fn open(&self) -> ErpResult<()> {
        let session = self.session();
        session.open_route(self.route()).await?;
        let marker = Locator::from_selector(self.ready_marker()).with_tier(self.load_tier());
        session
            .waiter()
            .visible(&marker)
            .await
            .map_err(|e| e.with_context(format!("opening {}", self.page_name())))?;
        tracing::info!(page = self.page_name(), "page ready");
        Ok(())
    }
}

/// Last path segment of a type name, without generic arguments
fn short_type_name(full: &str) -> &str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErpConfig;
    use crate::driver::PageDriver;
    use crate::mock::{MockDriver, MockElement};
    use crate::result::ErpError;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StockPage<'a> {
        session: &'a Session,
    }

    impl PageObject for StockPage<'_> {
        fn session(&self) -> &Session {
            self.session
        }

        fn route(&self) -> &str {
            "warehouse"
        }

        fn ready_marker(&self) -> Selector {
            Selector::test_id("Warehouse-Stock-Table")
        }
    }

    fn session(driver: &Arc<MockDriver>, dir: &tempfile::TempDir) -> Session {
        let config = ErpConfig {
            artifacts_dir: dir.path().to_path_buf(),
            ..ErpConfig::default()
        };
        Session::new(Arc::clone(driver) as Arc<dyn PageDriver>, config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_navigates_and_waits() {
        let dir = tempfile::TempDir::new().unwrap();
        let driver = Arc::new(MockDriver::new());
        driver.add(MockElement::test_id("Warehouse-Stock-Table"));
        let session = session(&driver, &dir);
        let page = StockPage { session: &session };
        page.open().await.unwrap();
        assert!(page.is_loaded().await.unwrap());
        assert!(driver.was_called("goto:http://localhost:8080/warehouse"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_fails_with_page_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let driver = Arc::new(MockDriver::new());
        let session = session(&driver, &dir);
        let page = StockPage { session: &session };
        let err = page.open().await.unwrap_err();
        assert!(matches!(err, ErpError::LocatorTimeout { ms: 10_000, .. }));
        assert!(err.to_string().contains("opening StockPage"));
    }

    #[test]
    fn test_page_name_is_short() {
        let dir = tempfile::TempDir::new().unwrap();
        let driver = Arc::new(MockDriver::new());
        let session = session(&driver, &dir);
        let page = StockPage { session: &session };
        assert_eq!(page.page_name(), "StockPage");
    }

    #[test]
    fn test_short_type_name_drops_generics() {
        assert_eq!(short_type_name("erprobe::pages::UsersPage<'_>"), "UsersPage");
        assert_eq!(
            short_type_name("erprobe::Wrapper<erprobe::pages::UsersPage<'_>>"),
            "Wrapper"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
