//! Data-table helpers: row addressing, cell reads, count-cell parsing.

use crate::driver::PageDriver;
use crate::locator::{Locator, Selector};
use crate::result::{ErpError, ErpResult};
use crate::selectors::common;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn count_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*(\d+)\s*(?:/\s*(\d+))?\s*$").ok())
        .as_ref()
}

/// A count cell: `N` or `N / M` (done / total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountCell {
    /// Left number
    pub left: u64,
    /// Right number, when the cell had the `N / M` form
    pub right: Option<u64>,
}

impl CountCell {
    /// Accepted formats, used in error messages
    pub const EXPECTED: &'static str = "N or N / M";

    /// Parse cell text
    ///
    /// `cell` and `row` only feed the `TableShape` error.
    pub fn parse(text: &str, cell: &str, row: &str) -> ErpResult<Self> {
        let shape_error = || ErpError::TableShape {
            cell: cell.to_string(),
            row: row.to_string(),
            raw: text.to_string(),
            expected: Self::EXPECTED.to_string(),
        };
        let caps = count_pattern()
            .and_then(|p| p.captures(text))
            .ok_or_else(shape_error)?;
        let left = caps[1].parse().map_err(|_| shape_error())?;
        let right = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().map_err(|_| shape_error())?),
            None => None,
        };
        Ok(Self { left, right })
    }

    /// Right number, or left when the cell held a single number
    #[must_use]
    pub fn total(&self) -> u64 {
        self.right.unwrap_or(self.left)
    }
}

impl std::fmt::Display for CountCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.right {
            Some(right) => write!(f, "{} / {right}", self.left),
            None => write!(f, "{}", self.left),
        }
    }
}

/// A data table addressed by its root selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    root: Selector,
    has_header: bool,
}

impl Table {
    /// Table with a `thead`/`tbody` structure
    #[must_use]
    pub const fn new(root: Selector) -> Self {
        Self {
            root,
            has_header: true,
        }
    }

    /// Table identified by test id
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(Selector::test_id(id))
    }

    /// Rows sit directly under the root (no `tbody`)
    #[must_use]
    pub fn headerless(mut self) -> Self {
        self.has_header = false;
        self
    }

    /// Whether rows are under a `tbody`
    #[must_use]
    pub const fn has_header(&self) -> bool {
        self.has_header
    }

    /// Root selector
    #[must_use]
    pub const fn root(&self) -> &Selector {
        &self.root
    }

    /// Selector matching every data row
    #[must_use]
    pub fn rows(&self) -> Selector {
        let css = if self.has_header {
            common::BODY_ROW
        } else {
            common::DIRECT_ROW
        };
        self.root.clone().within(Selector::css(css))
    }

    /// Locator of the row at `index`
    #[must_use]
    pub fn row(&self, index: usize) -> Locator {
        Locator::from_selector(self.rows()).nth(index)
    }

    /// Locator of the first row containing `text`
    #[must_use]
    pub fn row_with_text(&self, text: &str) -> Locator {
        let css = if self.has_header {
            common::BODY_ROW
        } else {
            common::DIRECT_ROW
        };
        Locator::from_selector(self.root.clone().within(Selector::css(css).with_text(text)))
    }

    /// Locator of a cell by column position
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Locator {
        self.row(row).locate(Selector::css(common::CELL)).nth(column)
    }

    /// Rendered data rows
    pub async fn row_count(&self, driver: &dyn PageDriver) -> ErpResult<usize> {
        driver.count(&self.rows()).await
    }

    /// Text of every row
    pub async fn row_texts(&self, driver: &dyn PageDriver) -> ErpResult<Vec<String>> {
        driver.texts(&self.rows()).await
    }

    /// Index of the first row containing `text`
    pub async fn find_row(&self, driver: &dyn PageDriver, text: &str) -> ErpResult<Option<usize>> {
        Ok(self
            .row_texts(driver)
            .await?
            .iter()
            .position(|t| t.contains(text)))
    }

    /// Text of one cell
    pub async fn cell_text(&self, driver: &dyn PageDriver, row: usize, column: usize) -> ErpResult<String> {
        let locator = self.cell(row, column);
        driver
            .element_state(&locator)
            .await?
            .map(|s| s.text)
            .ok_or_else(|| {
                ErpError::locator_timeout(locator.to_string(), "attached", 0)
                    .with_context(format!("row {row}, column {column}"))
            })
    }

    /// Parse a count cell
    pub async fn count_cell(
        &self,
        driver: &dyn PageDriver,
        row: usize,
        column: usize,
        column_name: &str,
        row_name: &str,
    ) -> ErpResult<CountCell> {
        let text = self.cell_text(driver, row, column).await?;
        CountCell::parse(&text, column_name, row_name)
    }
}
