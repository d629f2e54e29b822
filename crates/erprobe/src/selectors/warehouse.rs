//! Warehouse stock and receipts.

use super::versioned;
use crate::locator::Selector;

/// Stock table
pub const STOCK_TABLE: &str = "Warehouse-Stock-Table";
/// Open the receipt form
pub const RECEIVE_BUTTON: &str = "Warehouse-Button-Receive";
/// Receipt form
pub const RECEIPT_FORM: &str = "ReceiptForm-Modal";
/// Quantity received
pub const RECEIPT_QUANTITY_INPUT: &str = "ReceiptForm-Input-Quantity";
/// Save the receipt
pub const RECEIPT_SAVE: &str = "ReceiptForm-Button-Save";

/// Column of the on-hand quantity in the stock table
pub const QUANTITY_COLUMN: usize = 2;

/// Drill-down page: lots of one stock item (rows directly under the root)
pub const DETAILS_TABLE: &str = "StockDetails-Lots";
/// API path the drill-down page loads its lots from
pub const DETAILS_API_FRAGMENT: &str = "/api/warehouse/stock/";

/// Material dropdown of the receipt form
#[must_use]
pub fn material_dropdown() -> Selector {
    versioned("ReceiptForm-Material-Select", "-Dropdown")
}

/// Drill-down link inside a stock row (opens a new tab)
#[must_use]
pub fn details_link(row: usize) -> String {
    format!("Warehouse-Row{row}-DetailsLink")
}
