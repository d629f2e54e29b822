//! Production orders and the product catalogue.

use super::versioned;
use crate::locator::Selector;

/// Production orders table
pub const ORDERS_TABLE: &str = "ProductionOrders-Table";
/// Open the launch form
pub const LAUNCH_BUTTON: &str = "ProductionOrders-Button-Launch";
/// Launch form
pub const LAUNCH_FORM: &str = "LaunchForm-Modal";
/// Quantity to produce
pub const LAUNCH_QUANTITY_INPUT: &str = "LaunchForm-Input-Quantity";
/// Free-text note shown in the order row
pub const LAUNCH_NOTE_INPUT: &str = "LaunchForm-Input-Note";
/// Submit the launch form
pub const LAUNCH_SUBMIT: &str = "LaunchForm-Button-Submit";

/// Popover action: mark the order complete
pub const ACTION_COMPLETE: &str = "Complete";
/// Popover action: disassemble produced units
pub const ACTION_DISASSEMBLE: &str = "Disassemble";

/// Disassembly form
pub const DISASSEMBLE_FORM: &str = "DisassembleForm-Modal";
/// Units to disassemble
pub const DISASSEMBLE_QUANTITY_INPUT: &str = "DisassembleForm-Input-Quantity";
/// Submit disassembly
pub const DISASSEMBLE_SUBMIT: &str = "DisassembleForm-Button-Submit";

/// Products/assemblies/details table
pub const PRODUCTS_TABLE: &str = "Products-Table";

/// Column of the order number in the orders table
pub const ORDER_NUMBER_COLUMN: usize = 0;
/// Column of the `made / total` count in the orders table
pub const ORDER_COUNT_COLUMN: usize = 3;

/// Product dropdown of the launch form
#[must_use]
pub fn product_dropdown() -> Selector {
    versioned("LaunchForm-Product-Select", "-Dropdown")
}

/// Catalogue tab for a product kind (`Product`, `Assembly`, `Detail`)
#[must_use]
pub fn products_tab(kind: &str) -> String {
    format!("Products-Tab-{kind}")
}
