//! Shipping tasks.

/// Shipping tasks table
pub const TASKS_TABLE: &str = "ShippingTasks-Table";
/// Ship form
pub const SHIP_FORM: &str = "ShipForm-Modal";
/// Quantity to ship
pub const SHIP_QUANTITY_INPUT: &str = "ShipForm-Input-Quantity";
/// Confirm shipment
pub const SHIP_CONFIRM: &str = "ShipForm-Button-Confirm";

/// Column of the `shipped / ordered` count
pub const SHIPPED_COLUMN: usize = 2;

/// Ship button of one task row
#[must_use]
pub fn ship_button(row: usize) -> String {
    format!("ShippingTasks-Row{row}-Ship")
}
