//! Equipment catalogue.

use super::versioned;
use crate::locator::Selector;

/// Equipment table
pub const TABLE: &str = "Equipment-Table";
/// Open the create form
pub const CREATE_BUTTON: &str = "Equipment-Button-Create";
/// Create/edit form
pub const FORM: &str = "EquipmentForm-Modal";
/// Equipment name
pub const NAME_INPUT: &str = "EquipmentForm-Input-Name";
/// Inventory number (unique)
pub const INVENTORY_NUMBER_INPUT: &str = "EquipmentForm-Input-InventoryNumber";
/// Save the form
pub const SAVE_BUTTON: &str = "EquipmentForm-Button-Save";

/// Equipment type dropdown
#[must_use]
pub fn type_dropdown() -> Selector {
    versioned("EquipmentForm-Type-Select", "-Dropdown")
}
