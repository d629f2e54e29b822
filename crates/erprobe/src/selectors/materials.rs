//! Materials catalogue.

use super::versioned;
use crate::locator::Selector;

/// Materials table
pub const TABLE: &str = "Materials-Table";
/// Open the create form
pub const CREATE_BUTTON: &str = "Materials-Button-Create";
/// Create/edit form
pub const FORM: &str = "MaterialForm-Modal";
/// Material name
pub const NAME_INPUT: &str = "MaterialForm-Input-Name";
/// Article / code
pub const CODE_INPUT: &str = "MaterialForm-Input-Code";
/// Save the form
pub const SAVE_BUTTON: &str = "MaterialForm-Button-Save";

/// Unit of measure dropdown
#[must_use]
pub fn unit_dropdown() -> Selector {
    versioned("MaterialForm-Unit-Select", "-Dropdown")
}
