//! Users (settings) page.

use super::versioned;
use crate::locator::Selector;

/// Users table
pub const TABLE: &str = "Users-Table";
/// Open the create form
pub const CREATE_BUTTON: &str = "Users-Button-Create";
/// Create/edit form
pub const FORM: &str = "UserForm-Modal";
/// Last name
pub const LAST_NAME_INPUT: &str = "UserForm-Input-LastName";
/// First name
pub const FIRST_NAME_INPUT: &str = "UserForm-Input-FirstName";
/// Login
pub const LOGIN_INPUT: &str = "UserForm-Input-Login";
/// Personnel table number
pub const TABLE_NUMBER_INPUT: &str = "UserForm-Input-TableNumber";
/// Save the form
pub const SAVE_BUTTON: &str = "UserForm-Button-Save";

/// Role dropdown
#[must_use]
pub fn role_dropdown() -> Selector {
    versioned("UserForm-Role-Select", "-Dropdown")
}

/// Department dropdown
#[must_use]
pub fn department_dropdown() -> Selector {
    versioned("UserForm-Department-Select", "-Dropdown")
}
