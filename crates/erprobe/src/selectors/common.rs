//! Elements shared by every page: tables, modals, notifications, toolbars.

use super::versioned;
use crate::locator::Selector;

/// Data row under a `tbody`
pub const BODY_ROW: &str = "tbody tr";
/// Data row directly under the table root
pub const DIRECT_ROW: &str = ":scope > tr";
/// Table cell
pub const CELL: &str = "td";
/// Row selection checkbox
pub const ROW_CHECKBOX: &str = "input[type=\"checkbox\"]";

/// Toast region
pub const NOTIFICATION: &str = "Notification-Message";
/// Confirmation modal
pub const CONFIRM_MODAL: &str = "ModalConfirm";
/// Confirmation modal: accept
pub const CONFIRM_YES: &str = "ModalConfirm-Button-Yes";
/// Confirmation modal: cancel
pub const CONFIRM_NO: &str = "ModalConfirm-Button-No";

/// List toolbar: archive selected rows
pub const ARCHIVE_BUTTON: &str = "Toolbar-Button-Archive";
/// List toolbar: search input
pub const SEARCH_INPUT: &str = "Toolbar-Search-Input";
/// Global loading spinner
pub const LOADER: &str = "Loader-Spinner";

/// Prefix of dropdown option test ids (`Dropdown-Option-<id>`)
pub const DROPDOWN_OPTION_PREFIX: &str = "Dropdown-Option";
/// Prefix of popover menu item test ids (`Popover-Item-<action>`)
pub const POPOVER_ITEM_PREFIX: &str = "Popover-Item";

/// Toast region selector
#[must_use]
pub fn notification() -> Selector {
    Selector::test_id(NOTIFICATION)
}

/// Dropdown option showing `text`
#[must_use]
pub fn dropdown_option(text: &str) -> Selector {
    Selector::test_id_prefix(DROPDOWN_OPTION_PREFIX).with_text(text)
}

/// Row popover menu (`Popover-v{N}-Menu`)
#[must_use]
pub fn popover_menu() -> Selector {
    versioned("Popover", "-Menu")
}

/// Row popover trigger inside a table row (`RowActions-v{N}-Button`)
#[must_use]
pub fn row_actions_button() -> Selector {
    versioned("RowActions", "-Button")
}

/// Item of the open row popover
#[must_use]
pub fn popover_item(action: &str) -> Selector {
    popover_menu().within(Selector::test_id(format!("{POPOVER_ITEM_PREFIX}-{action}")))
}
