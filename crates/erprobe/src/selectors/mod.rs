//! Selector registry.
//!
//! One constant per semantic UI element, named after what it is rather
//! than how it is found. Everything here is pure: constants, and functions
//! from a row identity or index to a selector.
//!
//! Several dropdowns and popovers carry a version number in their test id
//! that changes between releases (`Users-Role-Select-v3-Dropdown`). Each
//! such role has exactly one helper in its page module that matches it by
//! prefix and suffix; nothing else hard-codes the version.

pub mod common;
pub mod equipment;
pub mod materials;
pub mod nav;
pub mod production;
pub mod shipping;
pub mod users;
pub mod warehouse;

use crate::locator::Selector;

/// Matcher for a test id of the form `{role}-v{N}{suffix}`
#[must_use]
pub fn versioned(role: &str, suffix: &str) -> Selector {
    Selector::test_id_affix(format!("{role}-v"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_matches_any_version() {
        let sel = versioned("Users-Role-Select", "-Dropdown");
        assert!(sel.matches_test_id("Users-Role-Select-v3-Dropdown"));
        assert!(sel.matches_test_id("Users-Role-Select-v12-Dropdown"));
        assert!(!sel.matches_test_id("Users-Role-Select-v3-Option"));
        assert!(!sel.matches_test_id("Materials-Role-Select-v3-Dropdown"));
    }

    #[test]
    fn test_versioned_css_form() {
        let css = versioned("Orders-Row-Popover", "").to_css().unwrap();
        assert!(css.contains("^=\"Orders-Row-Popover-v\""));
    }
}
