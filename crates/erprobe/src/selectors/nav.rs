//! Sidebar navigation.

/// Sidebar root
pub const SIDEBAR: &str = "Sidebar";
/// Warehouse section
pub const WAREHOUSE: &str = "Sidebar-Link-Warehouse";
/// Shipping tasks section
pub const SHIPPING_TASKS: &str = "Sidebar-Link-ShippingTasks";
/// Production orders section
pub const PRODUCTION: &str = "Sidebar-Link-Production";
/// Products, assemblies and details
pub const PRODUCTS: &str = "Sidebar-Link-Products";
/// Materials catalogue
pub const MATERIALS: &str = "Sidebar-Link-Materials";
/// Equipment catalogue
pub const EQUIPMENT: &str = "Sidebar-Link-Equipment";
/// Settings section
pub const SETTINGS: &str = "Sidebar-Link-Settings";
/// Users tab inside settings
pub const SETTINGS_USERS: &str = "Settings-Tab-Users";
