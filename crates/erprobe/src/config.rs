//! Run configuration.
//!
//! Layers, later wins: built-in defaults, a YAML file, `ERPROBE_*`
//! environment variables. The result is validated before use.

use crate::cleanup::CleanupPolicy;
use crate::result::{ErpError, ErpResult};
use crate::timeouts::{RetryCounts, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file
pub const ENV_CONFIG: &str = "ERPROBE_CONFIG";
/// Environment variable selecting the environment
pub const ENV_ENVIRONMENT: &str = "ERPROBE_ENV";
/// Environment variable overriding the base URL of the selected environment
pub const ENV_BASE_URL: &str = "ERPROBE_BASE_URL";
/// Environment variable toggling headless mode
pub const ENV_HEADLESS: &str = "ERPROBE_HEADLESS";
/// Environment variable overriding the artifacts directory
pub const ENV_ARTIFACTS: &str = "ERPROBE_ARTIFACTS";

/// Route names
pub mod routes {
    /// Warehouse stock list
    pub const WAREHOUSE: &str = "warehouse";
    /// Shipping tasks
    pub const SHIPPING_TASKS: &str = "shipping-tasks";
    /// Settings root
    pub const SETTINGS: &str = "settings";
    /// Users (under settings)
    pub const USERS: &str = "users";
    /// Materials catalogue
    pub const MATERIALS: &str = "materials";
    /// Equipment catalogue
    pub const EQUIPMENT: &str = "equipment";
    /// Production orders
    pub const PRODUCTION: &str = "production";
    /// Products, assemblies and details
    pub const PRODUCTS: &str = "products";
}

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable (auto-detected when unset)
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Outline elements after each successful click (demo recordings)
    pub highlight_actions: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1600,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
            highlight_actions: false,
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    /// Selected environment name
    pub environment: String,
    /// Base URL per environment
    pub base_urls: BTreeMap<String, String>,
    /// Route name to path
    pub routes: BTreeMap<String, String>,
    /// Timeout tiers
    pub timeouts: TimeoutPolicy,
    /// Retry counts
    pub retries: RetryCounts,
    /// Cleanup limits
    pub cleanup: CleanupPolicy,
    /// Browser options
    pub browser: BrowserSettings,
    /// Reports and screenshots go here
    pub artifacts_dir: PathBuf,
    /// First personnel table number tried when creating users
    pub table_number_start: u32,
}

impl Default for ErpConfig {
    fn default() -> Self {
        let base_urls = [
            ("local", "http://localhost:8080"),
            ("staging", "https://erp-staging.internal"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let routes = [
            (routes::WAREHOUSE, "/warehouse"),
            (routes::SHIPPING_TASKS, "/shipping-tasks"),
            (routes::SETTINGS, "/settings"),
            (routes::USERS, "/settings/users"),
            (routes::MATERIALS, "/materials"),
            (routes::EQUIPMENT, "/equipment"),
            (routes::PRODUCTION, "/production-tasks"),
            (routes::PRODUCTS, "/products"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            environment: "local".to_string(),
            base_urls,
            routes,
            timeouts: TimeoutPolicy::default(),
            retries: RetryCounts::default(),
            cleanup: CleanupPolicy::default(),
            browser: BrowserSettings::default(),
            artifacts_dir: PathBuf::from("erprobe-artifacts"),
            table_number_start: 999,
        }
    }
}

impl ErpConfig {
    /// Parse a YAML document over the defaults
    pub fn from_yaml_str(yaml: &str) -> ErpResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file over the defaults
    pub fn from_file(path: &Path) -> ErpResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ErpError::ConfigError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults, then `path` (or `ERPROBE_CONFIG`), then the process environment
    pub fn load(path: Option<&Path>) -> ErpResult<Self> {
        let from_env = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config file");
                Self::from_file(&p)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ERPROBE_*` overrides read through `var`
    pub fn apply_env<F>(&mut self, var: F) -> ErpResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = var(ENV_ENVIRONMENT) {
            self.environment = env;
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.base_urls.insert(self.environment.clone(), url);
        }
        if let Some(raw) = var(ENV_HEADLESS) {
            self.browser.headless = parse_bool(&raw).ok_or_else(|| ErpError::ConfigError {
                message: format!("{ENV_HEADLESS}={raw:?} is not a boolean"),
            })?;
        }
        if let Some(dir) = var(ENV_ARTIFACTS) {
            self.artifacts_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Check tiers, limits and the selected environment
    pub fn validate(&self) -> ErpResult<()> {
        self.timeouts.validate()?;
        self.cleanup.validate()?;
        if !self.base_urls.contains_key(&self.environment) {
            let known: Vec<&str> = self.base_urls.keys().map(String::as_str).collect();
            return Err(ErpError::ConfigError {
                message: format!(
                    "unknown environment {:?} (known: {})",
                    self.environment,
                    known.join(", ")
                ),
            });
        }
        if self.retries.conflict_attempts == 0 || self.retries.notification_polls == 0 {
            return Err(ErpError::ConfigError {
                message: "conflict_attempts and notification_polls must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Base URL of the selected environment
    pub fn base_url(&self) -> ErpResult<&str> {
        self.base_urls
            .get(&self.environment)
            .map(|s| s.trim_end_matches('/'))
            .ok_or_else(|| ErpError::ConfigError {
                message: format!("no base URL for environment {:?}", self.environment),
            })
    }

    /// Absolute URL of a named route
    pub fn route_url(&self, route: &str) -> ErpResult<String> {
        let path = self.routes.get(route).ok_or_else(|| ErpError::ConfigError {
            message: format!("unknown route {route:?}"),
        })?;
        Ok(format!("{}/{}", self.base_url()?, path.trim_start_matches('/')))
    }

    /// YAML rendering of the effective configuration
    pub fn to_yaml(&self) -> ErpResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
