//! Configuration management for nested-form
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `NESTED_FORM_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/nested-form/{service}/config.toml` (user config, XDG)
//! 4. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [api]
//! base_url = "https://api.example.com"
//! project_url = "https://myproject.example.com"
//!
//! [events]
//! namespace = "form"
//!
//! [loading]
//! live = true
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use nested_form::config::NestedFormConfig;
//!
//! # fn example() -> Result<(), nested_form::error::FormError> {
//! let config = NestedFormConfig::load_for_service("intake")?;
//! let base = &config.api.base_url;
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::FormResult;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "NESTED_FORM_";

/// API root locations used when deriving form sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Global API root
    pub base_url: String,

    /// Project-scoped root; falls back to `base_url` when unset
    pub project_url: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            project_url: None,
        }
    }
}

impl ApiSettings {
    /// Effective project root
    #[must_use]
    pub fn project_url(&self) -> &str {
        self.project_url.as_deref().unwrap_or(&self.base_url)
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Prefix prepended to every event name on the bus
    pub namespace: String,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            namespace: "form".to_string(),
        }
    }
}

/// Definition loading settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Request authoritative, non-cached definitions
    pub live: bool,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self { live: true }
    }
}

/// Complete nested-form configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NestedFormConfig {
    /// API roots
    #[serde(default)]
    pub api: ApiSettings,

    /// Event bus settings
    #[serde(default)]
    pub events: EventSettings,

    /// Definition loading settings
    #[serde(default)]
    pub loading: LoadSettings,
}

impl NestedFormConfig {
    /// Load configuration for a specific service
    ///
    /// Merges defaults, the XDG user config, `./config.toml` and
    /// `NESTED_FORM_*` environment variables, in increasing priority.
    pub fn load_for_service(service_name: &str) -> FormResult<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(Self::recommended_path(service_name)))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        tracing::debug!(service = service_name, "Loaded nested-form configuration");
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Environment variables still take precedence over the file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use nested_form::config::NestedFormConfig;
    ///
    /// # fn example() -> Result<(), nested_form::error::FormError> {
    /// let config = NestedFormConfig::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        tracing::debug!(path = %path.display(), "Loaded nested-form configuration");
        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// Returns `~/.config/nested-form/{service}/config.toml`, or
    /// `./config.toml` when no user config directory is known.
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |dir| {
                dir.join("nested-form")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NestedFormConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:3001");
        assert_eq!(config.api.project_url(), "http://localhost:3001");
        assert_eq!(config.events.namespace, "form");
        assert!(config.loading.live);
    }

    #[test]
    fn test_project_url_override() {
        let api = ApiSettings {
            base_url: "https://api.example.com".into(),
            project_url: Some("https://intake.example.com".into()),
        };
        assert_eq!(api.project_url(), "https://intake.example.com");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(
            file,
            "[api]\nbase_url = \"https://api.example.com\"\n\n[events]\nnamespace = \"intake\""
        )
        .expect("Failed to write config");

        let config = NestedFormConfig::load_from(file.path()).expect("Failed to load config");
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.events.namespace, "intake");
        // Untouched sections keep their defaults
        assert!(config.loading.live);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = NestedFormConfig::load_from("/nonexistent/nested-form/config.toml")
            .expect("Missing files are skipped");
        assert_eq!(config.events.namespace, "form");
    }

    #[test]
    fn test_recommended_path_ends_with_service() {
        let path = NestedFormConfig::recommended_path("intake");
        assert!(path.ends_with("config.toml"));
    }
}
