//! Options of the containing form and those forwarded to the embedded form

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::LoadQuery;
use crate::config::NestedFormConfig;

/// Options of the form that contains the nested form field
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostOptions {
    /// API base URL override
    pub base: Option<String>,
    /// Project root override
    pub project: Option<String>,
    /// Render every field read-only
    pub read_only: bool,
    /// Wizard breadcrumb settings
    pub breadcrumb_settings: Option<Value>,
    /// Wizard button settings
    pub button_settings: Option<Value>,
    /// Icon set name
    pub icons: Option<String>,
    /// Render values as plain HTML
    pub view_as_html: bool,
    /// Field keys to force hidden
    pub hide: Option<Value>,
    /// Field keys to force shown
    pub show: Option<Value>,
    /// Active language
    pub language: Option<String>,
    /// Builder or preview mode; no embedded form is instantiated
    pub builder: bool,
    /// Event namespace of the containing form
    pub namespace: String,
    /// Forms root of the containing form, when it was loaded from a server
    pub forms_url: Option<String>,
    /// Request non-cached definitions
    pub live: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            base: None,
            project: None,
            read_only: false,
            breadcrumb_settings: None,
            button_settings: None,
            icons: None,
            view_as_html: false,
            hide: None,
            show: None,
            language: None,
            builder: false,
            namespace: "form".to_string(),
            forms_url: None,
            live: true,
        }
    }
}

impl HostOptions {
    /// Defaults taken from configuration
    #[must_use]
    pub fn from_config(config: &NestedFormConfig) -> Self {
        Self {
            namespace: config.events.namespace.clone(),
            live: config.loading.live,
            ..Self::default()
        }
    }

    /// Set read-only rendering
    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Set builder mode
    #[must_use]
    pub const fn builder(mut self, builder: bool) -> Self {
        self.builder = builder;
        self
    }

    /// Set the ambient forms root
    #[must_use]
    pub fn forms_url(mut self, url: impl Into<String>) -> Self {
        self.forms_url = Some(url.into());
        self
    }

    /// Set the active language
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Query used when fetching definitions
    #[must_use]
    pub const fn load_query(&self) -> LoadQuery {
        LoadQuery { live: self.live }
    }
}

/// Options handed to the embedded form
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildOptions {
    /// API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Read-only rendering
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// Wizard breadcrumb settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breadcrumb_settings: Option<Value>,
    /// Wizard button settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_settings: Option<Value>,
    /// Icon set name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<String>,
    /// Plain HTML rendering
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub view_as_html: bool,
    /// Field keys to force hidden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<Value>,
    /// Field keys to force shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Value>,
    /// Active language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ChildOptions {
    /// Forward the relevant host options
    ///
    /// A project root derived while resolving the source replaces the host's
    /// project.
    #[must_use]
    pub fn forwarded(host: &HostOptions, resolved_project: Option<String>) -> Self {
        Self {
            base: host.base.clone(),
            project: resolved_project.or_else(|| host.project.clone()),
            read_only: host.read_only,
            breadcrumb_settings: host.breadcrumb_settings.clone(),
            button_settings: host.button_settings.clone(),
            icons: host.icons.clone(),
            view_as_html: host.view_as_html,
            hide: host.hide.clone(),
            show: host.show.clone(),
            language: host.language.clone(),
        }
    }
}
