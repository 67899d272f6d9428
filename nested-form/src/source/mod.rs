//! Sub-form source resolution
//!
//! Turns a [`NestedFormSchema`] into the locator the definition is loaded
//! from. No network access happens here; this is string composition only.
//!
//! # Priority
//!
//! 1. An explicit `src` is used verbatim.
//! 2. Without an ambient forms root, a `form` id or `path` slug is appended
//!    to a base derived from `project` (or to the project root).
//! 3. With an ambient forms root, `form` or `path` is substituted into it.
//! 4. A `formRevision` (including `0`) appends `/v/{revision}`.
//!
//! Inline definitions skip resolution entirely.
//!
//! ```rust
//! use nested_form::schema::NestedFormSchema;
//! use nested_form::source::{resolve_source, ApiRoots};
//!
//! let roots = ApiRoots::new("https://api.example.com", "https://intake.example.com");
//! let schema = NestedFormSchema::for_form("applicant", "abc123");
//!
//! let resolution = resolve_source(&schema, &roots, None);
//! assert_eq!(resolution.source, "https://intake.example.com/form/abc123");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ApiSettings;
use crate::schema::NestedFormSchema;

static OBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9a-fA-F]{24}$").expect("Invalid regex"));

/// Whether an identifier looks like a generated 24-hex-digit object id
#[must_use]
pub fn is_object_id(value: &str) -> bool {
    OBJECT_ID.is_match(value)
}

/// API roots used to derive form locators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoots {
    /// Global API root
    pub base_url: String,
    /// Ambient project-scoped root
    pub project_url: String,
}

impl ApiRoots {
    /// Create API roots
    #[must_use]
    pub fn new(base_url: impl Into<String>, project_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_slash(base_url.into()),
            project_url: trim_slash(project_url.into()),
        }
    }
}

impl From<&ApiSettings> for ApiRoots {
    fn from(settings: &ApiSettings) -> Self {
        Self::new(settings.base_url.clone(), settings.project_url())
    }
}

impl Default for ApiRoots {
    fn default() -> Self {
        Self::from(&ApiSettings::default())
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Outcome of source resolution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Concrete locator; empty for inline definitions or when nothing applies
    pub source: String,
    /// Project root derived during resolution, forwarded to the child
    pub project: Option<String>,
}

impl Resolution {
    /// Whether a locator was produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Resolve the locator of the embedded form
///
/// `forms_url` is the ambient forms root of the containing form, when that
/// form was itself loaded from a server.
#[must_use]
pub fn resolve_source(
    schema: &NestedFormSchema,
    roots: &ApiRoots,
    forms_url: Option<&str>,
) -> Resolution {
    if schema.has_inline_components() {
        return Resolution::default();
    }

    let mut resolution = Resolution::default();
    let has_target = !schema.form.is_empty() || !schema.path.is_empty();

    if !schema.src.is_empty() {
        resolution.source.clone_from(&schema.src);
    } else if forms_url.is_none() && has_target {
        let mut base = match schema.project.as_deref().filter(|p| !p.is_empty()) {
            Some(project) if is_object_id(project) => {
                format!("{}/project/{project}", roots.base_url)
            }
            Some(project) => format!("{}/{project}", roots.base_url),
            None => roots.project_url.clone(),
        };
        resolution.project = Some(base.clone());

        if !schema.form.is_empty() {
            base.push_str("/form/");
            base.push_str(&schema.form);
        } else {
            base.push('/');
            base.push_str(&schema.path);
        }
        resolution.source = base;
    }

    if resolution.source.is_empty() {
        if let Some(root) = forms_url {
            if !schema.path.is_empty() {
                let parent = root.rsplit_once('/').map_or("", |(parent, _)| parent);
                resolution.source = format!("{parent}/{}", schema.path);
            }
            if !schema.form.is_empty() {
                resolution.source = format!("{root}/{}", schema.form);
            }
        }
    }

    if let Some(revision) = schema.form_revision {
        if !resolution.source.is_empty() {
            resolution.source.push_str(&format!("/v/{revision}"));
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roots() -> ApiRoots {
        ApiRoots::new("https://api.example.com", "https://intake.example.com")
    }

    #[test]
    fn test_src_is_used_verbatim() {
        let schema = NestedFormSchema {
            src: "https://other.example.com/form/xyz".into(),
            form: "ignored".into(),
            ..NestedFormSchema::default()
        };
        let resolution = resolve_source(&schema, &roots(), Some("https://root.example.com/form"));
        assert_eq!(resolution.source, "https://other.example.com/form/xyz");
        assert_eq!(resolution.project, None);
    }

    #[test]
    fn test_src_with_revision() {
        let schema = NestedFormSchema {
            src: "https://other.example.com/form/xyz".into(),
            form_revision: Some(4),
            ..NestedFormSchema::default()
        };
        assert_eq!(
            resolve_source(&schema, &roots(), None).source,
            "https://other.example.com/form/xyz/v/4"
        );
    }

    #[test]
    fn test_revision_zero_is_appended() {
        let schema = NestedFormSchema {
            form_revision: Some(0),
            ..NestedFormSchema::for_form("child", "abc")
        };
        assert_eq!(
            resolve_source(&schema, &roots(), None).source,
            "https://intake.example.com/form/abc/v/0"
        );
    }

    #[test]
    fn test_object_id_project() {
        let schema = NestedFormSchema {
            project: Some("5d0797bc872fc747da559858".into()),
            form: "abc".into(),
            ..NestedFormSchema::default()
        };
        let resolution = resolve_source(&schema, &roots(), None);
        assert_eq!(
            resolution.source,
            "https://api.example.com/project/5d0797bc872fc747da559858/form/abc"
        );
        assert_eq!(
            resolution.project.as_deref(),
            Some("https://api.example.com/project/5d0797bc872fc747da559858")
        );
    }

    #[test]
    fn test_slug_project_with_path() {
        let schema = NestedFormSchema {
            project: Some("intake".into()),
            path: "applicant".into(),
            ..NestedFormSchema::default()
        };
        assert_eq!(
            resolve_source(&schema, &roots(), None).source,
            "https://api.example.com/intake/applicant"
        );
    }

    #[test]
    fn test_form_wins_over_path() {
        let schema = NestedFormSchema {
            form: "abc".into(),
            path: "applicant".into(),
            ..NestedFormSchema::default()
        };
        assert_eq!(
            resolve_source(&schema, &roots(), None).source,
            "https://intake.example.com/form/abc"
        );
    }

    #[test]
    fn test_ambient_forms_root_with_form() {
        let schema = NestedFormSchema::for_form("child", "abc");
        let resolution = resolve_source(&schema, &roots(), Some("https://root.example.com/form"));
        assert_eq!(resolution.source, "https://root.example.com/form/abc");
        assert_eq!(resolution.project, None);
    }

    #[test]
    fn test_ambient_forms_root_with_path() {
        let schema = NestedFormSchema {
            path: "applicant".into(),
            ..NestedFormSchema::default()
        };
        assert_eq!(
            resolve_source(&schema, &roots(), Some("https://root.example.com/form")).source,
            "https://root.example.com/applicant"
        );
    }

    #[test]
    fn test_inline_components_skip_resolution() {
        let schema = NestedFormSchema {
            form: "abc".into(),
            components: vec![serde_json::json!({ "type": "textfield" })],
            ..NestedFormSchema::inline("child", Vec::new())
        };
        assert!(resolve_source(&schema, &roots(), None).is_empty());
    }

    #[test]
    fn test_nothing_to_resolve() {
        let schema = NestedFormSchema {
            form_revision: Some(1),
            ..NestedFormSchema::default()
        };
        assert!(resolve_source(&schema, &roots(), None).is_empty());
    }

    #[test]
    fn test_roots_trim_trailing_slash() {
        let roots = ApiRoots::new("https://api.example.com/", "https://intake.example.com//");
        assert_eq!(roots.base_url, "https://api.example.com");
        assert_eq!(roots.project_url, "https://intake.example.com");
    }

    #[test]
    fn test_is_object_id() {
        assert!(is_object_id("5d0797bc872fc747da559858"));
        assert!(!is_object_id("5d0797bc872fc747da55985"));
        assert!(!is_object_id("intake-project-slug-0000"));
    }

    proptest! {
        #[test]
        fn form_only_resolves_under_project_root(
            form in "[a-z0-9]{1,24}",
            revision in proptest::option::of(0u64..1000),
        ) {
            let schema = NestedFormSchema {
                form: form.clone(),
                form_revision: revision,
                ..NestedFormSchema::default()
            };
            let expected = revision.map_or_else(
                || format!("https://intake.example.com/form/{form}"),
                |rev| format!("https://intake.example.com/form/{form}/v/{rev}"),
            );
            prop_assert_eq!(resolve_source(&schema, &roots(), None).source, expected);
        }
    }
}
