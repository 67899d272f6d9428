//! Configuration of the embedding field
//!
//! Mirrors the JSON component schema: keys are camelCase, every field has a
//! default so partial schemas deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Component type name for nested forms
pub const COMPONENT_TYPE: &str = "form";

/// Schema of a nested form field
///
/// # Examples
///
/// ```rust
/// use nested_form::schema::NestedFormSchema;
///
/// let schema: NestedFormSchema = serde_json::from_value(serde_json::json!({
///     "key": "applicant",
///     "form": "5d0797bc872fc747da559858",
///     "formRevision": 3
/// }))
/// .unwrap();
///
/// assert_eq!(schema.key, "applicant");
/// assert_eq!(schema.form_revision, Some(3));
/// assert!(schema.reference);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NestedFormSchema {
    /// Display label
    pub label: String,
    /// Component type (always `form`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Data key of this field in the parent submission
    pub key: String,
    /// Explicit remote base, used verbatim when set
    pub src: String,
    /// Store only a submission reference after submitting
    pub reference: bool,
    /// Form id
    pub form: String,
    /// Form path slug
    pub path: String,
    /// Project id or slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Pinned form revision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_revision: Option<u64>,
    /// Inline component definitions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    /// Title of an inline definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Simple show/hide condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl Default for NestedFormSchema {
    fn default() -> Self {
        Self {
            label: "Form".to_string(),
            kind: COMPONENT_TYPE.to_string(),
            key: "form".to_string(),
            src: String::new(),
            reference: true,
            form: String::new(),
            path: String::new(),
            project: None,
            form_revision: None,
            components: Vec::new(),
            title: None,
            conditional: None,
        }
    }
}

impl NestedFormSchema {
    /// Schema referencing a form by id
    #[must_use]
    pub fn for_form(key: impl Into<String>, form: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            form: form.into(),
            ..Self::default()
        }
    }

    /// Schema embedding its components inline
    #[must_use]
    pub fn inline(key: impl Into<String>, components: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            components,
            ..Self::default()
        }
    }

    /// Whether the embedded form is defined inline
    #[must_use]
    pub fn has_inline_components(&self) -> bool {
        !self.components.is_empty()
    }
}

/// Simple conditional: show (or hide) when `when` equals `eq`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditional {
    /// Show (`true`) or hide (`false`) on match; may be a string
    pub show: Option<Value>,
    /// Key of the field to compare (dotted paths allowed)
    pub when: Option<String>,
    /// Value to compare against
    pub eq: Option<Value>,
}

impl Conditional {
    /// Evaluate against a data object. Incomplete conditionals always pass.
    #[must_use]
    pub fn evaluate(&self, data: &Value) -> bool {
        let (Some(show), Some(when)) = (self.show.as_ref(), self.when.as_deref()) else {
            return true;
        };
        let show = match show {
            Value::Bool(flag) => *flag,
            Value::String(s) => s == "true",
            _ => return true,
        };

        let actual = when
            .split('.')
            .try_fold(data, |current, segment| current.get(segment));
        let expected = self.eq.as_ref().map(value_text).unwrap_or_default();
        let matched = actual.map(value_text).unwrap_or_default() == expected;

        if matched {
            show
        } else {
            !show
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Palette entry for form builders
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderInfo {
    /// Palette title
    pub title: &'static str,
    /// Icon class
    pub icon: &'static str,
    /// Palette group
    pub group: &'static str,
    /// Ordering weight in the group
    pub weight: u32,
    /// User guide page for the component
    pub documentation: &'static str,
    /// Schema of a freshly dropped component
    pub schema: NestedFormSchema,
}

/// Builder palette entry for the nested form component
#[must_use]
pub fn builder_info() -> BuilderInfo {
    BuilderInfo {
        title: "Nested Form",
        icon: "fa fa-wpforms",
        group: "advanced",
        weight: 110,
        documentation: "http://help.form.io/userguide/#form",
        schema: NestedFormSchema::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_defaults() {
        let schema: NestedFormSchema = serde_json::from_value(json!({})).unwrap();
        assert_eq!(schema.label, "Form");
        assert_eq!(schema.kind, "form");
        assert_eq!(schema.key, "form");
        assert!(schema.reference);
        assert!(schema.src.is_empty());
        assert!(!schema.has_inline_components());
    }

    #[test]
    fn test_reference_can_be_disabled() {
        let schema: NestedFormSchema =
            serde_json::from_value(json!({ "reference": false })).unwrap();
        assert!(!schema.reference);
    }

    #[test]
    fn test_revision_zero_is_kept() {
        let schema: NestedFormSchema =
            serde_json::from_value(json!({ "formRevision": 0 })).unwrap();
        assert_eq!(schema.form_revision, Some(0));
    }

    #[test]
    fn test_conditional_show_on_match() {
        let cond = Conditional {
            show: Some(json!(true)),
            when: Some("kind".into()),
            eq: Some(json!("business")),
        };
        assert!(cond.evaluate(&json!({ "kind": "business" })));
        assert!(!cond.evaluate(&json!({ "kind": "personal" })));
        assert!(!cond.evaluate(&json!({})));
    }

    #[test]
    fn test_conditional_hide_on_match_with_string_flag() {
        let cond = Conditional {
            show: Some(json!("false")),
            when: Some("owner.age".into()),
            eq: Some(json!(17)),
        };
        assert!(!cond.evaluate(&json!({ "owner": { "age": 17 } })));
        assert!(cond.evaluate(&json!({ "owner": { "age": 40 } })));
    }

    #[test]
    fn test_incomplete_conditional_passes() {
        assert!(Conditional::default().evaluate(&json!({ "a": 1 })));
    }

    #[test]
    fn test_builder_info() {
        let info = builder_info();
        assert_eq!(info.title, "Nested Form");
        assert_eq!(info.group, "advanced");
        assert_eq!(info.weight, 110);
        assert_eq!(info.documentation, "http://help.form.io/userguide/#form");
        assert_eq!(info.schema, NestedFormSchema::default());
    }
}
