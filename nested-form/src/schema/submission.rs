//! Submission values
//!
//! While unsubmitted a nested form holds `{ "data": {...} }`. Once submitted
//! in reference mode it holds only `{ "_id": "...", "form": "..." }`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value of a nested form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Persisted submission id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Id of the form the submission belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Field data of the embedded form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    /// Any other submission metadata (owner, timestamps, state)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Default for Submission {
    fn default() -> Self {
        Self::empty()
    }
}

impl Submission {
    /// The empty value: `{ "data": {} }`
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: None,
            form: None,
            data: Some(Map::new()),
            metadata: Map::new(),
        }
    }

    /// A submission holding the given data
    #[must_use]
    pub fn with_data(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            ..Self::empty()
        }
    }

    /// A reference-only submission: `{ "_id", "form" }`
    #[must_use]
    pub fn reference(id: impl Into<String>, form: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            form: Some(form.into()),
            data: None,
            metadata: Map::new(),
        }
    }

    /// Whether this carries a persisted id
    #[must_use]
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Whether this already looks like a completed, referenced submission
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.has_id() && self.form.as_deref().is_some_and(|form| !form.is_empty())
    }

    /// Whether there is no field data
    #[must_use]
    pub fn has_empty_data(&self) -> bool {
        self.data.as_ref().is_none_or(Map::is_empty)
    }

    /// Collapse to `{ "_id", "form" }`, discarding data and metadata
    #[must_use]
    pub fn to_reference(&self) -> Self {
        Self {
            id: self.id.clone(),
            form: self.form.clone(),
            data: None,
            metadata: Map::new(),
        }
    }

    /// The data slice handed to the embedded form, as a JSON object
    #[must_use]
    pub fn data_value(&self) -> Value {
        Value::Object(self.data.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_value_wire_format() {
        assert_eq!(
            serde_json::to_value(Submission::empty()).unwrap(),
            json!({ "data": {} })
        );
    }

    #[test]
    fn test_reference_wire_format() {
        let reference = Submission::reference("sub1", "form1");
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({ "_id": "sub1", "form": "form1" })
        );
        assert!(reference.is_submitted());
        assert!(reference.has_empty_data());
    }

    #[test]
    fn test_to_reference_discards_data() {
        let full: Submission = serde_json::from_value(json!({
            "_id": "sub1",
            "form": "form1",
            "owner": "user7",
            "data": { "name": "Ada" }
        }))
        .unwrap();

        assert_eq!(full.metadata.get("owner"), Some(&json!("user7")));
        assert_eq!(full.to_reference(), Submission::reference("sub1", "form1"));
    }

    #[test]
    fn test_is_submitted_requires_both_ids() {
        let only_id: Submission = serde_json::from_value(json!({ "_id": "sub1" })).unwrap();
        assert!(only_id.has_id());
        assert!(!only_id.is_submitted());

        let blank = Submission::reference("", "form1");
        assert!(!blank.is_submitted());
    }

    #[test]
    fn test_data_value() {
        let sub: Submission = serde_json::from_value(json!({ "data": { "a": 1 } })).unwrap();
        assert_eq!(sub.data_value(), json!({ "a": 1 }));
        assert_eq!(Submission::reference("x", "y").data_value(), json!({}));
    }
}
