//! Embedded form definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NestedFormSchema;

/// Definition of the embedded form, as fetched or as declared inline
///
/// Only the parts the embedding field needs are typed; everything else is
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefinition {
    /// Form title
    pub title: String,
    /// Top-level components
    pub components: Vec<Value>,
    /// All other definition attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormDefinition {
    /// Create a definition from a title and components
    #[must_use]
    pub fn new(title: impl Into<String>, components: Vec<Value>) -> Self {
        Self {
            title: title.into(),
            components,
            extra: Map::new(),
        }
    }

    /// Definition declared inline on a nested form schema
    #[must_use]
    pub fn from_schema(schema: &NestedFormSchema) -> Self {
        let title = schema.title.clone().unwrap_or_else(|| schema.label.clone());
        Self::new(title, schema.components.clone())
    }

    /// Visit every component object in the tree, including those nested in
    /// `components`, `columns[*].components` and `rows[*][*].components`
    pub fn each_component_mut(&mut self, mut visit: impl FnMut(&mut Map<String, Value>)) {
        walk(&mut self.components, &mut visit);
    }

    /// Mark every submit button hidden and return how many were hidden
    ///
    /// A button counts as a submit button when its `action` is `submit` or
    /// missing.
    pub fn hide_submit_buttons(&mut self) -> usize {
        let mut hidden = 0;
        self.each_component_mut(|component| {
            if is_submit_button(component) {
                component.insert("hidden".to_string(), Value::Bool(true));
                hidden += 1;
            }
        });
        hidden
    }
}

fn is_submit_button(component: &Map<String, Value>) -> bool {
    if component.get("type").and_then(Value::as_str) != Some("button") {
        return false;
    }
    match component.get("action") {
        None | Some(Value::Null) => true,
        Some(Value::String(action)) => action.is_empty() || action == "submit",
        Some(_) => false,
    }
}

fn walk(components: &mut [Value], visit: &mut impl FnMut(&mut Map<String, Value>)) {
    for component in components {
        let Some(object) = component.as_object_mut() else {
            continue;
        };
        visit(object);

        if let Some(Value::Array(children)) = object.get_mut("components") {
            walk(children, visit);
        }
        if let Some(Value::Array(columns)) = object.get_mut("columns") {
            for column in columns {
                if let Some(Value::Array(children)) = column.get_mut("components") {
                    walk(children, visit);
                }
            }
        }
        if let Some(Value::Array(rows)) = object.get_mut("rows") {
            for row in rows {
                let Some(cells) = row.as_array_mut() else {
                    continue;
                };
                for cell in cells {
                    if let Some(Value::Array(children)) = cell.get_mut("components") {
                        walk(children, visit);
                    }
                }
            }
        }
    }
}
