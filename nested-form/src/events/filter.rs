//! Selective bridging of embedded form events
//!
//! Every event the embedded form emits fires on its own scope. Events that
//! are not cross-component plumbing are also re-emitted on the parent bus,
//! so application code sees custom child events without the internal noise.

use serde_json::Value;

use super::{qualify, strip_namespace, Emitter, ListenerId};

/// Event names that never leave the embedded form
pub const INTERNAL_EVENTS: &[&str] = &[
    "focus",
    "blur",
    "componentChange",
    "componentError",
    "error",
    "formLoad",
    "languageChanged",
    "render",
    "checkValidity",
    "initialized",
    "submit",
    "submitButton",
    "nosubmit",
    "updateComponent",
    "submitDone",
    "submissionDeleted",
    "requestDone",
    "nextPage",
    "prevPage",
    "wizardNavigationClicked",
    "updateWizardNav",
    "restoreDraft",
    "saveDraft",
    "saveComponent",
];

/// Whether an event name (without namespace) is internal-only
#[must_use]
pub fn is_internal_event(name: &str) -> bool {
    INTERNAL_EVENTS.contains(&name)
}

/// Emitter handed to an embedded form
///
/// # Examples
///
/// ```rust
/// use nested_form::events::{ChildEvents, Emitter};
/// use serde_json::json;
///
/// let parent = Emitter::new();
/// let events = ChildEvents::new(parent.clone(), "form");
///
/// parent.on("form.customAction", |event| println!("{}", event.payload));
///
/// // Reaches the parent bus
/// events.emit("form.customAction", json!({ "id": 7 }));
/// // Stays inside the embedded form
/// events.emit("form.render", json!({}));
/// ```
#[derive(Debug, Clone)]
pub struct ChildEvents {
    scope: Emitter,
    parent: Emitter,
    namespace: String,
}

impl ChildEvents {
    /// Wrap a fresh child scope that forwards to `parent`
    #[must_use]
    pub fn new(parent: Emitter, namespace: impl Into<String>) -> Self {
        Self {
            scope: Emitter::new(),
            parent,
            namespace: namespace.into(),
        }
    }

    /// Emit on the child scope, re-emitting non-internal events on the parent
    pub fn emit(&self, name: &str, payload: Value) {
        let event_type = strip_namespace(&self.namespace, name);

        if is_internal_event(event_type) {
            self.scope.emit(name, payload);
            return;
        }

        self.scope.emit(name, payload.clone());
        let forwarded = self.parent.emit(&qualify(&self.namespace, event_type), payload);
        tracing::trace!(event = event_type, listeners = forwarded, "Bridged child event");
    }

    /// Listen on the child scope for an unqualified event name
    pub fn on<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&super::Event) + Send + Sync + 'static,
    {
        self.scope.on(self.qualified(name), listener)
    }

    /// Remove a child-scope listener
    pub fn off(&self, id: ListenerId) -> bool {
        self.scope.off(id)
    }

    /// The child-scope emitter
    #[must_use]
    pub const fn scope(&self) -> &Emitter {
        &self.scope
    }

    /// Namespace applied to event names
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Qualify an event name with this namespace
    #[must_use]
    pub fn qualified(&self, name: &str) -> String {
        qualify(&self.namespace, name)
    }
}
