//! Event bus shared by a form and its components
//!
//! [`Emitter`] is a synchronous listener registry: `emit` calls every
//! listener registered for the exact event name, in registration order.
//! Listeners are cloned out of the lock before they run, so a listener may
//! emit or subscribe without deadlocking.
//!
//! [`ChildEvents`] wraps the emitter handed to an embedded form and decides
//! which of its events reach the parent bus.

mod filter;

pub use filter::{is_internal_event, ChildEvents, INTERNAL_EVENTS};

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An emitted event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Full event name, including any namespace prefix
    pub name: String,
    /// Event payload
    pub payload: Value,
}

/// Callback invoked for each matching event
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`Emitter::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a listener registry
///
/// # Examples
///
/// ```rust
/// use nested_form::events::Emitter;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let bus = Emitter::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&seen);
/// bus.on("form.change", move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.emit("form.change", serde_json::json!({}));
/// bus.emit("form.blur", serde_json::json!({}));
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct Emitter {
    registry: Arc<Registry>,
}

impl Emitter {
    /// Create an empty emitter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an exact event name
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry
            .listeners
            .write()
            .entry(name.into())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.registry.listeners.write();
        let mut removed = false;
        for entries in listeners.values_mut() {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            removed |= entries.len() != before;
        }
        listeners.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Emit an event; returns how many listeners ran
    pub fn emit(&self, name: &str, payload: Value) -> usize {
        let listeners: Vec<Listener> = self
            .registry
            .listeners
            .read()
            .get(name)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        if listeners.is_empty() {
            return 0;
        }

        let event = Event {
            name: name.to_string(),
            payload,
        };
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }

    /// Number of listeners registered for a name
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry
            .listeners
            .read()
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Whether two handles share one registry
    #[must_use]
    pub fn same_bus(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.registry.listeners.read();
        f.debug_struct("Emitter")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Prefix an event name with a namespace
#[must_use]
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Strip a leading `{namespace}.` from an event name
///
/// Only a prefix is removed; `{namespace}.` appearing later in the name is
/// left in place.
#[must_use]
pub fn strip_namespace<'a>(namespace: &str, name: &'a str) -> &'a str {
    if namespace.is_empty() {
        return name;
    }
    name.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_emit_reaches_only_matching_listeners() {
        let bus = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        bus.on("form.change", move |event| log.lock().push(event.payload.clone()));

        assert_eq!(bus.emit("form.change", json!({ "a": 1 })), 1);
        assert_eq!(bus.emit("form.blur", json!({})), 0);
        assert_eq!(*seen.lock(), vec![json!({ "a": 1 })]);
    }

    #[test]
    fn test_off_removes_listener() {
        let bus = Emitter::new();
        let id = bus.on("form.change", |_| {});
        assert_eq!(bus.listener_count("form.change"), 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.listener_count("form.change"), 0);
    }

    #[test]
    fn test_listener_may_emit_reentrantly() {
        let bus = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = bus.clone();
        bus.on("outer", move |_| {
            inner.emit("inner", json!(null));
        });
        let log = Arc::clone(&seen);
        bus.on("inner", move |event| log.lock().push(event.name.clone()));

        bus.emit("outer", json!(null));
        assert_eq!(*seen.lock(), vec!["inner".to_string()]);
    }

    #[test]
    fn test_clones_share_registry() {
        let bus = Emitter::new();
        let clone = bus.clone();
        clone.on("x", |_| {});
        assert!(bus.same_bus(&clone));
        assert!(!bus.same_bus(&Emitter::new()));
        assert_eq!(bus.listener_count("x"), 1);
    }

    #[test]
    fn test_namespace_helpers() {
        assert_eq!(qualify("form", "change"), "form.change");
        assert_eq!(qualify("", "change"), "change");
        assert_eq!(strip_namespace("form", "form.change"), "change");
        assert_eq!(strip_namespace("form", "formchange"), "formchange");
        assert_eq!(strip_namespace("form", "other.change"), "other.change");
        assert_eq!(strip_namespace("", "form.change"), "form.change");
        assert_eq!(strip_namespace("form", "wizard.form.change"), "wizard.form.change");
    }
}
