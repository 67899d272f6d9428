//! The nested form component
//!
//! A [`NestedForm`] is a field whose value is the submission of another,
//! embedded form. It resolves where the embedded definition lives, loads it
//! once, instantiates it into its [`Anchor`], and from then on routes values,
//! validation, conditions and submission through it.
//!
//! # Example
//!
//! ```rust
//! use nested_form::prelude::*;
//! use nested_form::testing::{FakeRenderer, StaticLoader};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), FormError> {
//! let loader = Arc::new(StaticLoader::new(FormDefinition::new("Applicant", vec![])));
//! let renderer = Arc::new(FakeRenderer::new());
//!
//! let field = NestedForm::builder(
//!     NestedFormSchema::for_form("applicant", "abc123"),
//!     loader.clone(),
//!     renderer.clone(),
//! )
//! .roots(ApiRoots::new("https://api.example.com", "https://intake.example.com"))
//! .build();
//!
//! let child = field.ensure_loaded().wait().await?;
//! assert!(child.is_some());
//! assert_eq!(loader.requested(), vec!["https://intake.example.com/form/abc123".to_string()]);
//! # Ok(())
//! # }
//! ```

mod bridge;
mod lifecycle;
mod loader;
mod options;
mod ready;
mod traits;
mod value;

pub use options::{ChildOptions, HostOptions};
pub use ready::{Readiness, ReadySignal};
pub use traits::{
    ChangeFlags, ChangeHook, ChildForm, ComponentBase, DefaultBase, EmbeddedForm, FormComponent,
    FormLoader, FormRenderer, FormRoot, LoadQuery, RootRef, ValueFlags,
};
pub use value::ValueChange;

#[cfg(test)]
pub use traits::MockFormLoader;

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

use crate::config::NestedFormConfig;
use crate::dom::Anchor;
use crate::error::{FormError, FormResult};
use crate::events::{qualify, ChildEvents, Emitter, ListenerId};
use crate::schema::{NestedFormSchema, Submission};
use crate::source::{resolve_source, ApiRoots, Resolution};

/// Load progress of the embedded form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No load requested yet
    #[default]
    NotLoaded,
    /// Definition fetch or instantiation in progress
    Loading,
    /// Embedded form instantiated (or skipped in builder mode)
    Ready,
    /// Fetch or instantiation failed
    Failed,
}

/// Non-owning reference to the form governing page navigation
#[derive(Clone)]
pub struct CurrentForm {
    key: String,
    owner: Weak<Inner>,
}

impl CurrentForm {
    /// A context not backed by a nested form (e.g. a top-level wizard)
    #[must_use]
    pub fn detached(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: Weak::new(),
        }
    }

    /// Key of the owning component
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owning nested form, while it is alive
    #[must_use]
    pub fn upgrade(&self) -> Option<NestedForm> {
        self.owner.upgrade().map(|inner| NestedForm { inner })
    }
}

impl fmt::Debug for CurrentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentForm")
            .field("key", &self.key)
            .field("alive", &(self.owner.strong_count() > 0))
            .finish()
    }
}

/// A form field that embeds another form
///
/// Cloning is cheap; clones share one component.
#[derive(Clone)]
pub struct NestedForm {
    inner: Arc<Inner>,
}

struct Inner {
    schema: NestedFormSchema,
    options: HostOptions,
    roots: ApiRoots,
    loader: Arc<dyn FormLoader>,
    renderer: Arc<dyn FormRenderer>,
    base: Arc<dyn ComponentBase>,
    events: Emitter,
    anchor: Anchor,
    state: Mutex<State>,
}

struct State {
    load_state: LoadState,
    ready: ReadySignal,
    generation: u64,
    resolved: Option<Resolution>,
    child: Option<ChildForm>,
    child_events: Option<(ChildEvents, ListenerId)>,
    value: Submission,
    pending: VecDeque<(Submission, ValueFlags)>,
    replaying: bool,
    visible: bool,
    parent_visible: bool,
    nosubmit: bool,
    root: Option<RootRef>,
    current_form: Option<CurrentForm>,
    root_data: Value,
    bus_listener: Option<ListenerId>,
}

impl State {
    fn new(value: Submission) -> Self {
        Self {
            load_state: LoadState::NotLoaded,
            ready: ReadySignal::new(),
            generation: 0,
            resolved: None,
            child: None,
            child_events: None,
            value,
            pending: VecDeque::new(),
            replaying: false,
            visible: true,
            parent_visible: true,
            nosubmit: false,
            root: None,
            current_form: None,
            root_data: Value::Object(serde_json::Map::new()),
            bus_listener: None,
        }
    }

    const fn effective_visibility(&self) -> bool {
        self.visible && self.parent_visible
    }
}

/// Spawn on the ambient tokio runtime
///
/// Fails with [`FormError::Task`] when called outside a runtime.
fn spawn<F>(future: F) -> FormResult<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.spawn(future))
        .map_err(|err| FormError::Task(err.to_string()))
}

/// Builder for [`NestedForm`]
pub struct NestedFormBuilder {
    schema: NestedFormSchema,
    options: HostOptions,
    roots: ApiRoots,
    loader: Arc<dyn FormLoader>,
    renderer: Arc<dyn FormRenderer>,
    base: Option<Arc<dyn ComponentBase>>,
    events: Option<Emitter>,
    anchor: Option<Anchor>,
    value: Submission,
}

impl NestedFormBuilder {
    /// Set the containing form's options
    #[must_use]
    pub fn options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the API roots used for source resolution
    #[must_use]
    pub fn roots(mut self, roots: ApiRoots) -> Self {
        self.roots = roots;
        self
    }

    /// Apply configuration: API roots, event namespace and load query
    #[must_use]
    pub fn config(mut self, config: &NestedFormConfig) -> Self {
        self.roots = ApiRoots::from(&config.api);
        self.options.namespace.clone_from(&config.events.namespace);
        self.options.live = config.loading.live;
        self
    }

    /// Set the generic component behavior
    #[must_use]
    pub fn base(mut self, base: Arc<dyn ComponentBase>) -> Self {
        self.base = Some(base);
        self
    }

    /// Attach to the containing form's event bus
    #[must_use]
    pub fn events(mut self, events: Emitter) -> Self {
        self.events = Some(events);
        self
    }

    /// Mount into an existing anchor
    #[must_use]
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Initial value
    #[must_use]
    pub fn value(mut self, value: Submission) -> Self {
        self.value = value;
        self
    }

    /// Build the component and subscribe it to the bus
    #[must_use]
    pub fn build(self) -> NestedForm {
        let base = self
            .base
            .unwrap_or_else(|| Arc::new(DefaultBase::from_schema(&self.schema)));
        let form = NestedForm {
            inner: Arc::new(Inner {
                options: self.options,
                roots: self.roots,
                loader: self.loader,
                renderer: self.renderer,
                base,
                events: self.events.unwrap_or_default(),
                anchor: self.anchor.unwrap_or_default(),
                state: Mutex::new(State::new(self.value)),
                schema: self.schema,
            }),
        };
        form.listen_for_nosubmit();
        form
    }
}

impl NestedForm {
    /// Start building a component for `schema`
    #[must_use]
    pub fn builder(
        schema: NestedFormSchema,
        loader: Arc<dyn FormLoader>,
        renderer: Arc<dyn FormRenderer>,
    ) -> NestedFormBuilder {
        NestedFormBuilder {
            schema,
            options: HostOptions::default(),
            roots: ApiRoots::default(),
            loader,
            renderer,
            base: None,
            events: None,
            anchor: None,
            value: Submission::empty(),
        }
    }

    fn listen_for_nosubmit(&self) {
        let weak = Arc::downgrade(&self.inner);
        let name = qualify(&self.inner.options.namespace, "nosubmit");
        let id = self.inner.events.on(name, move |event| {
            if let Some(inner) = weak.upgrade() {
                NestedForm { inner }.set_nosubmit(event.payload.as_bool().unwrap_or(false));
            }
        });
        self.inner.state.lock().bus_listener = Some(id);
    }

    /// The field schema
    #[must_use]
    pub fn schema(&self) -> &NestedFormSchema {
        &self.inner.schema
    }

    /// Data key of the field
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.schema.key
    }

    /// Options of the containing form
    #[must_use]
    pub fn options(&self) -> &HostOptions {
        &self.inner.options
    }

    /// The mount point
    #[must_use]
    pub fn anchor(&self) -> &Anchor {
        &self.inner.anchor
    }

    /// The containing form's event bus
    #[must_use]
    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }

    /// Event namespace
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.options.namespace
    }

    /// Current load progress
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.inner.state.lock().load_state
    }

    /// The embedded form, once instantiated
    #[must_use]
    pub fn child(&self) -> Option<ChildForm> {
        self.inner.state.lock().child.clone()
    }

    /// The current readiness signal, without starting a load
    #[must_use]
    pub fn data_ready(&self) -> ReadySignal {
        self.inner.state.lock().ready.clone()
    }

    /// Source resolution, computed on first use
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        state
            .resolved
            .get_or_insert_with(|| {
                resolve_source(&inner.schema, &inner.roots, inner.options.forms_url.as_deref())
            })
            .clone()
    }

    /// Locator of the embedded definition; empty for inline definitions
    #[must_use]
    pub fn resolved_source(&self) -> String {
        self.resolution().source
    }

    /// Record the data of the outermost form, used to evaluate conditions
    pub fn set_root_data(&self, data: Value) {
        self.inner.state.lock().root_data = data;
    }

    /// This component as the page-navigation context of its descendants
    #[must_use]
    pub fn as_current_form(&self) -> CurrentForm {
        CurrentForm {
            key: self.inner.schema.key.clone(),
            owner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same component
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NestedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("NestedForm")
            .field("key", &self.inner.schema.key)
            .field("load_state", &state.load_state)
            .field("has_child", &state.child.is_some())
            .field("value", &state.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormDefinition;
    use crate::testing::{FakeRenderer, StaticLoader};
    use serde_json::json;

    fn field(schema: NestedFormSchema) -> NestedForm {
        NestedForm::builder(
            schema,
            Arc::new(StaticLoader::new(FormDefinition::new("Child", vec![]))),
            Arc::new(FakeRenderer::new()),
        )
        .roots(ApiRoots::new("https://api.example.com", "https://intake.example.com"))
        .build()
    }

    #[test]
    fn test_resolution_is_cached() {
        let form = field(NestedFormSchema::for_form("applicant", "abc"));
        assert_eq!(form.resolved_source(), "https://intake.example.com/form/abc");
        assert_eq!(form.resolution(), form.resolution());
        assert_eq!(form.key(), "applicant");
        assert_eq!(form.load_state(), LoadState::NotLoaded);
    }

    #[test]
    fn test_ambient_forms_url_from_options() {
        let form = NestedForm::builder(
            NestedFormSchema::for_form("applicant", "abc"),
            Arc::new(StaticLoader::new(FormDefinition::new("Child", vec![]))),
            Arc::new(FakeRenderer::new()),
        )
        .options(HostOptions::default().forms_url("https://root.example.com/form"))
        .build();
        assert_eq!(form.resolved_source(), "https://root.example.com/form/abc");
    }

    #[test]
    fn test_config_applies_roots_and_namespace() {
        let mut config = NestedFormConfig::default();
        config.api.base_url = "https://api.example.com/".into();
        config.events.namespace = "intake".into();

        let form = NestedForm::builder(
            NestedFormSchema::for_form("applicant", "abc"),
            Arc::new(StaticLoader::new(FormDefinition::new("Child", vec![]))),
            Arc::new(FakeRenderer::new()),
        )
        .config(&config)
        .build();

        assert_eq!(form.namespace(), "intake");
        assert_eq!(form.resolved_source(), "https://api.example.com/form/abc");
        assert_eq!(form.events().listener_count("intake.nosubmit"), 1);
    }

    #[test]
    fn test_current_form_reference_is_weak() {
        let form = field(NestedFormSchema::for_form("applicant", "abc"));
        let context = form.as_current_form();
        assert_eq!(context.key(), "applicant");
        assert!(context.upgrade().is_some_and(|owner| owner.ptr_eq(&form)));

        drop(form);
        assert!(context.upgrade().is_none());
        assert!(CurrentForm::detached("wizard").upgrade().is_none());
    }

    #[test]
    fn test_bus_nosubmit_event() {
        let form = field(NestedFormSchema::for_form("applicant", "abc"));
        form.events().emit("form.nosubmit", json!(true));
        assert!(form.nosubmit());
        form.events().emit("form.nosubmit", json!(false));
        assert!(!form.nosubmit());
    }
}
