//! Scripted embedded forms

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};

use crate::dom::{Anchor, Node};
use crate::error::{FormError, FormResult};
use crate::events::ChildEvents;
use crate::form::{
    ChildForm, ChildOptions, CurrentForm, EmbeddedForm, FormComponent, FormRenderer, RootRef,
    ValueFlags,
};
use crate::schema::{FormDefinition, Submission};

#[derive(Debug, Clone)]
struct Script {
    render_error: Option<String>,
    submit_result: Result<Submission, FormError>,
    forms_url: Option<String>,
    loaded_submission: Option<Submission>,
    stall_submission_loads: bool,
    has_condition: bool,
    conditions_pass: bool,
    valid: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            render_error: None,
            submit_result: Err(FormError::Submission("no submit result scripted".into())),
            forms_url: None,
            loaded_submission: None,
            stall_submission_loads: false,
            has_condition: false,
            conditions_pass: true,
            valid: true,
        }
    }
}

/// Renderer producing [`FakeChild`] forms
///
/// Each render mounts a `<form>` node into the anchor and records the child.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    script: Script,
    children: Mutex<Vec<Arc<FakeChild>>>,
}

impl FakeRenderer {
    /// Renderer whose children accept everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every render with `message`
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.script.render_error = Some(message.into());
        self
    }

    /// Result of every child's standalone submit
    #[must_use]
    pub fn with_submit_result(mut self, result: Result<Submission, FormError>) -> Self {
        self.script.submit_result = result;
        self
    }

    /// Forms root reported by every child
    #[must_use]
    pub fn with_forms_url(mut self, url: impl Into<String>) -> Self {
        self.script.forms_url = Some(url.into());
        self
    }

    /// Submission returned when a child fetches its submission
    #[must_use]
    pub fn with_loaded_submission(mut self, submission: Submission) -> Self {
        self.script.loaded_submission = Some(submission);
        self
    }

    /// Submission fetches never complete
    #[must_use]
    pub const fn with_stalled_submission_load(mut self) -> Self {
        self.script.stall_submission_loads = true;
        self
    }

    /// Children declare conditional logic evaluating to `pass`
    #[must_use]
    pub const fn with_condition(mut self, pass: bool) -> Self {
        self.script.has_condition = true;
        self.script.conditions_pass = pass;
        self
    }

    /// Validity reported by every child
    #[must_use]
    pub const fn with_validity(mut self, valid: bool) -> Self {
        self.script.valid = valid;
        self
    }

    /// Number of children rendered
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Most recently rendered child
    #[must_use]
    pub fn last_child(&self) -> Option<Arc<FakeChild>> {
        self.children.lock().last().cloned()
    }
}

#[async_trait]
impl FormRenderer for FakeRenderer {
    async fn render(
        &self,
        anchor: Anchor,
        definition: FormDefinition,
        options: ChildOptions,
        events: ChildEvents,
    ) -> FormResult<ChildForm> {
        if let Some(message) = &self.script.render_error {
            return Err(FormError::Render(message.clone()));
        }

        anchor.append(Node::element(
            "form",
            Some("nested-form"),
            vec![Node::text(definition.title.clone())],
        ));
        let child = Arc::new(FakeChild::new(
            definition,
            options,
            events,
            self.script.clone(),
        ));
        self.children.lock().push(Arc::clone(&child));
        Ok(child)
    }
}

#[derive(Debug, Default)]
struct ChildState {
    value: Submission,
    assigned: Vec<Submission>,
    urls: Vec<String>,
    nosubmit: Vec<bool>,
    parent_visible: Option<bool>,
    loading: Option<bool>,
    pristine: Option<bool>,
    has_root: bool,
    current_form: Option<String>,
    field_contexts: Vec<String>,
    errors: Vec<FormError>,
    submit_calls: usize,
    load_submission_calls: usize,
    destroy_calls: usize,
}

/// Embedded form that records every call it receives
#[derive(Debug)]
pub struct FakeChild {
    definition: FormDefinition,
    options: ChildOptions,
    events: ChildEvents,
    script: Script,
    state: Arc<Mutex<ChildState>>,
}

impl FakeChild {
    fn new(
        definition: FormDefinition,
        options: ChildOptions,
        events: ChildEvents,
        script: Script,
    ) -> Self {
        Self {
            definition,
            options,
            events,
            script,
            state: Arc::new(Mutex::new(ChildState::default())),
        }
    }

    /// Simulate user input: replace the data and emit `change`
    pub fn change(&self, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let payload = Value::Object(data.clone());
        self.state.lock().value.data = Some(data);
        self.events.emit(&self.events.qualified("change"), payload);
    }

    /// Emit an arbitrary event through the child's emitter
    pub fn emit(&self, name: &str, payload: Value) {
        self.events.emit(name, payload);
    }

    /// Definition the child was rendered from
    #[must_use]
    pub fn definition(&self) -> FormDefinition {
        self.definition.clone()
    }

    /// Options the child was rendered with
    #[must_use]
    pub fn options(&self) -> ChildOptions {
        self.options.clone()
    }

    /// Values assigned through `set_value`, in order
    #[must_use]
    pub fn assigned(&self) -> Vec<Submission> {
        self.state.lock().assigned.clone()
    }

    /// URLs the child was pointed at, in order
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().urls.clone()
    }

    /// Current submit-suppression flag
    #[must_use]
    pub fn nosubmit(&self) -> bool {
        self.state.lock().nosubmit.last().copied().unwrap_or(false)
    }

    /// Every submit-suppression flag received, in order
    #[must_use]
    pub fn nosubmit_history(&self) -> Vec<bool> {
        self.state.lock().nosubmit.clone()
    }

    /// Inherited visibility; visible until told otherwise
    #[must_use]
    pub fn parent_visible(&self) -> bool {
        self.state.lock().parent_visible.unwrap_or(true)
    }

    /// Last loading flag received
    #[must_use]
    pub fn loading(&self) -> Option<bool> {
        self.state.lock().loading
    }

    /// Last pristine flag received
    #[must_use]
    pub fn pristine(&self) -> Option<bool> {
        self.state.lock().pristine
    }

    /// Whether a root form was attached
    #[must_use]
    pub fn has_root(&self) -> bool {
        self.state.lock().has_root
    }

    /// Key of the page-navigation context set on the child
    #[must_use]
    pub fn current_form_key(&self) -> Option<String> {
        self.state.lock().current_form.clone()
    }

    /// Context keys set on the child's fields
    #[must_use]
    pub fn field_contexts(&self) -> Vec<String> {
        self.state.lock().field_contexts.clone()
    }

    /// Errors reported through the child's error display
    #[must_use]
    pub fn reported_errors(&self) -> Vec<FormError> {
        self.state.lock().errors.clone()
    }

    /// Number of standalone submits
    #[must_use]
    pub fn submit_calls(&self) -> usize {
        self.state.lock().submit_calls
    }

    /// Number of submission fetches
    #[must_use]
    pub fn load_submission_calls(&self) -> usize {
        self.state.lock().load_submission_calls
    }

    /// Number of teardowns
    #[must_use]
    pub fn destroy_calls(&self) -> usize {
        self.state.lock().destroy_calls
    }
}

#[async_trait]
impl EmbeddedForm for FakeChild {
    fn value(&self) -> Submission {
        self.state.lock().value.clone()
    }

    fn set_value(&self, submission: &Submission, _flags: ValueFlags) -> bool {
        let mut state = self.state.lock();
        state.assigned.push(submission.clone());
        let changed = state.value != *submission;
        state.value = submission.clone();
        changed
    }

    fn check_validity(&self, _data: &Value, _dirty: bool) -> bool {
        self.script.valid
    }

    fn has_condition(&self) -> bool {
        self.script.has_condition
    }

    fn check_conditions(&self, _data: &Value) -> bool {
        self.script.conditions_pass
    }

    fn calculate_value(&self, _data: &Value, _flags: ValueFlags) -> bool {
        false
    }

    fn set_pristine(&self, pristine: bool) {
        self.state.lock().pristine = Some(pristine);
    }

    fn components(&self) -> Vec<Arc<dyn FormComponent>> {
        self.definition
            .components
            .iter()
            .filter_map(|component| component.get("key").and_then(Value::as_str))
            .map(|key| {
                Arc::new(FakeComponent {
                    key: key.to_string(),
                    owner: Arc::downgrade(&self.state),
                }) as Arc<dyn FormComponent>
            })
            .collect()
    }

    fn set_root(&self, root: RootRef) {
        self.state.lock().has_root = root.upgrade().is_some();
    }

    fn set_current_form(&self, form: CurrentForm) {
        self.state.lock().current_form = Some(form.key().to_string());
    }

    fn set_parent_visible(&self, visible: bool) {
        self.state.lock().parent_visible = Some(visible);
    }

    fn set_nosubmit(&self, nosubmit: bool) {
        self.state.lock().nosubmit.push(nosubmit);
    }

    fn set_url(&self, url: &str) {
        self.state.lock().urls.push(url.to_string());
    }

    fn forms_url(&self) -> Option<String> {
        self.script.forms_url.clone()
    }

    fn set_loading(&self, loading: bool) {
        self.state.lock().loading = Some(loading);
    }

    async fn submit(&self) -> FormResult<Submission> {
        let mut state = self.state.lock();
        state.submit_calls += 1;
        let result = self.script.submit_result.clone();
        if let Ok(submission) = &result {
            state.value = submission.clone();
        }
        result
    }

    async fn load_submission(&self) -> FormResult<Submission> {
        let url = {
            let mut state = self.state.lock();
            state.load_submission_calls += 1;
            state.urls.last().cloned().unwrap_or_default()
        };
        if self.script.stall_submission_loads {
            std::future::pending::<()>().await;
        }
        self.script
            .loaded_submission
            .clone()
            .ok_or_else(|| FormError::Submission(format!("no submission at {url}")))
    }

    fn on_submission_error(&self, error: &FormError) {
        self.state.lock().errors.push(error.clone());
    }

    fn destroy(&self) {
        self.state.lock().destroy_calls += 1;
    }
}

/// Field of a [`FakeChild`]
#[derive(Debug)]
pub struct FakeComponent {
    key: String,
    owner: Weak<Mutex<ChildState>>,
}

impl FormComponent for FakeComponent {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn set_current_form(&self, form: CurrentForm) {
        if let Some(state) = self.owner.upgrade() {
            state.lock().field_contexts.push(form.key().to_string());
        }
    }
}
