//! Visibility, delegation, submission hooks and teardown

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{
    ChildForm, CurrentForm, FormComponent, FormRoot, LoadState, NestedForm, ReadySignal, ValueFlags,
};
use crate::error::{FormError, FormResult};
use crate::schema::Submission;

impl NestedForm {
    /// Show or hide the field; returns `shown`
    ///
    /// Showing an unloaded field starts the load. Hiding an unloaded field
    /// of a read-only form that has finished loading settles readiness with
    /// whatever embedded form exists, so the parent stops waiting for it.
    pub fn show(&self, shown: bool) -> bool {
        let (load_state, ready, child) = {
            let state = self.inner.state.lock();
            (state.load_state, state.ready.clone(), state.child.clone())
        };

        if load_state == LoadState::NotLoaded {
            if shown {
                let _ = self.ensure_loaded();
            } else if self.inner.options.read_only && !self.inner.base.parent_is_loading() {
                ready.resolve(child);
            }
        }
        shown
    }

    /// Set this field's own visibility
    pub fn set_visible(&self, visible: bool) {
        let effective = {
            let mut state = self.inner.state.lock();
            state.visible = visible;
            state.effective_visibility()
        };
        self.cascade_visibility(effective);
    }

    /// Set the visibility inherited from the containing component
    pub fn set_parent_visible(&self, visible: bool) {
        let effective = {
            let mut state = self.inner.state.lock();
            state.parent_visible = visible;
            state.effective_visibility()
        };
        self.cascade_visibility(effective);
    }

    fn cascade_visibility(&self, effective: bool) {
        if let Some(child) = self.child() {
            child.set_parent_visible(effective);
        }
        self.show(effective);
    }

    /// Effective visibility: own and inherited
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.state.lock().effective_visibility()
    }

    /// Whether the field is hidden, by visibility or by its own conditions
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        let (visible, root_data) = {
            let state = self.inner.state.lock();
            (state.effective_visibility(), state.root_data.clone())
        };
        !visible || !self.inner.base.check_conditions(&root_data)
    }

    /// Validate through the embedded form, or the base without one
    #[must_use]
    pub fn check_validity(&self, data: &Value, dirty: bool) -> bool {
        match self.child() {
            Some(child) => child.check_validity(&self.data_value().data_value(), dirty),
            None => self.inner.base.check_validity(data, dirty),
        }
    }

    /// Evaluate the field's conditions, then the embedded form's
    #[must_use]
    pub fn check_conditions(&self, data: &Value) -> bool {
        let visible = self.inner.base.check_conditions(data);
        if !visible {
            return false;
        }
        match self.child() {
            Some(child) if child.has_condition() => {
                child.check_conditions(&self.data_value().data_value())
            }
            _ => visible,
        }
    }

    /// Recalculate values through the embedded form, or the base without one
    #[must_use]
    pub fn calculate_value(&self, data: &Value, flags: ValueFlags) -> bool {
        match self.child() {
            Some(child) => child.calculate_value(&self.data_value().data_value(), flags),
            None => self.inner.base.calculate_value(data, flags),
        }
    }

    /// Record pristine state on the field and the embedded form
    pub fn set_pristine(&self, pristine: bool) {
        self.inner.base.set_pristine(pristine);
        if let Some(child) = self.child() {
            child.set_pristine(pristine);
        }
    }

    /// Every field of the embedded form; empty until it is loaded
    #[must_use]
    pub fn all_components(&self) -> Vec<Arc<dyn FormComponent>> {
        self.child()
            .map(|child| child.components())
            .unwrap_or_default()
    }

    /// Attach the outermost form and adopt its submit suppression
    pub fn set_root(&self, root: &Arc<dyn FormRoot>) {
        self.inner.state.lock().root = Some(Arc::downgrade(root));
        self.set_nosubmit(root.nosubmit());
    }

    /// The outermost form, while it is alive
    #[must_use]
    pub fn root(&self) -> Option<Arc<dyn FormRoot>> {
        self.inner.state.lock().root.as_ref().and_then(std::sync::Weak::upgrade)
    }

    /// Set the page-navigation context
    ///
    /// Every field of the embedded form is pointed at this component.
    pub fn set_current_form(&self, form: CurrentForm) {
        self.inner.state.lock().current_form = Some(form);
        let context = self.as_current_form();
        for component in self.all_components() {
            component.set_current_form(context.clone());
        }
    }

    /// The page-navigation context, if set
    #[must_use]
    pub fn current_form(&self) -> Option<CurrentForm> {
        self.inner.state.lock().current_form.clone()
    }

    /// Suppress standalone submission of the embedded form
    pub fn set_nosubmit(&self, nosubmit: bool) {
        self.inner.state.lock().nosubmit = nosubmit;
        if let Some(child) = self.child() {
            child.set_nosubmit(nosubmit);
        }
    }

    /// Whether standalone submission is suppressed
    #[must_use]
    pub fn nosubmit(&self) -> bool {
        self.inner.state.lock().nosubmit
    }

    /// Whether the embedded form is submitted on its own and stored by reference
    #[must_use]
    pub fn should_submit(&self) -> bool {
        self.inner.schema.reference
    }

    async fn loaded_child(&self) -> FormResult<ChildForm> {
        self.ensure_loaded().wait().await?.ok_or(FormError::NotLoaded)
    }

    /// Submit the embedded form before advancing a page
    ///
    /// # Errors
    ///
    /// Returns the load failure, or the submission failure after reporting it
    /// through the embedded form.
    pub async fn before_next(&self) -> FormResult<Submission> {
        if !self.should_submit() {
            self.inner.base.before_next()?;
            return Ok(self.value());
        }

        let child = self.loaded_child().await?;
        match child.submit().await {
            Ok(submission) => {
                self.inner.state.lock().value = submission.clone();
                Ok(submission)
            }
            Err(err) => {
                child.on_submission_error(&err);
                Err(err)
            }
        }
    }

    /// Submit the embedded form before the parent submits
    ///
    /// A value that already references a submission is collapsed to
    /// `{ _id, form }` without submitting again. Failures of the embedded
    /// submission leave the value as it was and are not returned.
    ///
    /// # Errors
    ///
    /// Returns the load failure, or the base failure when the field does not
    /// submit on its own.
    pub async fn before_submit(&self) -> FormResult<Submission> {
        let current = self.data_value();
        if current.is_submitted() {
            let value = if self.should_submit() {
                current.to_reference()
            } else {
                current
            };
            self.inner.state.lock().value = value.clone();
            return Ok(value);
        }

        if !self.should_submit() {
            self.inner.base.before_submit()?;
            return Ok(self.value());
        }

        let child = self.loaded_child().await?;
        match child.submit().await {
            Ok(submission) => {
                child.set_loading(false);
                let reference = submission.to_reference();
                self.inner.state.lock().value = reference.clone();
                debug!(key = %self.key(), id = ?reference.id, "Stored submission reference");
                Ok(reference)
            }
            Err(err) => {
                debug!(key = %self.key(), error = %err, "Embedded submission failed; keeping value");
                Ok(self.data_value())
            }
        }
    }

    /// Tear down the field and its embedded form
    ///
    /// A load still in flight is discarded when it completes. The field can
    /// be loaded again afterwards.
    pub fn destroy(&self) {
        self.inner.base.destroy();

        let (child, child_events, bus_listener, stale) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.load_state = LoadState::NotLoaded;
            state.pending.clear();
            state.replaying = false;
            (
                state.child.take(),
                state.child_events.take(),
                state.bus_listener.take(),
                std::mem::replace(&mut state.ready, ReadySignal::new()),
            )
        };

        if let Some((events, listener)) = child_events {
            events.off(listener);
        }
        if let Some(child) = child {
            child.destroy();
        }
        self.inner.anchor.clear();
        if let Some(listener) = bus_listener {
            self.inner.events.off(listener);
        }
        stale.reject(FormError::NotLoaded);
        debug!(key = %self.key(), "Nested form destroyed");
    }
}
