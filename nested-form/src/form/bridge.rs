//! Instantiating and wiring the embedded form

use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::{ChangeFlags, ChildOptions, LoadState, NestedForm, ValueFlags};
use crate::dom::Node;
use crate::error::FormResult;
use crate::events::ChildEvents;
use crate::schema::{FormDefinition, Submission};

impl NestedForm {
    pub(super) async fn embed(
        &self,
        mut definition: FormDefinition,
        options: ChildOptions,
        generation: u64,
    ) -> FormResult<()> {
        if self.inner.options.builder {
            self.inner.anchor.append(Node::placeholder(&definition.title));
            let ready = {
                let mut state = self.inner.state.lock();
                if state.generation != generation {
                    return Ok(());
                }
                state.load_state = LoadState::Ready;
                state.ready.clone()
            };
            ready.resolve(None);
            return Ok(());
        }

        let hidden = definition.hide_submit_buttons();
        trace!(key = %self.key(), hidden, "Hid embedded submit buttons");

        let events = ChildEvents::new(self.inner.events.clone(), self.namespace());
        let child = self
            .inner
            .renderer
            .render(self.inner.anchor.clone(), definition, options, events.clone())
            .await?;

        let weak = Arc::downgrade(&self.inner);
        let change_listener = events.on("change", move |_| {
            if let Some(inner) = weak.upgrade() {
                NestedForm { inner }.on_child_change();
            }
        });

        let installed = {
            let mut state = self.inner.state.lock();
            if state.generation == generation {
                state.child = Some(Arc::clone(&child));
                state.child_events = Some((events.clone(), change_listener));
                state.load_state = LoadState::Ready;

                if state.pending.is_empty() && state.value != Submission::empty() {
                    let stored = state.value.clone();
                    state.pending.push_back((stored, ValueFlags::default()));
                }
                state.replaying = true;
                Some((
                    state.ready.clone(),
                    state.pending.len(),
                    state.root.clone(),
                    state.effective_visibility(),
                    state.nosubmit,
                ))
            } else {
                None
            }
        };

        let Some((ready, restored, root, visible, nosubmit)) = installed else {
            debug!(key = %self.key(), "Component destroyed during load; discarding embedded form");
            events.off(change_listener);
            child.destroy();
            return Ok(());
        };

        if let Some(root) = root {
            child.set_root(root);
        }
        child.set_current_form(self.as_current_form());
        child.set_parent_visible(visible);
        child.set_nosubmit(nosubmit);
        let source = self.resolved_source();
        if !source.is_empty() {
            child.set_url(&source);
        }
        debug!(key = %self.key(), restored, "Embedded form attached");

        // Values needing a submission fetch are replayed in the background;
        // later assignments keep queueing behind them.
        let expansion = self.replay_pending(&child, generation);
        ready.resolve(Some(Arc::clone(&child)));
        if let Some(first) = expansion {
            if let Err(err) = super::spawn(self.clone().finish_replay(child, first, generation)) {
                warn!(key = %self.key(), error = %err, "Failed to restore nested form value");
                self.inner.state.lock().replaying = false;
            }
        }
        Ok(())
    }

    fn on_child_change(&self) {
        let Some(child) = self.child() else {
            return;
        };
        let value = child.value();
        self.inner.state.lock().value = value;
        self.inner.base.trigger_change(ChangeFlags { no_emit: true });
    }
}
