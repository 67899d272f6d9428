//! Loading the embedded definition

use tracing::{debug, warn};

use super::{ChildOptions, LoadState, NestedForm, ReadySignal};
use crate::error::FormError;
use crate::schema::FormDefinition;

enum LoadPlan {
    Inline(FormDefinition),
    Fetch(String),
}

impl NestedForm {
    /// Start loading the embedded form, at most once
    ///
    /// Every call returns the same signal until the component is destroyed.
    /// The fetch and instantiation run on a task spawned on the current tokio
    /// runtime; outside a runtime the signal is rejected with
    /// [`FormError::Task`]. A schema with neither inline components nor a
    /// resolvable source yields a signal that never settles on its own.
    #[must_use = "the readiness signal reports load failures"]
    pub fn ensure_loaded(&self) -> ReadySignal {
        let (ready, generation, resubscribe) = {
            let mut state = self.inner.state.lock();
            if state.load_state != LoadState::NotLoaded {
                return state.ready.clone();
            }
            state.load_state = LoadState::Loading;
            (state.ready.clone(), state.generation, state.bus_listener.is_none())
        };
        if resubscribe {
            self.listen_for_nosubmit();
        }

        let resolution = self.resolution();
        let options = ChildOptions::forwarded(&self.inner.options, resolution.project.clone());
        let plan = if self.inner.schema.has_inline_components() {
            LoadPlan::Inline(FormDefinition::from_schema(&self.inner.schema))
        } else if resolution.is_empty() {
            warn!(key = %self.key(), "Nested form has no source; readiness will not settle");
            return ready;
        } else {
            LoadPlan::Fetch(resolution.source)
        };

        debug!(key = %self.key(), generation, "Loading nested form");
        let load = self.clone().run_load(plan, options, generation);
        if let Err(err) = super::spawn(load) {
            warn!(key = %self.key(), error = %err, "Cannot start nested form load");
            self.fail_load(generation, err);
        }
        ready
    }

    async fn run_load(self, plan: LoadPlan, options: ChildOptions, generation: u64) {
        let definition = match plan {
            LoadPlan::Inline(definition) => definition,
            LoadPlan::Fetch(src) => {
                let query = self.inner.options.load_query();
                match self.inner.loader.load_form(&src, &query).await {
                    Ok(definition) => {
                        debug!(key = %self.key(), src = %src, "Loaded form definition");
                        definition
                    }
                    Err(err) => {
                        self.fail_load(generation, err);
                        return;
                    }
                }
            }
        };

        if let Err(err) = self.embed(definition, options, generation).await {
            self.fail_load(generation, err);
        }
    }

    fn fail_load(&self, generation: u64, err: FormError) {
        let ready = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return;
            }
            state.load_state = LoadState::Failed;
            state.ready.clone()
        };
        debug!(key = %self.key(), error = %err, "Nested form failed to load");
        ready.reject(err);
    }
}
