//! Routing values through the embedded form

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ChildForm, NestedForm, ReadySignal, ValueFlags};
use crate::error::{FormError, FormResult};
use crate::schema::Submission;

/// Outcome of [`NestedForm::set_value`]
#[derive(Debug)]
#[must_use = "the change may still be settling"]
pub struct ValueChange {
    changed: bool,
    settle: Settle,
}

#[derive(Debug)]
enum Settle {
    Done,
    Ready(ReadySignal),
    Expansion(JoinHandle<FormResult<()>>),
    Failed(FormError),
}

impl ValueChange {
    const fn done(changed: bool) -> Self {
        Self {
            changed,
            settle: Settle::Done,
        }
    }

    /// Whether the assignment changed the value
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Whether nothing asynchronous remains
    pub const fn is_settled(&self) -> bool {
        matches!(self.settle, Settle::Done | Settle::Failed(_))
    }

    /// Wait for the asynchronous part: readiness, or the reference fetch
    ///
    /// # Errors
    ///
    /// Returns the load failure, the submission fetch failure, or
    /// [`FormError::Task`] if the fetch task panicked or could not start.
    pub async fn settled(self) -> FormResult<()> {
        match self.settle {
            Settle::Done => Ok(()),
            Settle::Ready(ready) => ready.wait().await.map(|_| ()),
            Settle::Expansion(handle) => handle.await?,
            Settle::Failed(err) => Err(err),
        }
    }
}

impl NestedForm {
    /// The current value: the embedded form's value, or the stored value
    #[must_use]
    pub fn value(&self) -> Submission {
        match self.child() {
            Some(child) => child.value(),
            None => self.data_value(),
        }
    }

    /// The value stored on this field, as written into the parent submission
    #[must_use]
    pub fn data_value(&self) -> Submission {
        self.inner.state.lock().value.clone()
    }

    /// Reset to the empty value without notifying
    pub fn clear_value(&self) {
        let mut state = self.inner.state.lock();
        state.value = Submission::empty();
        state.pending.clear();
    }

    /// Assign a value
    ///
    /// The value is always stored on the field. Before the embedded form
    /// exists, or while earlier values are still being replayed into it, the
    /// value is queued and applied in order; assigning to a visible field
    /// starts the load. A reference (`_id` without data) assigned to a loaded
    /// field is expanded by fetching the full submission in the background.
    pub fn set_value(&self, submission: Submission, flags: ValueFlags) -> ValueChange {
        let (child, changed) = {
            let mut state = self.inner.state.lock();
            let changed = state.value != submission;
            // Stored first so a change emitted by the child wins
            state.value = submission.clone();
            match state.child.clone() {
                Some(child) if !state.replaying => (Some(child), changed),
                _ => {
                    state.pending.push_back((submission.clone(), flags));
                    (None, changed)
                }
            }
        };

        let Some(child) = child else {
            let ready = if self.is_hidden() {
                self.data_ready()
            } else {
                self.ensure_loaded()
            };
            return ValueChange {
                changed,
                settle: Settle::Ready(ready),
            };
        };

        if !self.needs_expansion(&child, &submission, flags) {
            return ValueChange::done(child.set_value(&submission, flags));
        }

        let this = self.clone();
        let expansion = async move { this.expand_reference(&child, submission, flags).await };
        let settle = match super::spawn(expansion) {
            Ok(handle) => Settle::Expansion(handle),
            Err(err) => {
                warn!(key = %self.key(), error = %err, "Cannot expand submission reference");
                Settle::Failed(err)
            }
        };
        ValueChange { changed, settle }
    }

    /// Apply queued values in order until one needs a submission fetch
    ///
    /// Returns that value; `None` once the queue is drained, which ends the
    /// replay, or when the component was destroyed meanwhile.
    pub(super) fn replay_pending(
        &self,
        child: &ChildForm,
        generation: u64,
    ) -> Option<(Submission, ValueFlags)> {
        loop {
            let (submission, flags) = {
                let mut state = self.inner.state.lock();
                if state.generation != generation {
                    return None;
                }
                match state.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        state.replaying = false;
                        return None;
                    }
                }
            };
            if self.needs_expansion(child, &submission, flags) {
                return Some((submission, flags));
            }
            child.set_value(&submission, flags);
        }
    }

    /// Expand `first`, then keep replaying the queue behind it
    pub(super) async fn finish_replay(
        self,
        child: ChildForm,
        first: (Submission, ValueFlags),
        generation: u64,
    ) {
        let mut next = Some(first);
        while let Some((submission, flags)) = next {
            if let Err(err) = self.expand_reference(&child, submission, flags).await {
                warn!(key = %self.key(), error = %err, "Failed to restore nested form value");
            }
            next = self.replay_pending(&child, generation);
        }
    }

    fn needs_expansion(&self, child: &ChildForm, submission: &Submission, flags: ValueFlags) -> bool {
        submission.has_id()
            && !flags.no_load
            && (submission.has_empty_data() || self.should_submit())
            && child.forms_url().is_some()
    }

    async fn expand_reference(
        &self,
        child: &ChildForm,
        submission: Submission,
        flags: ValueFlags,
    ) -> FormResult<()> {
        let Some(forms_url) = child.forms_url() else {
            child.set_value(&submission, flags);
            return Ok(());
        };
        let url = format!(
            "{}/{}/submission/{}",
            forms_url.trim_end_matches('/'),
            submission.form.as_deref().unwrap_or_default(),
            submission.id.as_deref().unwrap_or_default(),
        );

        debug!(key = %self.key(), url = %url, "Expanding submission reference");
        child.set_url(&url);
        child.set_nosubmit(false);
        let loaded = child.load_submission().await;
        child.set_nosubmit(self.nosubmit());

        let full = loaded.map_err(|err| FormError::SubmissionLoad {
            url,
            message: err.to_string(),
        })?;
        child.set_value(&full, flags);
        Ok(())
    }
}
