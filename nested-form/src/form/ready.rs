//! One-shot readiness signal

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use super::traits::ChildForm;
use crate::error::{FormError, FormResult};

/// Outcome delivered by a [`ReadySignal`]
pub type Readiness = FormResult<Option<ChildForm>>;

/// Signal settled exactly once when the embedded form is ready or failed
///
/// Clones observe the same signal. Any number of tasks may [`wait`] on it;
/// later calls to [`resolve`] or [`reject`] are ignored.
///
/// [`wait`]: ReadySignal::wait
/// [`resolve`]: ReadySignal::resolve
/// [`reject`]: ReadySignal::reject
#[derive(Clone)]
pub struct ReadySignal {
    tx: Arc<watch::Sender<Option<Readiness>>>,
}

impl ReadySignal {
    /// Create an unsettled signal
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Settle with the embedded form (or none, in builder mode)
    ///
    /// Returns `false` if the signal was already settled.
    pub fn resolve(&self, child: Option<ChildForm>) -> bool {
        self.settle(Ok(child))
    }

    /// Settle with a failure
    ///
    /// Returns `false` if the signal was already settled.
    pub fn reject(&self, error: FormError) -> bool {
        self.settle(Err(error))
    }

    fn settle(&self, outcome: Readiness) -> bool {
        let mut outcome = Some(outcome);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = outcome.take();
            true
        })
    }

    /// Whether the signal has settled
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The outcome, if settled
    #[must_use]
    pub fn outcome(&self) -> Option<Readiness> {
        self.tx.borrow().clone()
    }

    /// Wait until the signal settles
    ///
    /// # Errors
    ///
    /// Returns the failure the signal was rejected with.
    pub async fn wait(&self) -> Readiness {
        let mut rx = self.tx.subscribe();
        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| FormError::Task("readiness signal closed".to_string()))?;
        settled.clone().unwrap_or(Err(FormError::NotLoaded))
    }

    /// Whether two handles refer to the same signal
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.tx.borrow() {
            None => "pending",
            Some(Ok(Some(_))) => "ready",
            Some(Ok(None)) => "ready (no form)",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ReadySignal").field("state", &state).finish()
    }
}
