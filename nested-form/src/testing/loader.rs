//! In-memory definition loader

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{FormError, FormResult};
use crate::form::{FormLoader, LoadQuery};
use crate::schema::FormDefinition;

/// Releases a gated [`StaticLoader`]
#[derive(Debug, Clone)]
pub struct LoadGate {
    notify: Arc<Notify>,
}

impl LoadGate {
    /// Let one pending (or the next) request complete
    pub fn open(&self) {
        self.notify.notify_one();
    }
}

/// Loader serving a fixed definition or failure
///
/// # Example
///
/// ```rust
/// use nested_form::form::{FormLoader, LoadQuery};
/// use nested_form::schema::FormDefinition;
/// use nested_form::testing::StaticLoader;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let loader = StaticLoader::new(FormDefinition::new("Applicant", vec![]));
/// let definition = loader
///     .load_form("https://api.example.com/form/abc", &LoadQuery::live())
///     .await
///     .unwrap();
///
/// assert_eq!(definition.title, "Applicant");
/// assert_eq!(loader.calls(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct StaticLoader {
    response: Result<FormDefinition, String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, LoadQuery)>>,
    gate: Option<Arc<Notify>>,
}

impl StaticLoader {
    /// Serve `definition` for every request
    #[must_use]
    pub fn new(definition: FormDefinition) -> Self {
        Self {
            response: Ok(definition),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Fail every request with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::new(FormDefinition::default())
        }
    }

    /// Hold every request until the returned gate is opened
    #[must_use]
    pub fn gated(mut self) -> (Self, LoadGate) {
        let notify = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&notify));
        (self, LoadGate { notify })
    }

    /// Number of requests received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requested locators, in order
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(src, _)| src.clone()).collect()
    }

    /// Queries sent with each request
    #[must_use]
    pub fn queries(&self) -> Vec<LoadQuery> {
        self.requests.lock().iter().map(|(_, query)| *query).collect()
    }
}

#[async_trait]
impl FormLoader for StaticLoader {
    async fn load_form(&self, src: &str, query: &LoadQuery) -> FormResult<FormDefinition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((src.to_string(), *query));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.response
            .clone()
            .map_err(|message| FormError::load(src, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failing_loader() {
        let loader = StaticLoader::failing("HTTP 404");
        let err = loader
            .load_form("https://api.example.com/form/x", &LoadQuery::live())
            .await
            .err()
            .expect("Load should fail");
        assert_eq!(err, FormError::load("https://api.example.com/form/x", "HTTP 404"));
        assert_eq!(loader.queries(), vec![LoadQuery::live()]);
    }

    #[tokio::test]
    async fn test_gate_holds_request() {
        let (loader, gate) = StaticLoader::new(FormDefinition::new("Child", vec![])).gated();
        let loader = Arc::new(loader);

        let task = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.load_form("src", &LoadQuery::live()).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!task.is_finished());
        assert_eq!(loader.calls(), 1);

        gate.open();
        let definition = task
            .await
            .expect("Failed to join load")
            .expect("Failed to load");
        assert_eq!(definition.title, "Child");
    }
}
