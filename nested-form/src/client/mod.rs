//! HTTP definition loader
//!
//! Fetches form definitions with `reqwest`, appending the load query
//! (`live=1`) so the server returns non-cached content.

use async_trait::async_trait;

use crate::error::{FormError, FormResult};
use crate::form::{FormLoader, LoadQuery};
use crate::schema::FormDefinition;

/// [`FormLoader`] backed by an HTTP client
#[derive(Debug, Clone, Default)]
pub struct HttpFormLoader {
    http_client: reqwest::Client,
}

impl HttpFormLoader {
    /// Create a loader with a default client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader reusing an existing client
    #[must_use]
    pub const fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Get reference to the HTTP client
    #[must_use]
    pub const fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    async fn check_http_response(
        src: &str,
        response: reqwest::Response,
    ) -> FormResult<FormDefinition> {
        if !response.status().is_success() {
            return Err(FormError::load(src, format!("HTTP {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| FormError::load(src, format!("Failed to parse JSON: {e}")))
    }
}

#[async_trait]
impl FormLoader for HttpFormLoader {
    async fn load_form(&self, src: &str, query: &LoadQuery) -> FormResult<FormDefinition> {
        tracing::debug!(src, live = query.live, "Fetching form definition");
        let response = self
            .http_client
            .get(src)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| FormError::load(src, e.to_string()))?;

        Self::check_http_response(src, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_locator_is_load_error() {
        let loader = HttpFormLoader::new();
        let err = loader
            .load_form("not a url", &LoadQuery::live())
            .await
            .err()
            .expect("Load should fail");

        assert!(err.is_load());
        assert!(err.to_string().contains("not a url"));
    }
}
