//! Error types and error handling

use thiserror::Error;

/// Result type for nested form operations
pub type FormResult<T> = Result<T, FormError>;

/// Errors raised while loading, embedding and submitting a nested form
///
/// The type is `Clone` because a single load failure is delivered to every
/// caller waiting on the same readiness signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Fetching the form definition failed
    #[error("failed to load form from {src}: {message}")]
    Load {
        /// Locator the definition was requested from
        src: String,
        /// Failure reported by the loading client
        message: String,
    },

    /// The embedded form could not be instantiated
    #[error("failed to render embedded form: {0}")]
    Render(String),

    /// Submitting the embedded form failed
    #[error("submission failed: {0}")]
    Submission(String),

    /// Expanding a submission reference into full data failed
    #[error("failed to load submission from {url}: {message}")]
    SubmissionLoad {
        /// Submission-by-id URL
        url: String,
        /// Failure reported by the embedded form
        message: String,
    },

    /// An operation required the embedded form but none exists
    #[error("embedded form is not loaded")]
    NotLoaded,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background step panicked or was aborted
    #[error("background task failed: {0}")]
    Task(String),
}

impl FormError {
    /// Create a load error for the given source
    #[must_use]
    pub fn load(src: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            src: src.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from fetching the definition
    #[must_use]
    pub const fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }
}

impl From<figment::Error> for FormError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for FormError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
