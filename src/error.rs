// SearchError - error taxonomy for the multisearch engine

use thiserror::Error;

use crate::config::ProviderKind;

/// Errors surfaced by `MultiSearch` operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or malformed configuration: empty registry, unknown provider
    /// kind, out-of-range builder values.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A backend call failed: network error, non-success status, invalid
    /// credential, or a payload the provider could not parse.
    ///
    /// Malformed payloads are reported here rather than mapped to zero
    /// results, so the incremental-skip optimization never mistakes a
    /// parsing failure for a genuinely empty answer.
    #[error("{kind} provider error: {message}")]
    Provider {
        kind: ProviderKind,
        message: String,
    },

    /// The run was superseded by a newer submission. Not delivered to
    /// listeners; a newer run's outcome is what matters.
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    pub(crate) fn provider(kind: ProviderKind, message: impl Into<String>) -> Self {
        SearchError::Provider {
            kind,
            message: message.into(),
        }
    }
}
