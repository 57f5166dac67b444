//! Error types for reason-core.

use thiserror::Error;

use crate::provider::types::BackendTier;

/// Result type alias using reason-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during orchestration.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable backend implementation was found for a name after trying
    /// every tier in the fallback chain.
    #[error("no backend available for '{name}' (tried {})", format_tiers(.attempted))]
    BackendUnavailable {
        name: String,
        attempted: Vec<BackendTier>,
    },

    /// A resolved backend failed at the transport or response level.
    #[error("backend call error: {backend} - {message}")]
    BackendCall { backend: String, message: String },

    /// The decomposition response could not be parsed into sub-problems.
    /// Recovered locally by degrading to a single-sub-problem pipeline.
    #[error("decomposition parse error: {0}")]
    DecompositionParse(String),

    /// Retrieval failed. Non-fatal: the augmenter falls through to the
    /// unaugmented prompt.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error (unknown reasoning mode, bad gate limit, ...)
    #[error("configuration error: {0}")]
    Config(String),
}

fn format_tiers(tiers: &[BackendTier]) -> String {
    tiers
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a backend call error.
    pub fn backend_call(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendCall {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a backend-unavailable error naming the attempted tiers.
    pub fn backend_unavailable(name: impl Into<String>, attempted: Vec<BackendTier>) -> Self {
        Self::BackendUnavailable {
            name: name.into(),
            attempted,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }
}
