//! Orchestrator configuration.
//!
//! One immutable value constructed at startup and passed explicitly to every
//! component that needs it. Nothing in the crate reads configuration through
//! globals or the environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for the adaptive orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Backend name requests are routed to (e.g. "ollama", "llamacpp").
    pub default_backend: String,
    /// Per-backend-name maximum concurrent in-flight calls.
    /// Backends absent from this map are unbounded.
    pub gate_limits: HashMap<String, usize>,
    /// Upper bound on sub-problems accepted from one decomposition response.
    /// Lines beyond this are ignored rather than solved.
    pub max_subproblems: usize,
    /// Maximum documents fetched per retrieval query.
    pub retrieval_max_docs: usize,
    /// Chunk size (characters) used when splitting retrieved documents.
    pub retrieval_chunk_size: usize,
    /// Overlap (characters) between adjacent chunks.
    pub retrieval_chunk_overlap: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        // Ollama destabilizes under concurrent load, so it is fully
        // serialized by default.
        let mut gate_limits = HashMap::new();
        gate_limits.insert("ollama".to_string(), 1);

        Self {
            default_backend: "ollama".to_string(),
            gate_limits,
            max_subproblems: 10,
            retrieval_max_docs: 2,
            retrieval_chunk_size: 1000,
            retrieval_chunk_overlap: 200,
        }
    }
}

impl OrchestratorConfig {
    pub fn new(default_backend: impl Into<String>) -> Self {
        Self {
            default_backend: default_backend.into(),
            ..Self::default()
        }
    }

    /// Set the concurrency limit for a backend name.
    pub fn with_gate_limit(mut self, backend: impl Into<String>, limit: usize) -> Self {
        self.gate_limits.insert(backend.into(), limit.max(1));
        self
    }

    /// Remove the concurrency limit for a backend name (unbounded).
    pub fn with_unbounded(mut self, backend: impl AsRef<str>) -> Self {
        self.gate_limits.remove(backend.as_ref());
        self
    }

    pub fn with_max_subproblems(mut self, max: usize) -> Self {
        self.max_subproblems = max.max(1);
        self
    }

    pub fn with_retrieval_max_docs(mut self, max: usize) -> Self {
        self.retrieval_max_docs = max.max(1);
        self
    }

    pub fn with_retrieval_chunking(mut self, size: usize, overlap: usize) -> Self {
        self.retrieval_chunk_size = size.max(1);
        self.retrieval_chunk_overlap = overlap.min(self.retrieval_chunk_size - 1);
        self
    }
}
