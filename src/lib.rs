//! # reason-core
//!
//! An adaptive reasoning orchestrator for language-model backends. Prompts
//! are classified by complexity and routed to one of three strategies: a
//! direct call, a two-step self-refinement, or a decompose-solve-integrate
//! pipeline. Backends are resolved through a tiered registry, guarded by
//! per-backend admission control, and optionally fed retrieval-augmented
//! prompts.
//!
//! ## Core Components
//!
//! - **Complexity**: syntactic/semantic scoring and regime classification
//! - **Dispatch**: reasoning modes and strategy selection
//! - **Pipeline**: the decompose-solve-integrate strategy
//! - **Provider**: backend trait, tiered registry, gate, and router
//! - **Retrieval**: corpora, chunking, and prompt augmentation
//! - **Orchestrator**: the assembled request flow
//!
//! ## Example
//!
//! ```rust,ignore
//! use reason_core::{
//!     AdaptiveOrchestrator, BackendConfig, BackendRegistry, BackendTier,
//!     OllamaBackend, OrchestratorConfig, Prompt, ReasoningMode,
//! };
//! use std::sync::Arc;
//!
//! let mut registry = BackendRegistry::new();
//! registry.register("ollama", BackendTier::Standard, || {
//!     let config = BackendConfig::new("http://localhost:11434", "llama3");
//!     Ok(Arc::new(OllamaBackend::new(config)?))
//! });
//!
//! let orchestrator = AdaptiveOrchestrator::new(OrchestratorConfig::default(), registry);
//! let response = orchestrator
//!     .process(&Prompt::new("Explain quantum computing."), ReasoningMode::Adaptive)
//!     .await;
//! println!("{}", response.text);
//! ```

pub mod complexity;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod retrieval;

// Re-exports for convenience
pub use complexity::{ComplexityAnalyzer, ComplexityScore, Regime};
pub use config::OrchestratorConfig;
pub use dispatch::{ReasoningDispatcher, ReasoningMode};
pub use error::{Error, Result};
pub use orchestrator::AdaptiveOrchestrator;
pub use pipeline::{DecomposePipeline, SubProblem};
pub use provider::{
    BackendCapabilities, BackendConfig, BackendRegistry, BackendRouter, BackendTier, CallOptions,
    ConcurrencyGate, LlamaCppBackend, LlmBackend, NormalizedResponse, OllamaBackend, Prompt,
    TokenUsage,
};
pub use retrieval::{
    Corpus, DocumentCollection, EncyclopediaCorpus, RetrievalAugmenter, TextSplitter,
};
