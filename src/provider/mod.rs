//! Backend abstraction: normalized call interface, tiered resolution,
//! per-backend admission control, and the routing seam that ties them
//! together.

pub mod backend;
pub mod gate;
#[cfg(test)]
pub(crate) mod mock;
pub mod registry;
pub mod router;
pub mod types;

pub use backend::{BackendConfig, LlamaCppBackend, LlmBackend, OllamaBackend};
pub use gate::{ConcurrencyGate, GatePermit};
pub use registry::{BackendFactory, BackendRegistry, ResolvedBackend};
pub use router::BackendRouter;
pub use types::{
    BackendCapabilities, BackendTier, CallOptions, NormalizedResponse, Prompt, TokenUsage,
};
