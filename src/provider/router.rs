//! The resolve → gate → call seam used by every reasoning strategy.

use std::sync::Arc;

use crate::error::Result;

use super::gate::ConcurrencyGate;
use super::registry::BackendRegistry;
use super::types::{NormalizedResponse, Prompt};

/// Routes one backend call: resolves a fresh handle through the tier chain,
/// acquires the backend's gate slot, and issues the normalized call.
pub struct BackendRouter {
    registry: BackendRegistry,
    gate: Arc<ConcurrencyGate>,
}

impl BackendRouter {
    pub fn new(registry: BackendRegistry, gate: Arc<ConcurrencyGate>) -> Self {
        Self { registry, gate }
    }

    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    /// Issue one call to `backend_name` with the prompt's options.
    ///
    /// The handle is resolved per call and discarded afterwards. The gate
    /// permit is held for exactly the duration of the backend call and is
    /// released on every exit path.
    pub async fn call(&self, backend_name: &str, prompt: &Prompt) -> Result<NormalizedResponse> {
        let options = &prompt.options;
        let resolved =
            self.registry
                .resolve(backend_name, options.require_enhanced, options.force_tier2)?;

        let _permit = self.gate.acquire(backend_name).await;

        let use_enhanced =
            options.require_enhanced && resolved.backend.capabilities().enhanced_call;

        tracing::debug!(
            backend = backend_name,
            tier = %resolved.tier,
            enhanced = use_enhanced,
            "issuing backend call"
        );

        if use_enhanced {
            resolved.backend.enhanced_call(&prompt.text, options).await
        } else {
            resolved
                .backend
                .standard_call(&prompt.text, prompt.system.as_deref(), options)
                .await
        }
    }
}
