//! Backend registry and three-tier fallback resolution.
//!
//! Backends are registered as factories keyed by `(name, tier)`. Resolution
//! walks the fixed tier chain v2 → v1 → standard and returns the first tier
//! that is registered, constructs successfully, and satisfies the requested
//! capabilities. Handles are resolved fresh per call and never cached:
//! backend availability can change between calls (e.g. revoked credentials).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::backend::LlmBackend;
use super::types::BackendTier;

/// Factory producing a backend instance, or failing if the backend is not
/// currently constructible.
pub type BackendFactory = Box<dyn Fn() -> Result<Arc<dyn LlmBackend>> + Send + Sync>;

/// A freshly resolved backend handle. Owned by the calling strategy step and
/// discarded after the call returns.
#[derive(Clone)]
pub struct ResolvedBackend {
    pub name: String,
    pub tier: BackendTier,
    pub backend: Arc<dyn LlmBackend>,
}

impl std::fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Closed registry of backend factories.
#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<(String, BackendTier), BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `(name, tier)`. Replaces any previous factory
    /// for the same key.
    pub fn register<F>(&mut self, name: impl Into<String>, tier: BackendTier, factory: F)
    where
        F: Fn() -> Result<Arc<dyn LlmBackend>> + Send + Sync + 'static,
    {
        self.factories
            .insert((name.into(), tier), Box::new(factory));
    }

    /// Register a pre-built backend at a tier.
    pub fn register_instance(
        &mut self,
        name: impl Into<String>,
        tier: BackendTier,
        backend: Arc<dyn LlmBackend>,
    ) {
        self.register(name, tier, move || Ok(Arc::clone(&backend)));
    }

    /// Resolve a backend name through the tier fallback chain.
    ///
    /// Each tier lookup independently finds a registered, constructible
    /// backend or misses; misses fall through to the next tier without
    /// retry. With `require_enhanced`, a constructed backend lacking the
    /// `enhanced_call` capability is also a miss. With `force_tier2`, only
    /// the v2 tier is attempted. Resolution performs no backend call.
    pub fn resolve(
        &self,
        name: &str,
        require_enhanced: bool,
        force_tier2: bool,
    ) -> Result<ResolvedBackend> {
        let chain: &[BackendTier] = if force_tier2 {
            &[BackendTier::V2]
        } else {
            &BackendTier::FALLBACK_CHAIN
        };

        let mut attempted = Vec::with_capacity(chain.len());

        for &tier in chain {
            attempted.push(tier);

            let factory = match self.factories.get(&(name.to_string(), tier)) {
                Some(f) => f,
                None => {
                    tracing::debug!(backend = name, %tier, "tier not registered");
                    continue;
                }
            };

            let backend = match factory() {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(backend = name, %tier, error = %e, "tier not constructible");
                    continue;
                }
            };

            let caps = backend.capabilities();
            if !caps.standard_call {
                tracing::warn!(backend = name, %tier, "backend lacks standard_call");
                continue;
            }
            if require_enhanced && !caps.enhanced_call {
                tracing::debug!(backend = name, %tier, "tier lacks enhanced_call");
                continue;
            }

            tracing::debug!(backend = name, %tier, "resolved backend");
            return Ok(ResolvedBackend {
                name: name.to_string(),
                tier,
                backend,
            });
        }

        Err(Error::backend_unavailable(name, attempted))
    }
}
