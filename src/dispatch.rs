//! Reasoning mode vocabulary and strategy dispatch.
//!
//! Dispatch is a pure routing step: a non-adaptive mode maps to a fixed
//! regime, `adaptive` defers to the complexity analyzer, and the resolved
//! regime selects exactly one strategy. There is no cross-regime fallback:
//! a strategy's terminal failure is surfaced as a structured error response.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::complexity::{ComplexityAnalyzer, Regime};
use crate::error::{Error, Result};
use crate::pipeline::DecomposePipeline;
use crate::provider::{BackendRouter, NormalizedResponse, Prompt};

/// Reasoning mode accepted at the boundary. Closed vocabulary: strings
/// outside this set are a configuration error, never a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    Efficient,
    Balanced,
    Decomposed,
    Adaptive,
    PaperOptimized,
    Parallel,
    QuantumInspired,
    Edge,
}

impl ReasoningMode {
    /// The regime this mode forces, or `None` for `Adaptive` (analyzer
    /// decides). Experimental modes map to the high regime.
    pub fn regime(&self) -> Option<Regime> {
        match self {
            Self::Efficient => Some(Regime::Low),
            Self::Balanced => Some(Regime::Medium),
            Self::Decomposed => Some(Regime::High),
            Self::PaperOptimized | Self::Parallel | Self::QuantumInspired | Self::Edge => {
                Some(Regime::High)
            }
            Self::Adaptive => None,
        }
    }

    /// All recognized modes.
    pub const ALL: [ReasoningMode; 8] = [
        Self::Efficient,
        Self::Balanced,
        Self::Decomposed,
        Self::Adaptive,
        Self::PaperOptimized,
        Self::Parallel,
        Self::QuantumInspired,
        Self::Edge,
    ];
}

impl std::fmt::Display for ReasoningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Efficient => write!(f, "efficient"),
            Self::Balanced => write!(f, "balanced"),
            Self::Decomposed => write!(f, "decomposed"),
            Self::Adaptive => write!(f, "adaptive"),
            Self::PaperOptimized => write!(f, "paper_optimized"),
            Self::Parallel => write!(f, "parallel"),
            Self::QuantumInspired => write!(f, "quantum_inspired"),
            Self::Edge => write!(f, "edge"),
        }
    }
}

impl FromStr for ReasoningMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "efficient" => Ok(Self::Efficient),
            "balanced" => Ok(Self::Balanced),
            "decomposed" => Ok(Self::Decomposed),
            "adaptive" => Ok(Self::Adaptive),
            "paper_optimized" => Ok(Self::PaperOptimized),
            "parallel" => Ok(Self::Parallel),
            "quantum_inspired" => Ok(Self::QuantumInspired),
            "edge" => Ok(Self::Edge),
            other => Err(Error::config(format!("unknown reasoning mode '{other}'"))),
        }
    }
}

const REFINE_TEMPLATE: &str = "Critique and improve the following answer to the original \
question. Identify weaknesses, correct any errors, and produce a refined final answer.";

/// Routes a prompt to one of the three reasoning strategies.
pub struct ReasoningDispatcher {
    router: Arc<BackendRouter>,
    analyzer: ComplexityAnalyzer,
    backend: String,
    max_subproblems: usize,
}

impl ReasoningDispatcher {
    pub fn new(router: Arc<BackendRouter>, backend: impl Into<String>) -> Self {
        Self {
            router,
            analyzer: ComplexityAnalyzer::new(),
            backend: backend.into(),
            max_subproblems: 10,
        }
    }

    pub fn with_max_subproblems(mut self, max: usize) -> Self {
        self.max_subproblems = max.max(1);
        self
    }

    /// Resolve the regime for (prompt, mode) and run the selected strategy.
    ///
    /// Always returns a response: terminal strategy failures come back as a
    /// `NormalizedResponse` with `error` set and empty text.
    pub async fn dispatch(&self, prompt: &Prompt, mode: ReasoningMode) -> NormalizedResponse {
        let regime = match mode.regime() {
            Some(regime) => regime,
            None => self.analyzer.analyze(&prompt.text).regime,
        };
        tracing::info!(%mode, %regime, backend = %self.backend, "dispatching prompt");

        let result = match regime {
            Regime::Low => self.run_direct(prompt).await,
            Regime::Medium => self.run_refinement(prompt).await,
            Regime::High => {
                DecomposePipeline::new(
                    Arc::clone(&self.router),
                    &self.backend,
                    self.max_subproblems,
                )
                .run(prompt)
                .await
            }
        };

        result.unwrap_or_else(|e| {
            tracing::error!(%regime, error = %e, "strategy failed");
            NormalizedResponse::failure(&self.backend, e.to_string())
        })
    }

    /// Low regime: one direct call with the original prompt.
    async fn run_direct(&self, prompt: &Prompt) -> Result<NormalizedResponse> {
        self.router.call(&self.backend, prompt).await
    }

    /// Medium regime: direct call, then one self-refinement pass over the
    /// prior answer. Returns the refined text.
    async fn run_refinement(&self, prompt: &Prompt) -> Result<NormalizedResponse> {
        let first = self.router.call(&self.backend, prompt).await?;

        let refine_text = format!(
            "{REFINE_TEMPLATE}\n\n# Original question\n{}\n\n# Previous answer\n{}\n\n# Refined answer:",
            prompt.text, first.text
        );
        self.router
            .call(&self.backend, &prompt.with_text(refine_text))
            .await
    }
}
