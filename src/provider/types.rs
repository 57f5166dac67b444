//! Core types for the normalized backend interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::ReasoningMode;

/// Backend implementation tier, tried in fixed priority order during
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendTier {
    /// Enhanced second-generation implementation.
    V2,
    /// Enhanced first-generation implementation.
    V1,
    /// Plain implementation with the standard call surface.
    Standard,
}

impl BackendTier {
    /// The full fallback chain in resolution order.
    pub const FALLBACK_CHAIN: [BackendTier; 3] =
        [BackendTier::V2, BackendTier::V1, BackendTier::Standard];
}

impl std::fmt::Display for BackendTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V2 => write!(f, "v2"),
            Self::V1 => write!(f, "v1"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// Capability flags a backend declares at construction.
///
/// Immutable for the backend's lifetime; checked at resolution time, never
/// probed at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    pub standard_call: bool,
    pub enhanced_call: bool,
    pub streaming: bool,
    pub system_prompt: bool,
    pub tools: bool,
    pub json_mode: bool,
}

impl BackendCapabilities {
    /// Capabilities of a plain chat backend.
    pub fn standard() -> Self {
        Self {
            standard_call: true,
            system_prompt: true,
            ..Self::default()
        }
    }

    /// Capabilities of an enhanced-reasoning backend.
    pub fn enhanced() -> Self {
        Self {
            standard_call: true,
            enhanced_call: true,
            system_prompt: true,
            ..Self::default()
        }
    }

    pub fn with_streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn with_tools(mut self) -> Self {
        self.tools = true;
        self
    }

    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Token usage statistics for one backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Normalized response returned by every backend and by the orchestrator.
///
/// Invariant: if `error` is set, `text` is empty. An absent `error` with an
/// empty `text` means the backend legitimately returned nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NormalizedResponse {
    /// Build a successful response.
    pub fn ok(text: impl Into<String>, model: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Build an error response. The text is always empty.
    pub fn failure(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            model: model.into(),
            usage: TokenUsage::default(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-call options carried by a [`Prompt`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Resolve only backends declaring the `enhanced_call` capability.
    pub require_enhanced: bool,
    /// Restrict resolution to the v2 tier; no fallback on miss.
    pub force_tier2: bool,
    /// Explicit mode hint forwarded to enhanced backends.
    pub mode_hint: Option<ReasoningMode>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn requiring_enhanced(mut self) -> Self {
        self.require_enhanced = true;
        self
    }

    pub fn forcing_tier2(mut self) -> Self {
        self.force_tier2 = true;
        self
    }

    pub fn with_mode_hint(mut self, mode: ReasoningMode) -> Self {
        self.mode_hint = Some(mode);
        self
    }
}

/// An immutable prompt. Augmentation never mutates; it produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub system: Option<String>,
    pub options: CallOptions,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            system: None,
            options: CallOptions::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Derive a new prompt with different text, keeping the system
    /// instruction and options.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            system: self.system.clone(),
            options: self.options.clone(),
        }
    }
}
