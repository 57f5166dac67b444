//! Backend trait and concrete HTTP backend implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

use super::types::{BackendCapabilities, CallOptions, NormalizedResponse, TokenUsage};

/// Normalized call interface every backend implements.
///
/// The orchestration core consumes backends only through this trait; the
/// vendor-specific request/response marshalling stays inside each
/// implementation.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name used for registry lookup and gate keying.
    fn name(&self) -> &str;

    /// Capability flags, fixed at construction.
    fn capabilities(&self) -> BackendCapabilities;

    /// Issue a standard completion call.
    async fn standard_call(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &CallOptions,
    ) -> Result<NormalizedResponse>;

    /// Issue an enhanced-reasoning call. Only valid when the
    /// `enhanced_call` capability is declared.
    async fn enhanced_call(
        &self,
        _prompt: &str,
        _options: &CallOptions,
    ) -> Result<NormalizedResponse> {
        Err(Error::backend_call(
            self.name(),
            "enhanced_call not supported by this backend",
        ))
    }
}

/// Connection settings for an HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend server.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub default_model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_model: default_model.into(),
            timeout_secs: 600,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))
}

// =============================================================================
// Ollama
// =============================================================================

/// Standard backend talking to an Ollama server.
pub struct OllamaBackend {
    config: BackendConfig,
    http: Client,
}

impl OllamaBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::config("ollama base URL must not be empty"));
        }
        let http = build_http_client(config.timeout_secs)?;
        tracing::info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "ollama backend initialized"
        );
        Ok(Self { config, http })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::standard().with_json_mode()
    }

    async fn standard_call(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &CallOptions,
    ) -> Result<NormalizedResponse> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(OllamaMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let sampling = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            })
        } else {
            None
        };

        let api_request = OllamaRequest {
            model: self.config.default_model.clone(),
            messages,
            stream: false,
            options: sampling,
        };

        let response = self
            .http
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::backend_call(self.name(), format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::backend_call(self.name(), format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::backend_call(
                self.name(),
                format!("HTTP {}: {}", status, body),
            ));
        }

        let api_response: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| Error::backend_call(self.name(), format!("failed to parse response: {}", e)))?;

        let text = api_response
            .message
            .map(|m| m.content)
            .unwrap_or_default();

        Ok(NormalizedResponse::ok(
            text,
            &self.config.default_model,
            TokenUsage::new(api_response.prompt_eval_count, api_response.eval_count),
        ))
    }
}

// =============================================================================
// Llama.cpp (OpenAI-compatible server)
// =============================================================================

/// Standard backend talking to a llama.cpp OpenAI-compatible server.
pub struct LlamaCppBackend {
    config: BackendConfig,
    http: Client,
}

impl LlamaCppBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.base_url.is_empty() || config.default_model.is_empty() {
            return Err(Error::config(
                "llamacpp requires a base URL and a model path",
            ));
        }
        let http = build_http_client(config.timeout_secs)?;
        tracing::info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "llamacpp backend initialized"
        );
        Ok(Self { config, http })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatCompletionMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize, Default)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl LlmBackend for LlamaCppBackend {
    fn name(&self) -> &str {
        "llamacpp"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::standard()
            .with_streaming()
            .with_json_mode()
    }

    async fn standard_call(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &CallOptions,
    ) -> Result<NormalizedResponse> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ChatCompletionMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatCompletionMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        // The llama.cpp server ignores the model field; the loaded model is
        // fixed at server start.
        let api_request = ChatCompletionRequest {
            messages,
            temperature: options.temperature.unwrap_or(0.7),
            max_tokens: options.max_tokens.unwrap_or(4096),
        };

        let response = self
            .http
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::backend_call(self.name(), format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::backend_call(self.name(), format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::backend_call(
                self.name(),
                format!("HTTP {}: {}", status, body),
            ));
        }

        let api_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::backend_call(self.name(), format!("failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::backend_call(self.name(), "no choices in response"))?;

        let usage = api_response.usage.unwrap_or_default();
        let model = api_response
            .model
            .unwrap_or_else(|| self.config.default_model.clone());

        Ok(NormalizedResponse::ok(
            choice.message.content.trim(),
            model,
            TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_rejects_empty_base_url() {
        let result = OllamaBackend::new(BackendConfig::new("", "gemma3:latest"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_llamacpp_requires_model() {
        let result = LlamaCppBackend::new(BackendConfig::new("http://localhost:8000", ""));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_backend_capabilities() {
        let ollama =
            OllamaBackend::new(BackendConfig::new("http://localhost:11434", "gemma3:latest"))
                .unwrap();
        let caps = ollama.capabilities();
        assert!(caps.standard_call);
        assert!(caps.system_prompt);
        assert!(!caps.enhanced_call);
        assert!(!caps.streaming);

        let llamacpp = LlamaCppBackend::new(BackendConfig::new(
            "http://localhost:8000",
            "./models/llama-3.1-8b-q4.gguf",
        ))
        .unwrap();
        assert!(llamacpp.capabilities().streaming);
    }

    #[tokio::test]
    async fn test_default_enhanced_call_is_rejected() {
        let ollama =
            OllamaBackend::new(BackendConfig::new("http://localhost:11434", "gemma3:latest"))
                .unwrap();
        let result = ollama
            .enhanced_call("anything", &CallOptions::default())
            .await;
        assert!(matches!(result, Err(Error::BackendCall { .. })));
    }
}
