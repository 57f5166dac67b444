//! Scripted backend test double shared by the crate's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::backend::LlmBackend;
use super::types::{BackendCapabilities, CallOptions, NormalizedResponse, TokenUsage};

enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// Backend whose replies are scripted per test. When the script runs out it
/// echoes `Mocked response for: <prompt>`.
pub(crate) struct MockBackend {
    name: String,
    capabilities: BackendCapabilities,
    script: Mutex<VecDeque<ScriptedReply>>,
    fail_containing: Mutex<Option<(String, String)>>,
    calls: Mutex<Vec<String>>,
    enhanced_calls: AtomicUsize,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    pub(crate) fn standard(name: impl Into<String>) -> Self {
        Self::with_capabilities(name, BackendCapabilities::standard())
    }

    pub(crate) fn enhanced(name: impl Into<String>) -> Self {
        Self::with_capabilities(name, BackendCapabilities::enhanced())
    }

    pub(crate) fn with_capabilities(
        name: impl Into<String>,
        capabilities: BackendCapabilities,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            script: Mutex::new(VecDeque::new()),
            fail_containing: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            enhanced_calls: AtomicUsize::new(0),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep inside every call, to widen overlap windows in gate tests.
    pub(crate) fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// Queue the next successful reply.
    pub(crate) fn push_text(&self, text: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Text(text.into()));
    }

    /// Queue the next reply as a transport failure.
    pub(crate) fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Fail(message.into()));
    }

    /// Fail the very next call, ahead of any queued replies.
    pub(crate) fn fail_next(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_front(ScriptedReply::Fail(message.into()));
    }

    /// Fail any call whose prompt contains `needle`.
    pub(crate) fn fail_when_contains(&self, needle: impl Into<String>, message: impl Into<String>) {
        *self.fail_containing.lock().unwrap() = Some((needle.into(), message.into()));
    }

    /// Prompts received so far, in arrival order.
    pub(crate) fn recorded_prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn enhanced_call_count(&self) -> usize {
        self.enhanced_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight simultaneously.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn reply(&self, prompt: &str) -> Result<NormalizedResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push(prompt.to_string());

        let result = (|| {
            if let Some((needle, message)) = self.fail_containing.lock().unwrap().as_ref() {
                if prompt.contains(needle.as_str()) {
                    return Err(Error::backend_call(&self.name, message.clone()));
                }
            }

            match self.script.lock().unwrap().pop_front() {
                Some(ScriptedReply::Text(text)) => Ok(NormalizedResponse::ok(
                    text,
                    "mock-model",
                    TokenUsage::new(10, 10),
                )),
                Some(ScriptedReply::Fail(message)) => Err(Error::backend_call(&self.name, message)),
                None => Ok(NormalizedResponse::ok(
                    format!("Mocked response for: {prompt}"),
                    "mock-model",
                    TokenUsage::new(10, 10),
                )),
            }
        })();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    async fn standard_call(
        &self,
        prompt: &str,
        _system: Option<&str>,
        _options: &CallOptions,
    ) -> Result<NormalizedResponse> {
        self.reply(prompt).await
    }

    async fn enhanced_call(
        &self,
        prompt: &str,
        _options: &CallOptions,
    ) -> Result<NormalizedResponse> {
        if !self.capabilities.enhanced_call {
            return Err(Error::backend_call(&self.name, "enhanced_call not supported"));
        }
        self.enhanced_calls.fetch_add(1, Ordering::SeqCst);
        self.reply(prompt).await
    }
}
