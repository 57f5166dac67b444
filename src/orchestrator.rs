//! Top-level request flow: optional retrieval augmentation, complexity
//! classification, strategy dispatch.

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::dispatch::{ReasoningDispatcher, ReasoningMode};
use crate::error::Result;
use crate::provider::{BackendRegistry, BackendRouter, ConcurrencyGate, NormalizedResponse, Prompt};
use crate::retrieval::{Corpus, RetrievalAugmenter, TextSplitter};

/// The assembled orchestrator.
///
/// Construction wires the registry through the gate into one shared router;
/// every reasoning strategy and the augmenter issue calls through that seam,
/// so admission control covers them uniformly.
pub struct AdaptiveOrchestrator {
    router: Arc<BackendRouter>,
    dispatcher: ReasoningDispatcher,
    augmenter: Option<RetrievalAugmenter>,
    config: OrchestratorConfig,
}

impl AdaptiveOrchestrator {
    pub fn new(config: OrchestratorConfig, registry: BackendRegistry) -> Self {
        let gate = Arc::new(ConcurrencyGate::new(&config.gate_limits));
        let router = Arc::new(BackendRouter::new(registry, gate));
        let dispatcher = ReasoningDispatcher::new(Arc::clone(&router), &config.default_backend)
            .with_max_subproblems(config.max_subproblems);

        Self {
            router,
            dispatcher,
            augmenter: None,
            config,
        }
    }

    /// Enable external-corpus retrieval. Query extraction goes through the
    /// default backend; chunking follows the configured window.
    pub fn with_external_retrieval(mut self, corpus: Arc<dyn Corpus>) -> Self {
        self.augmenter = Some(self.build_augmenter(corpus, true));
        self
    }

    /// Enable local-collection retrieval (raw prompt as the query).
    pub fn with_local_retrieval(mut self, corpus: Arc<dyn Corpus>) -> Self {
        self.augmenter = Some(self.build_augmenter(corpus, false));
        self
    }

    fn build_augmenter(&self, corpus: Arc<dyn Corpus>, external: bool) -> RetrievalAugmenter {
        let augmenter = if external {
            RetrievalAugmenter::external(
                Arc::clone(&self.router),
                &self.config.default_backend,
                corpus,
            )
        } else {
            RetrievalAugmenter::local(
                Arc::clone(&self.router),
                &self.config.default_backend,
                corpus,
            )
        };
        augmenter
            .with_max_docs(self.config.retrieval_max_docs)
            .with_splitter(TextSplitter::new(
                self.config.retrieval_chunk_size,
                self.config.retrieval_chunk_overlap,
            ))
    }

    pub fn router(&self) -> &Arc<BackendRouter> {
        &self.router
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process one request end to end. Always yields a response; terminal
    /// strategy failures arrive as a structured error response, never a
    /// panic or an unhandled fault.
    pub async fn process(&self, prompt: &Prompt, mode: ReasoningMode) -> NormalizedResponse {
        let prompt = match &self.augmenter {
            Some(augmenter) => augmenter.augment(prompt).await,
            None => prompt.clone(),
        };
        self.dispatcher.dispatch(&prompt, mode).await
    }

    /// String-mode entry point for callers holding raw input. An unknown
    /// mode string is a configuration error surfaced before any backend
    /// call is made.
    pub async fn process_text(&self, text: &str, mode: &str) -> Result<NormalizedResponse> {
        let mode: ReasoningMode = mode.parse()?;
        Ok(self.process(&Prompt::new(text), mode).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::provider::mock::MockBackend;
    use crate::provider::BackendTier;
    use async_trait::async_trait;

    struct FixedCorpus(Vec<String>);

    #[async_trait]
    impl Corpus for FixedCorpus {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn orchestrator_with(backend: Arc<MockBackend>) -> AdaptiveOrchestrator {
        let mut registry = BackendRegistry::new();
        registry.register_instance("mock", BackendTier::Standard, backend);
        AdaptiveOrchestrator::new(OrchestratorConfig::new("mock"), registry)
    }

    #[tokio::test]
    async fn test_process_routes_through_default_backend() {
        let backend = Arc::new(MockBackend::standard("mock"));
        let orchestrator = orchestrator_with(backend.clone());

        let response = orchestrator
            .process(&Prompt::new("hello"), ReasoningMode::Efficient)
            .await;
        assert_eq!(response.text, "Mocked response for: hello");
        assert!(!response.is_error());
    }

    #[tokio::test]
    async fn test_process_text_rejects_unknown_mode_before_any_call() {
        let backend = Arc::new(MockBackend::standard("mock"));
        let orchestrator = orchestrator_with(backend.clone());

        let err = orchestrator.process_text("hello", "warp").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_text_accepts_every_mode_string() {
        let backend = Arc::new(MockBackend::standard("mock"));
        let orchestrator = orchestrator_with(backend.clone());

        for mode in ReasoningMode::ALL {
            let response = orchestrator
                .process_text("hi", &mode.to_string())
                .await
                .unwrap();
            assert!(!response.is_error(), "mode {mode} failed");
        }
    }

    #[tokio::test]
    async fn test_retrieval_context_reaches_the_reasoning_call() {
        let backend = Arc::new(MockBackend::standard("mock"));
        let corpus = Arc::new(FixedCorpus(vec!["Paris is the capital of France.".to_string()]));

        let mut registry = BackendRegistry::new();
        registry.register_instance("mock", BackendTier::Standard, backend.clone());
        let orchestrator = AdaptiveOrchestrator::new(OrchestratorConfig::new("mock"), registry)
            .with_local_retrieval(corpus);

        orchestrator
            .process(&Prompt::new("capital of France?"), ReasoningMode::Efficient)
            .await;

        let prompts = backend.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Paris is the capital of France."));
        assert!(prompts[0].contains("capital of France?"));
    }

    #[tokio::test]
    async fn test_missing_backend_is_a_structured_error_response() {
        let registry = BackendRegistry::new();
        let orchestrator = AdaptiveOrchestrator::new(OrchestratorConfig::new("ghost"), registry);

        let response = orchestrator
            .process(&Prompt::new("hello"), ReasoningMode::Efficient)
            .await;
        assert!(response.is_error());
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_gate_limit_from_config_serializes_backend_calls() {
        let backend = Arc::new(MockBackend::standard("mock").with_delay_ms(5));
        backend.push_text("1. a\n2. b\n3. c");

        let mut registry = BackendRegistry::new();
        registry.register_instance("mock", BackendTier::Standard, backend.clone());
        let config = OrchestratorConfig::new("mock").with_gate_limit("mock", 1);
        let orchestrator = AdaptiveOrchestrator::new(config, registry);

        orchestrator
            .process(&Prompt::new("hard problem"), ReasoningMode::Decomposed)
            .await;
        assert_eq!(backend.max_in_flight(), 1);
    }
}
