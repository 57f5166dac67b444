//! Prompt augmentation: retrieve external context and rewrite the prompt
//! around it before any reasoning begins.

use std::sync::Arc;

use crate::error::Result;
use crate::provider::{BackendRouter, Prompt};

use super::corpus::Corpus;
use super::splitter::TextSplitter;

const QUERY_EXTRACTION_TEMPLATE: &str = "Extract from the following question the single most \
suitable concise search phrase or named entity for an encyclopedia lookup. Reply with the \
phrase only.";

const AUGMENT_TEMPLATE_HEADER: &str = "Use the following context as the highest-priority \
evidence when answering the original question.";

/// Rewrites a prompt with retrieved context. Retrieval is strictly
/// best-effort: every failure path degrades to the original prompt.
pub struct RetrievalAugmenter {
    router: Arc<BackendRouter>,
    backend: String,
    corpus: Arc<dyn Corpus>,
    splitter: TextSplitter,
    max_docs: usize,
    extract_query: bool,
}

impl RetrievalAugmenter {
    /// External-corpus mode: a backend call condenses the prompt into a
    /// search phrase before retrieval, and documents are re-chunked.
    pub fn external(
        router: Arc<BackendRouter>,
        backend: impl Into<String>,
        corpus: Arc<dyn Corpus>,
    ) -> Self {
        Self {
            router,
            backend: backend.into(),
            corpus,
            splitter: TextSplitter::default(),
            max_docs: 2,
            extract_query: true,
        }
    }

    /// Local-collection mode: the raw prompt text is the query and no
    /// extraction call is made.
    pub fn local(
        router: Arc<BackendRouter>,
        backend: impl Into<String>,
        corpus: Arc<dyn Corpus>,
    ) -> Self {
        Self {
            router,
            backend: backend.into(),
            corpus,
            splitter: TextSplitter::default(),
            max_docs: 2,
            extract_query: false,
        }
    }

    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs.max(1);
        self
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Rewrite `prompt` around retrieved context.
    ///
    /// Identity when retrieval finds nothing or fails; a failed query
    /// extraction falls back to the raw prompt text as the query. This
    /// method never returns an error to the caller's request path.
    pub async fn augment(&self, prompt: &Prompt) -> Prompt {
        let query = if self.extract_query {
            self.extract_search_query(prompt).await
        } else {
            prompt.text.clone()
        };

        let context = match self.retrieve(&query).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, keeping prompt unaugmented");
                return prompt.clone();
            }
        };

        if context.is_empty() {
            tracing::info!("no context retrieved, keeping prompt unaugmented");
            return prompt.clone();
        }

        tracing::info!(chars = context.len(), "prompt augmented with retrieved context");
        prompt.with_text(format!(
            "{AUGMENT_TEMPLATE_HEADER}\n\n# Context to prioritize\n---\n{}\n---\n\n# Original question\n{}",
            context, prompt.text
        ))
    }

    /// Ask the model for a search phrase; fall back to the raw prompt text
    /// on any failure.
    async fn extract_search_query(&self, prompt: &Prompt) -> String {
        let extraction = prompt.with_text(format!(
            "{QUERY_EXTRACTION_TEMPLATE}\n\nQuestion: \"{}\"\n\nSearch phrase:",
            prompt.text
        ));

        match self.router.call(&self.backend, &extraction).await {
            Ok(response) => {
                let query = strip_quoting(&response.text);
                if query.is_empty() {
                    tracing::warn!("empty extracted query, falling back to raw prompt");
                    prompt.text.clone()
                } else {
                    tracing::info!(%query, "extracted search query");
                    query
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "query extraction failed, using raw prompt");
                prompt.text.clone()
            }
        }
    }

    async fn retrieve(&self, query: &str) -> Result<String> {
        let documents = self.corpus.search(query).await?;
        let chunks: Vec<String> = documents
            .into_iter()
            .take(self.max_docs)
            .flat_map(|doc| self.splitter.split(&doc))
            .collect();
        Ok(chunks.join("\n\n"))
    }
}

/// Strip surrounding quotation and bracket characters a model tends to wrap
/// a short answer in.
fn strip_quoting(text: &str) -> String {
    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '「' | '」' | '[' | ']' | '(' | ')' | '«' | '»'))
        .trim()
        .to_string()
}
