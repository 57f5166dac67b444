//! Retrieval sources: an encyclopedia-style HTTP corpus and a locally
//! loaded document collection.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::backend::build_http_client;

/// A searchable source of documents. `search` returns full document texts
/// in relevance order; an empty result is a normal outcome, not an error.
#[async_trait]
pub trait Corpus: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// MediaWiki-style encyclopedia corpus queried over HTTP.
///
/// One request per search: a full-text search generator joined with plain
/// extracts, so each hit comes back with its article text.
pub struct EncyclopediaCorpus {
    http: Client,
    api_url: String,
    max_docs: usize,
    max_doc_chars: usize,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    index: usize,
    title: String,
    #[serde(default)]
    extract: String,
}

impl EncyclopediaCorpus {
    pub const DEFAULT_API_URL: &'static str = "https://en.wikipedia.org/w/api.php";

    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_http_client(30)?,
            api_url: api_url.into(),
            max_docs: 2,
            max_doc_chars: 2000,
        })
    }

    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs.max(1);
        self
    }

    pub fn with_max_doc_chars(mut self, max_doc_chars: usize) -> Self {
        self.max_doc_chars = max_doc_chars.max(1);
        self
    }

    fn extract_documents(&self, envelope: SearchEnvelope) -> Vec<String> {
        let mut pages = envelope.query.map(|q| q.pages).unwrap_or_default();
        // The generator returns pages in arbitrary order; `index` carries
        // the search ranking.
        pages.sort_by_key(|p| p.index);
        pages
            .into_iter()
            .filter(|p| !p.extract.is_empty())
            .take(self.max_docs)
            .map(|p| {
                tracing::debug!(title = %p.title, "retrieved article");
                p.extract.chars().take(self.max_doc_chars).collect()
            })
            .collect()
    }
}

#[async_trait]
impl Corpus for EncyclopediaCorpus {
    fn name(&self) -> &str {
        "encyclopedia"
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        tracing::info!(%query, "searching encyclopedia");
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", &self.max_docs.to_string()),
                ("prop", "extracts"),
                ("explaintext", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("encyclopedia request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "encyclopedia returned status {}",
                response.status()
            )));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("unreadable encyclopedia response: {}", e)))?;

        Ok(self.extract_documents(envelope))
    }
}

/// Documents loaded from local files, searched by query-term overlap.
#[derive(Debug)]
pub struct DocumentCollection {
    documents: Vec<LoadedDocument>,
}

#[derive(Debug)]
struct LoadedDocument {
    path: PathBuf,
    text: String,
}

impl DocumentCollection {
    /// Load every file matching the glob pattern. Unreadable files are
    /// skipped with a warning; an invalid pattern is a configuration error.
    pub fn load(pattern: &str) -> Result<Self> {
        let paths = glob::glob(pattern)
            .map_err(|e| Error::config(format!("invalid document pattern '{}': {}", pattern, e)))?;

        let mut documents = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) if !text.trim().is_empty() => {
                    documents.push(LoadedDocument { path, text });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }

        tracing::info!(count = documents.len(), %pattern, "loaded document collection");
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(|t| t.to_lowercase())
            .collect()
    }
}

#[async_trait]
impl Corpus for DocumentCollection {
    fn name(&self) -> &str {
        "documents"
    }

    /// Rank documents by how many distinct query terms they contain.
    /// Documents sharing no terms with the query are excluded.
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &LoadedDocument)> = self
            .documents
            .iter()
            .map(|doc| {
                let doc_terms = Self::terms(&doc.text);
                let score = query_terms.intersection(&doc_terms).count();
                (score, doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        for (score, doc) in &scored {
            tracing::debug!(path = %doc.path.display(), score, "matched document");
        }

        Ok(scored.into_iter().map(|(_, doc)| doc.text.clone()).collect())
    }
}
