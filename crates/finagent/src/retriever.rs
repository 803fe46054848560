//! Access to the document store backing `rag_tool`. The store itself is
//! an external collaborator; implementations here either wrap a fixture
//! corpus or reach a remote store over HTTP. The retriever handle is
//! injected into whichever system issues queries, so there is no
//! module-level retriever state to initialize.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::errors::{AgentError, AgentResult};
use crate::extract::coerce_documents;
use crate::models::document::Document;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve the passages most relevant to `query`.
    async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult<Vec<Document>>;
}

/// Fixture-backed retriever for offline runs and tests. Returns its
/// corpus in order, truncated to `top_k`; relevance ranking belongs to
/// the real document store.
pub struct StaticRetriever {
    corpus: Vec<Document>,
}

impl StaticRetriever {
    pub fn new(corpus: Vec<Document>) -> Self {
        Self { corpus }
    }

    /// Load a corpus staged as a JSON array of documents.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading corpus from {}", path.as_ref().display()))?;
        let corpus: Vec<Document> =
            serde_json::from_str(&raw).context("corpus file is not a JSON array of documents")?;
        Ok(Self::new(corpus))
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str, top_k: usize) -> AgentResult<Vec<Document>> {
        Ok(self.corpus.iter().take(top_k).cloned().collect())
    }
}

/// Client for an external document-store service exposing a query
/// endpoint that answers `{"documents": [...]}`.
pub struct HttpRetriever {
    client: Client,
    base_url: String,
}

impl HttpRetriever {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult<Vec<Document>> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("document store request: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::ExecutionError(format!(
                "document store returned {}",
                response.status()
            )));
        }

        let body = response
            .json()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("document store response: {}", e)))?;

        Ok(coerce_documents(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_retriever_truncates_to_top_k() {
        let retriever = StaticRetriever::new(vec![
            Document::new("one"),
            Document::new("two"),
            Document::new("three"),
        ]);
        let docs = retriever.retrieve("anything", 2).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "one");
    }

    #[tokio::test]
    async fn test_static_retriever_loads_staged_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            json!([
                {"content": "Net sales were $514B", "metadata": {"year": 2022}},
                {"content": "AWS revenue grew 29%"},
            ])
            .to_string(),
        )
        .unwrap();

        let retriever = StaticRetriever::from_json_file(&path).unwrap();
        let docs = retriever.retrieve("anything", 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].metadata["year"], 2022);
    }

    #[tokio::test]
    async fn test_http_retriever_coerces_store_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    {"content": "Net sales were $514B", "meta": {"year": 2022}},
                    {"text": "Operating income grew"},
                ]
            })))
            .mount(&server)
            .await;

        let retriever = HttpRetriever::new(server.uri()).unwrap();
        let docs = retriever.retrieve("net sales", 5).await.unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Net sales were $514B");
        assert_eq!(docs[0].metadata["year"], 2022);
        assert_eq!(docs[1].content, "Operating income grew");
    }

    #[tokio::test]
    async fn test_http_retriever_surfaces_store_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let retriever = HttpRetriever::new(server.uri()).unwrap();
        let err = retriever.retrieve("q", 5).await.unwrap_err();
        assert!(matches!(err, AgentError::ExecutionError(_)));
    }
}
