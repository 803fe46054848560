use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::retriever::Retriever;
use crate::systems::web::{WebSearchClient, WebSearchError};
use crate::systems::System;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_REGION: &str = "us-en";
const DEFAULT_MAX_RESULTS: usize = 3;

/// The research system exposes the two tools the agent routes between:
/// `rag_tool` over the injected document-store retriever, and
/// `web_search` over an external search endpoint.
pub struct ResearchSystem {
    tools: Vec<Tool>,
    retriever: Arc<dyn Retriever>,
    search: WebSearchClient,
    top_k: usize,
}

impl ResearchSystem {
    pub fn new(retriever: Arc<dyn Retriever>, search: WebSearchClient) -> Self {
        let rag_tool = Tool::new(
            "rag_tool",
            "Get grounded information for answering queries about the company's \
            filings (10-K data through 2023). Returns a list of text chunks.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The retrieval query."
                    }
                }
            }),
        );

        let web_search = Tool::new(
            "web_search",
            "Search the web for updated information.",
            json!({
                "type": "object",
                "required": ["keywords"],
                "properties": {
                    "keywords": {
                        "type": "string",
                        "description": "The search query keywords."
                    },
                    "region": {
                        "type": "string",
                        "default": DEFAULT_REGION,
                        "description": "The search region: wt-wt, us-en, uk-en, etc."
                    },
                    "max_results": {
                        "type": "integer",
                        "default": DEFAULT_MAX_RESULTS,
                        "description": "The maximum number of results to return."
                    }
                }
            }),
        );

        Self {
            tools: vec![rag_tool, web_search],
            retriever,
            search,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    async fn rag(&self, arguments: &Value) -> AgentResult<Value> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::InvalidParameters("rag_tool requires a string `query`".to_string())
            })?;

        let documents = self.retriever.retrieve(query, self.top_k).await?;
        tracing::debug!(query, count = documents.len(), "retrieved grounding chunks");

        // The payload is the list of chunk contents.
        Ok(Value::Array(
            documents
                .into_iter()
                .map(|doc| Value::String(doc.content))
                .collect(),
        ))
    }

    async fn web_search(&self, arguments: &Value) -> AgentResult<Value> {
        let keywords = arguments
            .get("keywords")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::InvalidParameters(
                    "web_search requires a string `keywords`".to_string(),
                )
            })?;
        let region = arguments
            .get("region")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REGION);
        let max_results = arguments
            .get("max_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_RESULTS as u64) as usize;

        // Search failures come back as result text so the model can read
        // them and answer accordingly.
        match self.search.text(keywords, region, max_results).await {
            Ok(results) if results.is_empty() => Ok(json!("No results found.")),
            Ok(results) => Ok(json!(results)),
            Err(e @ WebSearchError::RateLimited) => Ok(json!(e.to_string())),
            Err(e) => Ok(json!(format!("Search error: {}", e))),
        }
    }
}

#[async_trait]
impl System for ResearchSystem {
    fn name(&self) -> &str {
        "research"
    }

    fn description(&self) -> &str {
        "Retrieval and web search over company financial data"
    }

    fn instructions(&self) -> &str {
        "Use rag_tool for questions answerable from the filings store; \
        use web_search for current information beyond it."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Value> {
        match tool_call.name.as_str() {
            "rag_tool" => self.rag(&tool_call.arguments).await,
            "web_search" => self.web_search(&tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Document;
    use crate::retriever::StaticRetriever;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture_system(search_url: &str) -> ResearchSystem {
        let retriever = Arc::new(StaticRetriever::new(vec![
            Document::new("Net sales increased to $514B in 2022."),
            Document::new("Operating income was $12.2B."),
        ]));
        ResearchSystem::new(retriever, WebSearchClient::new(search_url).unwrap())
    }

    #[tokio::test]
    async fn test_rag_tool_returns_chunk_contents() {
        let system = fixture_system("http://localhost:1");
        let payload = system
            .call(ToolCall::new("rag_tool", json!({"query": "net sales"})))
            .await
            .unwrap();

        assert_eq!(
            payload,
            json!([
                "Net sales increased to $514B in 2022.",
                "Operating income was $12.2B."
            ])
        );
    }

    #[tokio::test]
    async fn test_rag_tool_requires_query() {
        let system = fixture_system("http://localhost:1");
        let err = system
            .call(ToolCall::new("rag_tool", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_web_search_degrades_failures_to_result_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let system = fixture_system(&server.uri());
        let payload = system
            .call(ToolCall::new("web_search", json!({"keywords": "amazon"})))
            .await
            .unwrap();

        let text = payload.as_str().unwrap();
        assert!(text.starts_with("Search error:"));
    }

    #[tokio::test]
    async fn test_web_search_empty_results_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let system = fixture_system(&server.uri());
        let payload = system
            .call(ToolCall::new("web_search", json!({"keywords": "amazon"})))
            .await
            .unwrap();
        assert_eq!(payload, json!("No results found."));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected() {
        let system = fixture_system("http://localhost:1");
        let err = system
            .call(ToolCall::new("calculator", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::ToolNotFound("calculator".to_string()));
    }
}
