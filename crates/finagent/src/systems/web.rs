use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One hit from the external search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("Rate limit reached. Please try again later.")]
    RateLimited,

    #[error("search service returned {0}")]
    Service(StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Thin client to an external web-search endpoint. The endpoint answers
/// a JSON array of results for `GET /search`.
pub struct WebSearchClient {
    client: Client,
    base_url: String,
}

impl WebSearchClient {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn text(
        &self,
        keywords: &str,
        region: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, WebSearchError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let max_results = max_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", keywords),
                ("region", region),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::TOO_MANY_REQUESTS => Err(WebSearchError::RateLimited),
            status => Err(WebSearchError::Service(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_text_returns_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "amazon earnings 2024"))
            .and(query_param("region", "us-en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "Amazon Q4 2024", "href": "https://example.com", "body": "Earnings rose."}
            ])))
            .mount(&server)
            .await;

        let client = WebSearchClient::new(server.uri()).unwrap();
        let results = client.text("amazon earnings 2024", "us-en", 3).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Amazon Q4 2024");
    }

    #[tokio::test]
    async fn test_text_maps_rate_limiting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = WebSearchClient::new(server.uri()).unwrap();
        let err = client.text("anything", "us-en", 3).await.unwrap_err();
        assert!(matches!(err, WebSearchError::RateLimited));
        assert_eq!(err.to_string(), "Rate limit reached. Please try again later.");
    }
}
