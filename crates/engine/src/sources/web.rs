//! Web search through a SearxNG-compatible JSON endpoint.

use super::SearchBackend;
use crate::types::SearchHit;
use serde::Deserialize;
use verity_core::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

/// External web search.
pub struct WebSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearch {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

fn into_hits(response: SearxResponse, limit: usize) -> Vec<SearchHit> {
    response
        .results
        .into_iter()
        .take(limit)
        .map(|r| SearchHit {
            content: r.content.unwrap_or_default(),
            url: r.url,
            title: r.title,
            score: r.score,
        })
        .collect()
}

#[async_trait::async_trait]
impl SearchBackend for WebSearch {
    fn name(&self) -> &str {
        "web"
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Web search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Search(format!(
                "Web search error ({}): {}",
                status, error_text
            )));
        }

        let body: SearxResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse web search response: {}", e)))?;

        Ok(into_hits(body, limit))
    }
}
