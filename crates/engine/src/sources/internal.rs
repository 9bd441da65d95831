//! HTTP client for the internal structured search service.
//!
//! The service takes `POST {endpoint}` with `{"query": .., "match_count": ..}`
//! and answers with matched rows, either as a bare array or wrapped in
//! `{"results": [...]}`.

use super::SearchBackend;
use crate::types::SearchHit;
use serde::{Deserialize, Serialize};
use verity_core::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    query: &'a str,
    match_count: usize,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "score")]
    similarity: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatchResponse {
    Rows(Vec<MatchRow>),
    Wrapped { results: Vec<MatchRow> },
}

impl MatchResponse {
    fn into_hits(self) -> Vec<SearchHit> {
        let rows = match self {
            MatchResponse::Rows(rows) => rows,
            MatchResponse::Wrapped { results } => results,
        };

        rows.into_iter()
            .map(|row| SearchHit {
                content: row.content.unwrap_or_default(),
                url: row.url,
                title: row.title,
                score: row.similarity,
            })
            .collect()
    }
}

/// Internal structured search over HTTP.
pub struct InternalSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl InternalSearch {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl SearchBackend for InternalSearch {
    fn name(&self) -> &str {
        "internal"
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&MatchRequest {
                query,
                match_count: limit,
            })
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Internal search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Search(format!(
                "Internal search error ({}): {}",
                status, error_text
            )));
        }

        let matches: MatchResponse = response.json().await.map_err(|e| {
            AppError::Search(format!("Failed to parse internal search response: {}", e))
        })?;

        Ok(matches.into_hits())
    }
}
