//! Multi-source retrieval.
//!
//! Queries the internal and web backends concurrently and concatenates their
//! passages, internal first. One failing backend degrades to an empty list;
//! only when every enabled backend fails does the pass fail.

use crate::model::with_deadline;
use crate::sources::SearchBackend;
use crate::types::{SourceDocument, SourceType};
use std::sync::Arc;
use std::time::Duration;
use verity_core::{AppError, AppResult};

pub struct MultiSourceRetriever {
    internal: Arc<dyn SearchBackend>,
    web: Arc<dyn SearchBackend>,
    internal_limit: usize,
    web_limit: usize,
    timeout: Duration,
}

impl MultiSourceRetriever {
    pub fn new(
        internal: Arc<dyn SearchBackend>,
        web: Arc<dyn SearchBackend>,
        internal_limit: usize,
        web_limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            internal,
            web,
            internal_limit,
            web_limit,
            timeout,
        }
    }

    /// Internal passages followed by web passages for `query`.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<SourceDocument>> {
        let (internal, web) = futures::join!(
            self.fetch(self.internal.as_ref(), SourceType::Internal, query, self.internal_limit),
            self.fetch(self.web.as_ref(), SourceType::Web, query, self.web_limit),
        );

        let mut documents = Vec::new();
        let mut enabled = 0;
        let mut failures: Vec<AppError> = Vec::new();

        // Fixed order regardless of which call finished first
        for (source_type, outcome) in [(SourceType::Internal, internal), (SourceType::Web, web)] {
            let Some(outcome) = outcome else {
                continue;
            };
            enabled += 1;

            match outcome {
                Ok(docs) => documents.extend(docs),
                Err(e) => {
                    tracing::warn!(
                        "{} search failed, continuing without it: {}",
                        source_type.as_str(),
                        e
                    );
                    failures.push(e);
                }
            }
        }

        if enabled > 0 && failures.len() == enabled {
            return Err(failures.remove(0));
        }

        tracing::debug!("Retrieved {} passages for query: {}", documents.len(), query);
        Ok(documents)
    }

    /// `None` when the backend is disabled by a zero limit.
    async fn fetch(
        &self,
        backend: &dyn SearchBackend,
        source_type: SourceType,
        query: &str,
        limit: usize,
    ) -> Option<AppResult<Vec<SourceDocument>>> {
        if limit == 0 {
            return None;
        }

        let operation = format!("{} search", backend.name());
        let result = with_deadline(&operation, self.timeout, backend.search(query, limit)).await;

        Some(result.map(|hits| {
            hits.into_iter()
                .take(limit)
                .filter_map(|hit| SourceDocument::from_hit(hit, source_type))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticSearchBackend;
    use crate::types::SearchHit;

    fn retriever(
        internal: StaticSearchBackend,
        web: StaticSearchBackend,
    ) -> MultiSourceRetriever {
        MultiSourceRetriever::new(
            Arc::new(internal),
            Arc::new(web),
            5,
            3,
            Duration::from_secs(2),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_internal_first_even_when_web_answers_first() {
        let internal = StaticSearchBackend::new("internal", vec![SearchHit::new("kb passage")])
            .with_delay(Duration::from_millis(500));
        let web = StaticSearchBackend::new("web", vec![SearchHit::new("web passage")]);

        let docs = retriever(internal, web).retrieve("q").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source_type, SourceType::Internal);
        assert_eq!(docs[0].content, "kb passage");
        assert_eq!(docs[1].source_type, SourceType::Web);
    }

    #[tokio::test]
    async fn test_one_failing_backend_is_isolated() {
        let internal = StaticSearchBackend::failing("internal");
        let web = StaticSearchBackend::new("web", vec![SearchHit::new("web passage")]);

        let docs = retriever(internal, web).retrieve("q").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_type, SourceType::Web);
    }

    #[tokio::test]
    async fn test_both_failing_propagates() {
        let result = retriever(
            StaticSearchBackend::failing("internal"),
            StaticSearchBackend::failing("web"),
        )
        .retrieve("q")
        .await;

        match result {
            Err(AppError::Search(msg)) => assert!(msg.contains("internal")),
            other => panic!("Expected search error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_counts_as_failure() {
        let internal = StaticSearchBackend::new("internal", vec![SearchHit::new("late")])
            .with_delay(Duration::from_secs(30));
        let web = StaticSearchBackend::new("web", vec![SearchHit::new("on time")]);

        let docs = retriever(internal, web).retrieve("q").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "on time");
    }

    #[tokio::test]
    async fn test_limits_and_blank_hits() {
        let internal = StaticSearchBackend::new(
            "internal",
            (0..8).map(|i| SearchHit::new(format!("kb {}", i))).collect(),
        );
        let web = StaticSearchBackend::new(
            "web",
            vec![SearchHit::new("   "), SearchHit::new("w1"), SearchHit::new("w2")],
        );

        let docs = retriever(internal, web).retrieve("q").await.unwrap();
        let internal_count = docs
            .iter()
            .filter(|d| d.source_type == SourceType::Internal)
            .count();
        assert_eq!(internal_count, 5);
        // The blank hit is dropped after the limit is applied
        assert_eq!(docs.len(), 7);
    }

    #[tokio::test]
    async fn test_disabled_backend_is_not_called() {
        let web = Arc::new(StaticSearchBackend::new("web", vec![SearchHit::new("w")]));
        let internal = Arc::new(StaticSearchBackend::failing("internal"));
        let retriever = MultiSourceRetriever::new(
            internal.clone(),
            web.clone(),
            5,
            0,
            Duration::from_secs(2),
        );

        // Web is disabled, so the internal failure is the only enabled outcome
        assert!(retriever.retrieve("q").await.is_err());
        assert_eq!(web.call_count(), 0);
        assert_eq!(internal.call_count(), 1);
    }
}
