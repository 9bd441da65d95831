//! Shared plumbing for the components that call the completion capability.

use crate::types::SourceDocument;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use verity_core::{AppError, AppResult};
use verity_llm::{LlmClient, LlmRequest};
use verity_prompt::PromptLibrary;

/// Temperature pinned for every gating judgment.
pub const JUDGMENT_TEMPERATURE: f32 = 0.0;

/// Await `future`, failing with [`AppError::Timeout`] once `limit` elapses.
///
/// Dropping the returned future cancels the inner call.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} exceeded its {:?} deadline", operation, limit);
            Err(AppError::Timeout {
                operation: operation.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}

/// A completion client bound to a model, a prompt library and a deadline.
#[derive(Clone)]
pub struct ModelHandle {
    client: Arc<dyn LlmClient>,
    model: String,
    prompts: Arc<PromptLibrary>,
    timeout: Duration,
}

impl ModelHandle {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompts: Arc<PromptLibrary>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompts,
            timeout,
        }
    }

    /// Render prompt `prompt_id` and return the raw completion text.
    pub async fn complete(
        &self,
        prompt_id: &str,
        variables: HashMap<String, String>,
        temperature: f32,
    ) -> AppResult<String> {
        let built = self.prompts.render(prompt_id, variables)?;

        let request = LlmRequest::new(built.user, &self.model)
            .with_system(built.system)
            .with_temperature(temperature);

        let response =
            with_deadline(prompt_id, self.timeout, self.client.complete(&request)).await?;

        tracing::trace!(
            "{} via {} returned {} chars",
            prompt_id,
            self.client.provider_name(),
            response.content.len()
        );

        Ok(response.content)
    }
}

/// Render passages as numbered blocks; position `n` is citation `[n]`.
pub fn format_context(documents: &[SourceDocument]) -> String {
    if documents.is_empty() {
        return "(no passages were retrieved)".to_string();
    }

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let mut header = format!("[{}]", i + 1);
            if let Some(ref title) = doc.title {
                header.push(' ');
                header.push_str(title);
            }
            if !doc.url.is_empty() {
                header.push_str(&format!(" ({})", doc.url));
            }
            format!("{}\n{}", header, doc.content.trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchHit, SourceType};
    use verity_llm::MockLlmClient;
    use verity_prompt::ids;

    #[test]
    fn test_format_context_numbers_from_one() {
        let docs = vec![
            SourceDocument::from_hit(
                SearchHit::new(" First passage ")
                    .with_title("Plan")
                    .with_url("kb://plan"),
                SourceType::Internal,
            )
            .unwrap(),
            SourceDocument::from_hit(SearchHit::new("Second passage"), SourceType::Web).unwrap(),
        ];

        let context = format_context(&docs);
        assert!(context.starts_with("[1] Plan (kb://plan)\nFirst passage"));
        assert!(context.contains("---\n\n[2]\nSecond passage"));
    }

    #[test]
    fn test_format_empty_context() {
        assert_eq!(format_context(&[]), "(no passages were retrieved)");
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_temperature() {
        let mock = Arc::new(MockLlmClient::new("ok"));
        let handle = ModelHandle::new(
            mock.clone(),
            "test-model",
            Arc::new(PromptLibrary::builtin().unwrap()),
            Duration::from_secs(5),
        );

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Why?".to_string());
        let text = handle
            .complete(ids::GRADE, vars, JUDGMENT_TEMPERATURE)
            .await
            .unwrap();

        assert_eq!(text, "ok");
        let calls = mock.calls();
        assert_eq!(calls[0].temperature, Some(0.0));
        assert!(calls[0].system.as_deref().unwrap().contains("relevance grader"));
        assert!(calls[0].prompt.contains("Why?"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let result: AppResult<()> = with_deadline("slow call", Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        match result {
            Err(AppError::Timeout { operation, secs }) => {
                assert_eq!(operation, "slow call");
                assert_eq!(secs, 2);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
