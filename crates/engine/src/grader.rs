//! Relevance gate over a deduplicated context set.

use crate::judgment::parse_judgment;
use crate::model::{format_context, ModelHandle, JUDGMENT_TEMPERATURE};
use crate::types::SourceDocument;
use serde::Deserialize;
use std::collections::HashMap;
use verity_core::AppResult;
use verity_prompt::ids;

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceVerdict {
    pub relevant: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

pub struct RelevanceGrader {
    model: ModelHandle,
}

impl RelevanceGrader {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Whether `context` is sufficient to answer `question`.
    ///
    /// An empty context is never sufficient and costs no model call. Output
    /// that cannot be read as a verdict counts as not relevant.
    pub async fn grade(&self, question: &str, context: &[SourceDocument]) -> AppResult<bool> {
        if context.is_empty() {
            tracing::debug!("Nothing retrieved, skipping relevance judgment");
            return Ok(false);
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(context));

        let raw = self
            .model
            .complete(ids::GRADE, vars, JUDGMENT_TEMPERATURE)
            .await?;

        let relevant = parse_judgment::<RelevanceVerdict>(&raw).decide(|verdict| {
            if let Some(reason) = verdict.reason.as_deref() {
                tracing::debug!("Relevance {}: {}", verdict.relevant, reason);
            }
            verdict.relevant
        });

        Ok(relevant)
    }
}
