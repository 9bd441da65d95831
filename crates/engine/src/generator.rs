//! Cited answer generation.

use crate::model::{format_context, ModelHandle};
use crate::types::SourceDocument;
use std::collections::HashMap;
use verity_core::AppResult;
use verity_prompt::ids;

pub struct AnswerGenerator {
    model: ModelHandle,
    temperature: f32,
}

impl AnswerGenerator {
    pub fn new(model: ModelHandle, temperature: f32) -> Self {
        Self { model, temperature }
    }

    /// Answer `question` from `context`, citing passages as `[n]`.
    ///
    /// Position `n` in `context` (1-based) is citation `[n]`. The text is not
    /// checked here.
    pub async fn generate(&self, question: &str, context: &[SourceDocument]) -> AppResult<String> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(context));

        let answer = self
            .model
            .complete(ids::GENERATE, vars, self.temperature)
            .await?;

        Ok(answer.trim().to_string())
    }
}
