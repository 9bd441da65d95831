//! Query reformulation after a failed relevance gate.

use crate::dedup::normalize_content;
use crate::model::ModelHandle;
use std::collections::HashMap;
use verity_core::AppResult;
use verity_prompt::ids;

/// Leading labels models like to put in front of the query.
const LABELS: &[&str] = &["rewritten query:", "search query:", "new query:", "query:"];

pub struct QueryTransformer {
    model: ModelHandle,
    temperature: f32,
    max_words: usize,
}

impl QueryTransformer {
    pub fn new(model: ModelHandle, temperature: f32, max_words: usize) -> Self {
        Self {
            model,
            temperature,
            max_words,
        }
    }

    /// Ask for an alternative search query.
    ///
    /// `None` means nothing usable came back (empty, or a repeat of a query
    /// already tried); the caller keeps its latest query.
    pub async fn rewrite(&self, question: &str, previous: &[String]) -> AppResult<Option<String>> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("previous_queries".to_string(), numbered(previous));
        vars.insert("max_words".to_string(), self.max_words.to_string());

        let raw = self.model.complete(ids::REWRITE, vars, self.temperature).await?;

        let rewritten = sanitize_rewrite(&raw, previous, self.max_words);
        match rewritten {
            Some(ref query) => tracing::debug!("Rewrote query to: {}", query),
            None => tracing::debug!("Rewrite produced nothing new: {:?}", raw),
        }

        Ok(rewritten)
    }
}

fn numbered(queries: &[String]) -> String {
    queries
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce raw model output to a single usable query.
///
/// Keeps the first non-empty line, drops a leading label and surrounding
/// quotes, then caps the word count. Returns `None` when the result is empty
/// or matches a previous query ignoring case and whitespace.
pub fn sanitize_rewrite(raw: &str, previous: &[String], max_words: usize) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;

    let mut query = strip_quotes(line);
    let label = LABELS.iter().find(|label| {
        query
            .get(..label.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(label))
    });
    if let Some(label) = label {
        query = strip_quotes(&query[label.len()..]);
    }

    let query = query
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        return None;
    }

    let key = query.to_lowercase();
    let repeated = previous
        .iter()
        .any(|p| normalize_content(p).to_lowercase() == key);

    if repeated {
        None
    } else {
        Some(query)
    }
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim()
}
