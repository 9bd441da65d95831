//! Engine data model.

use crate::verifier::cited_indices;
use serde::{Deserialize, Serialize};
use verity_core::EngineSettings;

/// Maximum snippet length for source references.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Which backend a passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Internal structured search
    Internal,
    /// External web search
    Web,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Internal => "internal",
            SourceType::Web => "web",
        }
    }
}

/// A raw result as returned by a search capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

impl SearchHit {
    /// Hit with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// A single retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Passage text
    pub content: String,

    /// Origin address; empty when the passage has none
    pub url: String,

    pub source_type: SourceType,

    /// Optional display label
    pub title: Option<String>,

    /// Backend score; informational only, never read by the grader
    pub relevance_score: Option<f32>,
}

impl SourceDocument {
    /// Map a backend hit into a document. Returns `None` for blank content,
    /// which must never end up in a context set.
    pub fn from_hit(hit: SearchHit, source_type: SourceType) -> Option<Self> {
        if hit.content.trim().is_empty() {
            return None;
        }

        Some(Self {
            content: hit.content,
            url: hit.url.unwrap_or_default(),
            source_type,
            title: hit.title.filter(|t| !t.trim().is_empty()),
            relevance_score: hit.score,
        })
    }
}

/// User-facing reference to a passage the answer cited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// 1-based citation number
    pub index: usize,
    pub title: Option<String>,
    pub url: String,
    pub source_type: SourceType,
    /// Short excerpt of the passage
    pub snippet: String,
}

/// Named states of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieve,
    Grade,
    Rewrite,
    Generate,
    Verify,
    Regenerate,
    Finalize,
}

/// The record threaded through one question's processing.
///
/// Only the controller mutates it; callers receive it once the workflow has
/// reached [`Stage::Finalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub question: String,

    /// Element 0 is always the original question
    pub transformed_queries: Vec<String>,

    /// Deduplicated passages from the latest retrieval pass
    pub context: Vec<SourceDocument>,

    /// Latest answer text, banner-prefixed when unverified
    pub generation: String,

    pub iteration_count: u32,
    pub max_iterations: u32,
    pub generation_attempts: u32,
    pub max_generation_attempts: u32,

    pub relevance_ok: bool,
    pub citations_ok: bool,

    /// Empty unless the workflow ended without verified citations
    pub warning_banner: String,

    /// Every state visited, in order
    pub stages: Vec<Stage>,
}

impl WorkflowState {
    /// Fresh state for `question` with bounds taken from `settings`.
    pub fn new(question: impl Into<String>, settings: &EngineSettings) -> Self {
        let question = question.into();
        Self {
            transformed_queries: vec![question.clone()],
            question,
            context: Vec::new(),
            generation: String::new(),
            iteration_count: 0,
            max_iterations: settings.max_iterations,
            generation_attempts: 0,
            max_generation_attempts: settings.max_generation_attempts,
            relevance_ok: false,
            citations_ok: false,
            warning_banner: String::new(),
            stages: Vec::new(),
        }
    }

    /// The query the next retrieval pass uses.
    pub fn current_query(&self) -> &str {
        self.transformed_queries
            .last()
            .map(String::as_str)
            .unwrap_or(&self.question)
    }

    /// Whether the answer's citations passed verification.
    pub fn is_verified(&self) -> bool {
        self.citations_ok
    }

    /// Distinct in-range citation numbers in first-citation order.
    pub fn cited_indices(&self) -> Vec<usize> {
        cited_indices(&self.generation)
            .into_iter()
            .filter(|n| (1..=self.context.len()).contains(n))
            .collect()
    }

    /// References for every passage the answer cites.
    pub fn cited_sources(&self) -> Vec<SourceRef> {
        self.cited_indices()
            .into_iter()
            .map(|index| {
                let doc = &self.context[index - 1];
                SourceRef {
                    index,
                    title: doc.title.clone(),
                    url: doc.url.clone(),
                    source_type: doc.source_type,
                    snippet: truncate_snippet(&doc.content, MAX_SNIPPET_LENGTH),
                }
            })
            .collect()
    }
}

/// Truncate to at most `max_len` bytes, preferring a word boundary.
pub fn truncate_snippet(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
