//! Citation verification.
//!
//! Two ordered checks. The structural check reads `[n]` markers without
//! calling the model: an answer with no markers, or with any marker outside
//! `1..=context.len()`, fails right there. Only an answer that passes it is
//! sent to the model for a semantic support judgment.

use crate::judgment::parse_judgment;
use crate::model::{format_context, ModelHandle, JUDGMENT_TEMPERATURE};
use crate::types::SourceDocument;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use verity_core::AppResult;
use verity_prompt::ids;

static CITATION_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([+-]?\d+)\]").expect("citation marker regex is valid"));

/// Semantic verdict returned by the citation auditor.
#[derive(Debug, Clone, Deserialize)]
pub struct SupportVerdict {
    pub supported: bool,
    #[serde(default)]
    pub unsupported_claims: Vec<String>,
}

/// Outcome of the structural check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationCheck {
    /// No `[n]` marker in the answer
    Missing,
    /// The first marker outside the context range, as written
    OutOfRange { marker: String },
    /// Every marker is in range; distinct indices in first-citation order
    InRange(Vec<usize>),
}

impl CitationCheck {
    pub fn passed(&self) -> bool {
        matches!(self, CitationCheck::InRange(_))
    }
}

/// Structural check of `answer` against a context of `context_len` passages.
///
/// Zero, signed numerals and numerals too large for `usize` are out of range.
pub fn check_citations(answer: &str, context_len: usize) -> CitationCheck {
    let mut indices = Vec::new();

    for caps in CITATION_MARKER_RE.captures_iter(answer) {
        let digits = &caps[1];
        match marker_index(digits) {
            Some(n) if (1..=context_len).contains(&n) => {
                if !indices.contains(&n) {
                    indices.push(n);
                }
            }
            _ => {
                return CitationCheck::OutOfRange {
                    marker: format!("[{}]", digits),
                }
            }
        }
    }

    if indices.is_empty() {
        CitationCheck::Missing
    } else {
        CitationCheck::InRange(indices)
    }
}

/// Distinct citation numbers in `answer`, in first-citation order.
///
/// Signed markers and markers that do not fit in `usize` are skipped; no
/// range check is applied.
pub fn cited_indices(answer: &str) -> Vec<usize> {
    let mut indices = Vec::new();
    for caps in CITATION_MARKER_RE.captures_iter(answer) {
        if let Some(n) = marker_index(&caps[1]) {
            if !indices.contains(&n) {
                indices.push(n);
            }
        }
    }
    indices
}

/// Unsigned decimal index of a marker. `usize::from_str` accepts a leading
/// `+`, so signs are rejected before parsing.
fn marker_index(digits: &str) -> Option<usize> {
    if digits.starts_with(['+', '-']) {
        return None;
    }
    digits.parse().ok()
}

pub struct CitationVerifier {
    model: ModelHandle,
}

impl CitationVerifier {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Whether `answer` cites only real passages and its claims are supported.
    pub async fn verify(
        &self,
        question: &str,
        context: &[SourceDocument],
        answer: &str,
    ) -> AppResult<bool> {
        match check_citations(answer, context.len()) {
            CitationCheck::Missing => {
                tracing::debug!("Answer carries no citation markers");
                return Ok(false);
            }
            CitationCheck::OutOfRange { marker } => {
                tracing::debug!(
                    "Answer cites {} but only {} passages exist",
                    marker,
                    context.len()
                );
                return Ok(false);
            }
            CitationCheck::InRange(indices) => {
                tracing::trace!("Structural check passed for citations {:?}", indices);
            }
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(context));
        vars.insert("answer".to_string(), answer.to_string());

        let raw = self
            .model
            .complete(ids::VERIFY, vars, JUDGMENT_TEMPERATURE)
            .await?;

        let supported = parse_judgment::<SupportVerdict>(&raw).decide(|verdict| {
            if !verdict.unsupported_claims.is_empty() {
                tracing::debug!("Unsupported claims: {:?}", verdict.unsupported_claims);
            }
            verdict.supported
        });

        Ok(supported)
    }
}
