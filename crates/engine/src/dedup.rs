//! Order-preserving deduplication of retrieved passages.
//!
//! Two passages are the same when they share `(url, normalized content)`.
//! Normalization collapses whitespace runs and trims both ends, so the same
//! passage re-wrapped by a different backend still collapses.

use crate::types::SourceDocument;
use std::collections::HashSet;

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity used for deduplication.
pub fn dedup_key(doc: &SourceDocument) -> (String, String) {
    (doc.url.clone(), normalize_content(&doc.content))
}

/// Keep the first occurrence of each identity, preserving relative order.
pub fn deduplicate(documents: Vec<SourceDocument>) -> Vec<SourceDocument> {
    let before = documents.len();
    let mut seen = HashSet::with_capacity(before);

    let unique: Vec<SourceDocument> = documents
        .into_iter()
        .filter(|doc| seen.insert(dedup_key(doc)))
        .collect();

    if unique.len() < before {
        tracing::debug!("Deduplicated {} passages into {}", before, unique.len());
    }

    unique
}
