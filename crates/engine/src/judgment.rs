//! Best-effort parsing of model judgments.
//!
//! Judgment calls are asked for a small JSON object, but models wrap it in
//! prose or code fences, or ignore the format entirely. Parsing never fails:
//! the outcome is either [`Judgment::Parsed`] or [`Judgment::Unparseable`],
//! and callers map `Unparseable` to their conservative default.

use serde::de::DeserializeOwned;

/// Outcome of interpreting raw model text as a structured verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Judgment<T> {
    Parsed(T),
    Unparseable,
}

impl<T> Judgment<T> {
    /// Apply `decide` to a parsed verdict; an unparseable one is always `false`.
    pub fn decide(self, decide: impl FnOnce(T) -> bool) -> bool {
        match self {
            Judgment::Parsed(verdict) => decide(verdict),
            Judgment::Unparseable => false,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Judgment::Parsed(_))
    }
}

/// Parse `raw` strictly, then fall back to its first brace-delimited fragment.
pub fn parse_judgment<T: DeserializeOwned>(raw: &str) -> Judgment<T> {
    if let Ok(verdict) = serde_json::from_str::<T>(raw.trim()) {
        return Judgment::Parsed(verdict);
    }

    if let Some(fragment) = first_object(raw) {
        if let Ok(verdict) = serde_json::from_str::<T>(fragment) {
            return Judgment::Parsed(verdict);
        }
    }

    tracing::debug!("Judgment could not be parsed: {:?}", raw);
    Judgment::Unparseable
}

/// The first balanced `{...}` span in `text`, honoring JSON string escapes.
pub fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
