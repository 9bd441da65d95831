//! Search capabilities the retriever draws from.
//!
//! The engine consumes two independent instances of [`SearchBackend`]: the
//! internal structured search and the external web search. Their ranking is
//! their own business; the engine only maps hits into passages.

pub mod fixed;
pub mod internal;
pub mod web;

pub use fixed::StaticSearchBackend;
pub use internal::InternalSearch;
pub use web::WebSearch;

use crate::types::SearchHit;
use verity_core::AppResult;

/// A search capability: `search(query, limit) -> hits`.
///
/// Implementations are shared across concurrently running questions.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return at most `limit` hits for `query`.
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>>;
}
