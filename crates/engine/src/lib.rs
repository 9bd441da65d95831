//! Verity Engine
//!
//! Self-correcting retrieval and generation. A question is answered by
//! retrieving passages from an internal and a web search backend, gating
//! them for relevance (rewriting the query and retrying within a bound),
//! generating a cited answer and verifying its citations (regenerating
//! within a bound). Unverified answers come back behind a soft-fail banner
//! instead of an error.
//!
//! ```no_run
//! # async fn demo() -> verity_core::AppResult<()> {
//! let config = verity_core::AppConfig::load()?;
//! config.init_logging()?;
//! let controller = verity_engine::build_controller(&config)?;
//! let state = controller.run("What is the revenue goal?").await?;
//! println!("{}", state.generation);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod dedup;
pub mod factory;
pub mod generator;
pub mod grader;
pub mod judgment;
pub mod model;
pub mod retriever;
pub mod rewriter;
pub mod sources;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use controller::{Controller, EngineDeps};
pub use dedup::deduplicate;
pub use factory::build_controller;
pub use generator::AnswerGenerator;
pub use grader::{RelevanceGrader, RelevanceVerdict};
pub use judgment::{parse_judgment, Judgment};
pub use retriever::MultiSourceRetriever;
pub use rewriter::QueryTransformer;
pub use sources::{InternalSearch, SearchBackend, StaticSearchBackend, WebSearch};
pub use types::{SearchHit, SourceDocument, SourceRef, SourceType, Stage, WorkflowState};
pub use verifier::{check_citations, CitationCheck, CitationVerifier, SupportVerdict};
