//! Two-phase bounded workflow.
//!
//! ```text
//! RETRIEVE -> GRADE -> (REWRITE -> RETRIEVE)* -> GENERATE -> VERIFY -> (REGENERATE -> VERIFY)* -> FINALIZE
//! ```
//!
//! Phase A corrects retrieval: each failed relevance gate rewrites the query
//! and retrieves again until `max_iterations` rewrites have been spent.
//! Phase B corrects generation: each failed citation check regenerates from
//! the same context until `max_generation_attempts` retries have been spent.
//! Neither gate raises an error; an answer that never verifies is returned
//! behind the soft-fail banner.

use crate::dedup::deduplicate;
use crate::generator::AnswerGenerator;
use crate::grader::RelevanceGrader;
use crate::model::ModelHandle;
use crate::retriever::MultiSourceRetriever;
use crate::rewriter::QueryTransformer;
use crate::sources::SearchBackend;
use crate::types::{Stage, WorkflowState};
use crate::verifier::CitationVerifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use verity_core::{AppError, AppResult, EngineSettings};
use verity_llm::LlmClient;
use verity_prompt::PromptLibrary;

/// External collaborators the controller is wired to.
pub struct EngineDeps {
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
    pub prompts: PromptLibrary,
    pub internal: Arc<dyn SearchBackend>,
    pub web: Arc<dyn SearchBackend>,
}

/// Runs questions through the workflow.
///
/// Holds only shared, read-only clients; concurrent `run` calls never see
/// each other's state.
pub struct Controller {
    settings: EngineSettings,
    retriever: MultiSourceRetriever,
    grader: RelevanceGrader,
    rewriter: QueryTransformer,
    generator: AnswerGenerator,
    verifier: CitationVerifier,
}

impl Controller {
    pub fn new(settings: EngineSettings, deps: EngineDeps) -> AppResult<Self> {
        settings.validate()?;

        let timeout = Duration::from_secs(settings.call_timeout_secs);
        let model = ModelHandle::new(deps.llm, deps.model, Arc::new(deps.prompts), timeout);

        Ok(Self {
            retriever: MultiSourceRetriever::new(
                deps.internal,
                deps.web,
                settings.default_match_count,
                settings.web_result_count,
                timeout,
            ),
            grader: RelevanceGrader::new(model.clone()),
            rewriter: QueryTransformer::new(
                model.clone(),
                settings.rewrite_temperature,
                settings.max_rewrite_words,
            ),
            generator: AnswerGenerator::new(model.clone(), settings.generation_temperature),
            verifier: CitationVerifier::new(model),
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Answer `question`.
    ///
    /// Errors only on infrastructure failures: a transport error, a failed
    /// HTTP status or an elapsed deadline. Quality-gate failures end in a
    /// returned state whose `warning_banner` is set.
    pub async fn run(&self, question: &str) -> AppResult<WorkflowState> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Other("Question cannot be empty".to_string()));
        }

        let span = tracing::info_span!("workflow", question = %question);
        self.drive(WorkflowState::new(question, &self.settings))
            .instrument(span)
            .await
    }

    async fn drive(&self, mut state: WorkflowState) -> AppResult<WorkflowState> {
        let mut stage = Stage::Retrieve;

        loop {
            tracing::debug!("Entering {:?}", stage);
            state.stages.push(stage);

            stage = match stage {
                Stage::Retrieve => {
                    let documents = self.retriever.retrieve(state.current_query()).await?;
                    state.context = deduplicate(documents);
                    Stage::Grade
                }

                Stage::Grade => {
                    state.relevance_ok = self.grader.grade(&state.question, &state.context).await?;

                    if state.relevance_ok {
                        tracing::info!(
                            "Context judged relevant after {} rewrites ({} passages)",
                            state.iteration_count,
                            state.context.len()
                        );
                        Stage::Generate
                    } else if state.iteration_count < state.max_iterations {
                        Stage::Rewrite
                    } else {
                        tracing::info!(
                            "Retrieval bound reached, generating from {} unconfirmed passages",
                            state.context.len()
                        );
                        Stage::Generate
                    }
                }

                Stage::Rewrite => {
                    state.iteration_count += 1;
                    if let Some(query) = self
                        .rewriter
                        .rewrite(&state.question, &state.transformed_queries)
                        .await?
                    {
                        state.transformed_queries.push(query);
                    }
                    Stage::Retrieve
                }

                Stage::Generate | Stage::Regenerate => {
                    if stage == Stage::Regenerate {
                        state.generation_attempts += 1;
                    }
                    state.generation = self
                        .generator
                        .generate(&state.question, &state.context)
                        .await?;
                    Stage::Verify
                }

                Stage::Verify => {
                    state.citations_ok = self
                        .verifier
                        .verify(&state.question, &state.context, &state.generation)
                        .await?;

                    if state.citations_ok {
                        tracing::info!(
                            "Citations verified on attempt {}",
                            state.generation_attempts + 1
                        );
                        Stage::Finalize
                    } else if state.generation_attempts < state.max_generation_attempts {
                        Stage::Regenerate
                    } else {
                        Stage::Finalize
                    }
                }

                Stage::Finalize => {
                    if !state.citations_ok {
                        tracing::warn!(
                            "Returning unverified answer after {} generation attempts",
                            state.generation_attempts + 1
                        );
                        state.warning_banner = self.settings.citation_soft_fail_banner.clone();
                        state.generation = format!("{}{}", state.warning_banner, state.generation);
                    }
                    break;
                }
            };
        }

        Ok(state)
    }
}
