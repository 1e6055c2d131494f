//! Orchestrator for the query-routing workflow.
//!
//! Coordinates the full pipeline: classify → (math | text | search
//! refinement loop) → synthesize → select. The orchestrator is immutable
//! after construction and can be shared across concurrent requests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::classifier::ClassifierAgent;
use super::client::create_provider;
use super::config::AgentConfig;
use super::evaluator::EvaluatorAgent;
use super::generator::GeneratorAgent;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::selector::SelectorAgent;
use super::synthesizer::SynthesizerAgent;
use crate::core::{
    Answer, Evidence, LoopExit, Query, QueryType, RefinementRound, Verdict, WorkflowOutcome,
    dedup_by_url,
};
use crate::error::{AgentError, WorkflowError};
use crate::search::{DuckDuckGoEngine, HttpPageFetcher, PageFetcher, SearchEngine, WebSearcher};

/// Workflow stage, used as a structured logging field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Classifying,
    Generating,
    Searching,
    Evaluating,
    Synthesizing,
    Selecting,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Classifying => "classifying",
            Self::Generating => "generating",
            Self::Searching => "searching",
            Self::Evaluating => "evaluating",
            Self::Synthesizing => "synthesizing",
            Self::Selecting => "selecting",
        })
    }
}

/// Evidence gathered by the refinement loop.
struct Gathered {
    rounds: Vec<RefinementRound>,
    evidence: Vec<Evidence>,
    exit: LoopExit,
}

/// Orchestrates the query workflow.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    searcher: WebSearcher,
    classifier: ClassifierAgent,
    generator: GeneratorAgent,
    evaluator: EvaluatorAgent,
    synthesizer: SynthesizerAgent,
    selector: SelectorAgent,
    config: AgentConfig,
}

impl Orchestrator {
    /// Creates a new orchestrator over the given collaborators.
    ///
    /// Loads prompt templates from [`AgentConfig::prompt_dir`], falling back
    /// to compiled-in defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        engine: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, engine, fetcher, config, &prompts)
    }

    /// Creates a new orchestrator with an explicit prompt set.
    #[must_use]
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        engine: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        config: AgentConfig,
        prompts: &PromptSet,
    ) -> Self {
        let evaluator_prompt = if config.strict_evaluation {
            prompts.strict_evaluator.clone()
        } else {
            prompts.evaluator.clone()
        };

        Self {
            searcher: WebSearcher::new(engine, fetcher, &config),
            classifier: ClassifierAgent::new(&config, prompts.classifier.clone()),
            generator: GeneratorAgent::new(&config, prompts.generator.clone()),
            evaluator: EvaluatorAgent::new(&config, evaluator_prompt),
            synthesizer: SynthesizerAgent::new(&config, prompts),
            selector: SelectorAgent::new(&config, prompts.selector.clone()),
            provider,
            config,
        }
    }

    /// Creates an orchestrator with the configured provider, the DuckDuckGo
    /// engine and the HTTP page fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error`] if the provider is unsupported or an HTTP
    /// client cannot be built.
    pub fn from_config(config: AgentConfig) -> crate::Result<Self> {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
        let engine = Arc::new(DuckDuckGoEngine::new(config.request_timeout)?);
        let fetcher = Arc::new(HttpPageFetcher::new(
            config.request_timeout,
            config.max_content_length,
        )?);
        Ok(Self::new(provider, engine, fetcher, config))
    }

    /// Returns the configuration this orchestrator was built with.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answers a query, bounded by `deadline`.
    ///
    /// Expiry drops the workflow future, aborting in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TimedOut`] when the deadline elapses, or any
    /// error from [`Self::answer`].
    pub async fn answer_within(
        &self,
        query: &Query,
        deadline: Duration,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        tokio::time::timeout(deadline, self.answer(query))
            .await
            .map_err(|_| WorkflowError::TimedOut { after: deadline })?
    }

    /// Executes the full workflow for one query.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Synthesis`] when no candidate answer could be
    /// produced. Every other failure degrades gracefully.
    pub async fn answer(&self, query: &Query) -> Result<WorkflowOutcome, WorkflowError> {
        self.answer_with_progress(query, &|_: &RefinementRound| {}).await
    }

    /// Executes the workflow, calling `on_round` as each refinement round
    /// finishes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::answer`].
    pub async fn answer_with_progress(
        &self,
        query: &Query,
        on_round: &(dyn Fn(&RefinementRound) + Send + Sync),
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let start = Instant::now();
        let provider = &*self.provider;

        tracing::debug!(stage = %Stage::Classifying, "workflow started");
        let query_type = self.classifier.classify(provider, query).await;
        tracing::info!(query_type = query_type.as_str(), "query classified");

        let gathered = if query_type == QueryType::Search {
            self.refine(query, on_round).await
        } else {
            Gathered {
                rounds: Vec::new(),
                evidence: Vec::new(),
                exit: LoopExit::NotSearched,
            }
        };

        tracing::debug!(
            stage = %Stage::Synthesizing,
            evidence = gathered.evidence.len(),
            "synthesizing"
        );
        let candidates = self
            .synthesizer
            .synthesize(provider, query, query_type, &gathered.evidence)
            .await?;
        let candidates_considered = candidates.len();

        tracing::debug!(stage = %Stage::Selecting, candidates = candidates_considered, "selecting");
        let selected = self
            .selector
            .select(provider, query, candidates)
            .await
            .ok_or(WorkflowError::Synthesis {
                source: AgentError::EmptyResponse { agent: "synthesizer" },
            })?;

        tracing::info!(
            query_type = query_type.as_str(),
            rounds = gathered.rounds.len(),
            evidence = gathered.evidence.len(),
            exit = ?gathered.exit,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "workflow complete"
        );

        Ok(WorkflowOutcome {
            answer: Answer::from(selected),
            query_type,
            rounds: gathered.rounds,
            evidence: gathered.evidence,
            candidates_considered,
            exit: gathered.exit,
        })
    }

    /// Runs the generate → search → evaluate loop.
    ///
    /// Runs at least one and at most `max(1, budget)` rounds. Stops early on
    /// a sufficient verdict, an unavailable evaluator, or after
    /// `stagnation_limit` consecutive rounds without a new source.
    async fn refine(
        &self,
        query: &Query,
        on_round: &(dyn Fn(&RefinementRound) + Send + Sync),
    ) -> Gathered {
        let provider = &*self.provider;
        let budget = query.effective_retries(self.config.max_retries).max(1);
        let stagnation_limit = self.config.stagnation_limit.max(1);

        let mut rounds: Vec<RefinementRound> = Vec::new();
        let mut accumulated: Vec<Evidence> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut stale_rounds: u32 = 0;
        let mut exit = LoopExit::BudgetExhausted;

        for index in 0..budget {
            tracing::debug!(stage = %Stage::Generating, round = index, "generating queries");
            let queries = self.generator.generate(provider, query, &rounds).await;

            tracing::debug!(
                stage = %Stage::Searching,
                round = index,
                queries = queries.len(),
                "searching"
            );
            let evidence = self.searcher.search(&queries).await;

            let new_evidence = evidence
                .iter()
                .filter(|e| seen_urls.insert(e.url.clone()))
                .count();
            accumulated.extend(evidence.iter().cloned());
            stale_rounds = if new_evidence == 0 {
                stale_rounds + 1
            } else {
                0
            };

            let budget_remaining = index + 1 < budget;
            tracing::debug!(stage = %Stage::Evaluating, round = index, "evaluating evidence");
            let verdict = self
                .evaluator
                .evaluate(
                    provider,
                    query,
                    &dedup_by_url(&accumulated),
                    budget_remaining,
                )
                .await;

            tracing::info!(
                round = index,
                queries = queries.len(),
                evidence = evidence.len(),
                new_evidence,
                sufficient = verdict.is_sufficient(),
                "round complete"
            );

            let stop = match &verdict {
                Verdict::Sufficient => Some(LoopExit::Sufficient),
                Verdict::Unavailable { .. } => Some(LoopExit::EvaluationUnavailable),
                Verdict::Insufficient { .. } if !budget_remaining => {
                    Some(LoopExit::BudgetExhausted)
                }
                Verdict::Insufficient { .. } if stale_rounds >= stagnation_limit => {
                    tracing::warn!(round = index, stale_rounds, "no new sources, stopping");
                    Some(LoopExit::Stagnated)
                }
                Verdict::Insufficient { .. } => None,
            };

            let round = RefinementRound {
                index,
                queries,
                evidence,
                new_evidence,
                verdict,
            };
            on_round(&round);
            rounds.push(round);

            if let Some(reason) = stop {
                exit = reason;
                break;
            }
        }

        Gathered {
            rounds,
            evidence: dedup_by_url(&accumulated),
            exit,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("searcher", &self.searcher)
            .field("model", &self.config.model)
            .field("max_retries", &self.config.max_retries)
            .finish_non_exhaustive()
    }
}
