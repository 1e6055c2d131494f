//! Output formatting for CLI commands.

use serde::Serialize;
use std::fmt::Write as _;

use crate::core::{LoopExit, WorkflowOutcome};

/// CLI output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, defaulting to text for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as JSON, falling back to `{}`.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// JSON view of a workflow outcome.
#[derive(Serialize)]
struct OutcomeView<'a> {
    response: &'a str,
    #[serde(rename = "type")]
    query_type: &'static str,
    rounds: usize,
    queries: Vec<&'a str>,
    sources: Vec<&'a str>,
    candidates: usize,
    exit: LoopExit,
}

/// Formats a workflow outcome.
///
/// Text output is the answer alone unless `verbose`, which appends a
/// one-line summary and the source URLs.
#[must_use]
pub fn format_outcome(outcome: &WorkflowOutcome, format: OutputFormat, verbose: bool) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = outcome.answer.response.clone();
            if verbose {
                let _ = write!(
                    output,
                    "\n\n---\nType: {} | Rounds: {} | Queries: {} | Sources: {} | Candidates: {} | Exit: {}",
                    outcome.query_type.as_str(),
                    outcome.rounds.len(),
                    outcome.queries_issued(),
                    outcome.evidence.len(),
                    outcome.candidates_considered,
                    exit_label(outcome.exit),
                );
                for evidence in &outcome.evidence {
                    let _ = write!(output, "\n  {}", evidence.url);
                }
            }
            output
        }
        OutputFormat::Json => {
            let view = OutcomeView {
                response: &outcome.answer.response,
                query_type: outcome.query_type.as_str(),
                rounds: outcome.rounds.len(),
                queries: outcome
                    .rounds
                    .iter()
                    .flat_map(|r| r.queries.iter().map(|q| q.as_str()))
                    .collect(),
                sources: outcome.evidence.iter().map(|e| e.url.as_str()).collect(),
                candidates: outcome.candidates_considered,
                exit: outcome.exit,
            };
            format.to_json(&view)
        }
    }
}

const fn exit_label(exit: LoopExit) -> &'static str {
    match exit {
        LoopExit::NotSearched => "not searched",
        LoopExit::Sufficient => "sufficient",
        LoopExit::BudgetExhausted => "budget exhausted",
        LoopExit::Stagnated => "no new sources",
        LoopExit::EvaluationUnavailable => "evaluator unavailable",
    }
}
