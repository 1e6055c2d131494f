//! Candidate answers, the final answer, and the workflow outcome.

use serde::{Deserialize, Serialize};

use super::evidence::{Evidence, RefinementRound};
use super::query::QueryType;

/// A synthesized answer awaiting selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Answer text.
    pub text: String,
    /// Route that produced it.
    pub query_type: QueryType,
    /// Evidence the candidate was grounded on (empty for math and text).
    pub evidence: Vec<Evidence>,
}

impl Candidate {
    /// Creates a candidate with no supporting evidence.
    #[must_use]
    pub fn ungrounded(text: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            text: text.into(),
            query_type,
            evidence: Vec::new(),
        }
    }
}

/// The externally visible answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text.
    pub response: String,
    /// Route that produced it.
    #[serde(rename = "type")]
    pub query_type: QueryType,
}

impl From<Candidate> for Answer {
    fn from(candidate: Candidate) -> Self {
        Self {
            response: candidate.text,
            query_type: candidate.query_type,
        }
    }
}

/// Why the refinement loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopExit {
    /// The query was not routed to search.
    NotSearched,
    /// The evaluator judged the evidence sufficient.
    Sufficient,
    /// The retry budget ran out.
    BudgetExhausted,
    /// Consecutive rounds added no new sources.
    Stagnated,
    /// The evaluator provider failed with no budget left.
    EvaluationUnavailable,
}

/// Full result of one workflow invocation.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    /// Selected answer.
    pub answer: Answer,
    /// Route decided by the classifier.
    pub query_type: QueryType,
    /// Refinement rounds executed (empty unless searched).
    pub rounds: Vec<RefinementRound>,
    /// Evidence passed to synthesis, deduplicated by URL.
    pub evidence: Vec<Evidence>,
    /// Number of candidates the selector chose from.
    pub candidates_considered: usize,
    /// Loop termination reason.
    pub exit: LoopExit,
}

impl WorkflowOutcome {
    /// Number of search queries issued across all rounds.
    #[must_use]
    pub fn queries_issued(&self) -> usize {
        self.rounds.iter().map(|r| r.queries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_wire_format() {
        let answer = Answer::from(Candidate::ungrounded("108", QueryType::Math));
        let json = serde_json::to_value(&answer).unwrap_or_default();
        assert_eq!(json["response"], "108");
        assert_eq!(json["type"], "math");
    }

    #[test]
    fn test_loop_exit_serialization() {
        let json = serde_json::to_string(&LoopExit::BudgetExhausted).unwrap_or_default();
        assert_eq!(json, "\"budget_exhausted\"");
    }
}
