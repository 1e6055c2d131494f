//! Core domain types shared by the agents, the searcher and the interfaces.

pub mod answer;
pub mod arithmetic;
pub mod evidence;
pub mod query;

pub use answer::{Answer, Candidate, LoopExit, WorkflowOutcome};
pub use arithmetic::CalcError;
pub use evidence::{
    Evidence, RefinementRound, SearchQuery, SearchResult, Verdict, dedup_by_url, truncate_text,
};
pub use query::{MAX_QUERY_LEN, Query, QueryType};
