//! # askweb
//!
//! Query-routing web search assistant.
//!
//! Each query is classified as math, text or search. Math is evaluated
//! locally, text is answered directly, and search queries run a
//! refinement loop: generate search queries, fetch pages, ask an
//! evaluator whether the evidence suffices, and retry with feedback until
//! it does or the budget runs out. The evidence is then synthesized into
//! one or more candidate answers and the best one is selected.
//!
//! ## Modules
//!
//! - [`core`]: domain values and the arithmetic evaluator
//! - [`agent`]: LLM provider, prompts, the five agents and the orchestrator
//! - [`search`]: search engine, page fetcher and the concurrent searcher
//! - [`cli`]: command-line interface
//! - `server`: HTTP interface (`server` feature)
//!
//! ## Example
//!
//! ```no_run
//! use askweb::agent::{AgentConfig, Orchestrator};
//! use askweb::core::Query;
//!
//! # async fn run() -> askweb::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(config)?;
//! let outcome = orchestrator.answer(&Query::new("What is 12 * 9?")?).await?;
//! assert_eq!(outcome.answer.response, "108");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod search;
#[cfg(feature = "server")]
pub mod server;

pub use crate::core::{Answer, Query, QueryType, WorkflowOutcome};
pub use error::{Error, Result};
