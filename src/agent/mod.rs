//! Agentic query workflow for askweb.
//!
//! Provides the LLM-powered agents that route, research and answer a
//! query, behind a pluggable provider abstraction backed by
//! OpenAI-compatible APIs (Groq by default).
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── ClassifierAgent (math | text | search)
//!   ├── search route: refinement loop, at most max(1, budget) rounds
//!   │   ├── GeneratorAgent → Vec<SearchQuery>
//!   │   ├── WebSearcher → concurrent search + page fetch → Vec<Evidence>
//!   │   └── EvaluatorAgent → Verdict (stop or retry with feedback)
//!   ├── SynthesizerAgent → one or more candidates
//!   └── SelectorAgent → final Answer
//! ```

pub mod classifier;
pub mod client;
pub mod config;
pub mod evaluator;
pub mod generator;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod selector;
pub mod synthesizer;
pub mod traits;

// Re-export key types
pub use classifier::ClassifierAgent;
pub use client::create_provider;
pub use config::AgentConfig;
pub use evaluator::EvaluatorAgent;
pub use generator::GeneratorAgent;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::Orchestrator;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use selector::SelectorAgent;
pub use synthesizer::SynthesizerAgent;
pub use traits::{Agent, AgentResponse};
