//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::config::AgentConfigBuilder;
use crate::agent::AgentConfig;

/// askweb: answers questions with math, direct answers, or web search.
///
/// Without a subcommand, starts an interactive query loop.
#[derive(Parser, Debug)]
#[command(name = "askweb")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
  askweb                                    # Interactive loop
  askweb ask "What is 12 * 9?"              # One-shot answer
  askweb --strict ask "Latest Rust release"
  askweb --format json ask "Who wrote Dune?" | jq '.response'
  askweb serve --port 8080                  # HTTP API on POST /ask
  GROQ_API_KEY=gsk-... askweb
"#)]
pub struct Cli {
    /// API key for the completion provider (overrides `GROQ_API_KEY`).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (overrides `GROQ_BASE_URL`).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Default retry budget for the search refinement loop.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Search results fetched per generated query.
    #[arg(long, global = true)]
    pub results_per_query: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<f64>,

    /// Completion model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature for answers.
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Maximum tokens per completion.
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Directory containing prompt template files.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// Use the strict evidence evaluator.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Ground every non-math answer in web search.
    #[arg(long, global = true)]
    pub search_only: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute (interactive loop when omitted).
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single query and exit.
    #[command(after_help = r#"Examples:
  askweb ask "What is 2^10?"
  askweb ask "Compare Rust and Go error handling" --complex
  askweb ask "Current population of Tokyo" --max-retries 1
"#)]
    Ask {
        /// The question to answer.
        query: String,

        /// Treat the query as complex (several candidate answers).
        #[arg(long)]
        complex: bool,
    },

    /// Serve the HTTP API (`POST /ask`, `GET /health`).
    #[cfg(feature = "server")]
    #[command(after_help = r#"Examples:
  askweb serve                              # Listen on 127.0.0.1:5000
  askweb serve --host 0.0.0.0 --port 8080 --deadline 60
"#)]
    Serve {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Per-request deadline in seconds.
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Write default prompt templates to disk for customization.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  askweb init-prompts                       # Write to ~/.config/askweb/prompts/
  askweb init-prompts ./my-prompts          # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/askweb/prompts/`.
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Returns a config builder with CLI flags applied over the environment.
    #[must_use]
    pub fn config_builder(&self) -> AgentConfigBuilder {
        let mut builder = AgentConfig::builder();

        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(n) = self.max_tokens {
            builder = builder.max_tokens(n);
        }
        if let Some(n) = self.max_retries {
            builder = builder.max_retries(n);
        }
        if let Some(n) = self.results_per_query {
            builder = builder.search_results_per_query(n);
        }
        if let Some(secs) = self.timeout.filter(|s| s.is_finite() && *s > 0.0) {
            builder = builder.request_timeout(Duration::from_secs_f64(secs));
        }
        if let Some(dir) = &self.prompt_dir {
            builder = builder.prompt_dir(dir);
        }
        if self.strict {
            builder = builder.strict_evaluation(true);
        }
        if self.search_only {
            builder = builder.direct_answers(false);
        }
        if self.debug {
            builder = builder.debug(true);
        }

        builder.from_env()
    }
}
