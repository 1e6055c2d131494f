//! CLI layer for askweb.
//!
//! Provides the command-line interface using clap: an interactive loop,
//! one-shot queries, the HTTP server and prompt scaffolding.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, run_session};
pub use output::{OutputFormat, format_outcome};
pub use parser::{Cli, Commands};
