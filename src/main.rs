//! askweb binary entry point.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use askweb::cli::{Cli, execute};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.debug || debug_from_env());

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                print!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = anyhow::Error::from(e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` wins over the debug flag.
fn init_tracing(debug: bool) {
    let default_level = if debug { "askweb=debug,info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn debug_from_env() -> bool {
    std::env::var("DEBUG_MODE").is_ok_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
