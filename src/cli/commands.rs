//! CLI command implementations.
//!
//! Each command builds its own tokio runtime as the sync/async bridge.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::agent::prompt::PromptSet;
use crate::agent::{AgentConfig, Orchestrator};
use crate::cli::output::{OutputFormat, format_outcome};
use crate::cli::parser::{Cli, Commands};
use crate::core::{Query, RefinementRound};
use crate::error::{CommandError, Result, WorkflowError};

const WELCOME: &str = "askweb: ask anything. Type 'quit' or 'exit' to leave.\n";
const PROMPT: &str = "❖ Query: ";
const GOODBYE: &str = "Goodbye!\n";

/// Grace period for the stdin reader thread at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success (empty for streaming commands).
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        None => cmd_interactive(cli, format),
        Some(Commands::Ask { query, complex }) => cmd_ask(cli, query, *complex, format),
        #[cfg(feature = "server")]
        Some(Commands::Serve {
            host,
            port,
            deadline,
        }) => cmd_serve(cli, host, *port, *deadline),
        Some(Commands::InitPrompts { dir }) => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Builds the agent configuration from flags and environment.
fn build_config(cli: &Cli) -> Result<AgentConfig> {
    cli.config_builder().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Answers one query, cancelling it on Ctrl-C.
fn cmd_ask(cli: &Cli, text: &str, complex: bool, format: OutputFormat) -> Result<String> {
    let mut query = Query::new(text)?;
    if complex {
        query = query.with_complex(true);
    }

    let orchestrator = Orchestrator::from_config(build_config(cli)?)?;
    let rt = runtime()?;

    let outcome = rt.block_on(async {
        tokio::select! {
            result = orchestrator.answer(&query) => result,
            _ = tokio::signal::ctrl_c() => Err(WorkflowError::Cancelled),
        }
    })?;

    let verbose = orchestrator.config().debug;
    Ok(format!("{}\n", format_outcome(&outcome, format, verbose)))
}

/// Runs the interactive loop on stdin/stdout.
fn cmd_interactive(cli: &Cli, format: OutputFormat) -> Result<String> {
    let orchestrator = Orchestrator::from_config(build_config(cli)?)?;
    let rt = runtime()?;

    let result = rt.block_on(run_session(
        &orchestrator,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        format,
    ));
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    result?;

    Ok(String::new())
}

/// Reads queries line by line and writes one answer (or error) per query.
///
/// Each search round that ends without enough evidence is reported as
/// `✗ Attempt N: reason` while the query is still running. `quit`, `exit`,
/// end of input and Ctrl-C while waiting all end the session. Ctrl-C during
/// a query cancels only that query.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn run_session<R, W>(
    orchestrator: &Orchestrator,
    reader: R,
    mut writer: W,
    format: OutputFormat,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let verbose = orchestrator.config().debug;
    let mut lines = reader.lines();
    writer.write_all(WELCOME.as_bytes()).await?;

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                writer.write_all(b"\n").await?;
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = match Query::new(text) {
            Ok(query) => {
                let (tx, mut progress) = mpsc::unbounded_channel();
                let report = move |round: &RefinementRound| {
                    if let Some(line) = attempt_line(round) {
                        let _ = tx.send(line);
                    }
                };
                let work = orchestrator.answer_with_progress(&query, &report);
                tokio::pin!(work);

                let result = loop {
                    tokio::select! {
                        result = &mut work => break result,
                        Some(line) = progress.recv() => writer.write_all(line.as_bytes()).await?,
                        _ = tokio::signal::ctrl_c() => break Err(WorkflowError::Cancelled),
                    }
                };
                while let Ok(line) = progress.try_recv() {
                    writer.write_all(line.as_bytes()).await?;
                }

                match result {
                    Ok(outcome) => format!("⌾ {}\n", format_outcome(&outcome, format, verbose)),
                    Err(e) => {
                        tracing::debug!(error = %e, "query failed");
                        format!("✗ {e}\n")
                    }
                }
            }
            Err(e) => format!("✗ {e}\n"),
        };
        writer.write_all(reply.as_bytes()).await?;
    }

    writer.write_all(GOODBYE.as_bytes()).await?;
    writer.flush().await
}

/// Progress line for a round that did not settle the query.
fn attempt_line(round: &RefinementRound) -> Option<String> {
    let reason = round.verdict.reason()?;
    Some(format!("✗ Attempt {}: {reason}\n", round.index + 1))
}

/// Serves the HTTP API until Ctrl-C.
#[cfg(feature = "server")]
fn cmd_serve(cli: &Cli, host: &str, port: u16, deadline: Option<u64>) -> Result<String> {
    use crate::agent::config::DEFAULT_REQUEST_DEADLINE_SECS;
    use crate::server::{AskServer, serve_http};

    let config = cli.config_builder().build();
    let deadline = deadline
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .or_else(|| config.as_ref().ok().map(|c| c.request_deadline))
        .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_DEADLINE_SECS));

    let rt = runtime()?;
    rt.block_on(async {
        let server = AskServer::from_config(config, deadline)?;
        serve_http(server, host, port)
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("HTTP server error: {e}")))?;
        Ok::<(), crate::Error>(())
    })?;

    Ok(String::new())
}

/// Writes the default prompt templates.
fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text if written.is_empty() => Ok(format!(
            "All prompt templates already exist in: {}\n",
            target_dir.display()
        )),
        OutputFormat::Text => {
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown"));
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize agent system prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}
