//! HTTP listener with graceful shutdown.

use super::routes::AskServer;

/// Serves the `/ask` API on `host:port` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener fails to bind or the server fails.
pub async fn serve_http(server: AskServer, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = tcp_listener.local_addr()?;

    tracing::info!(addr = %local, "askweb server listening");
    #[allow(clippy::print_stderr)]
    {
        eprintln!("askweb listening on http://{local} (POST /ask, GET /health)");
    }

    axum::serve(tcp_listener, server.router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
