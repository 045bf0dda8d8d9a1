//! DefiLlama proxy
//!
//! Main entry point: HTTP + SSE server, or MCP tool server on stdio

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use llama_core::{ProxyConfig, Transport};
use llama_feed::{DataSource, LlamaFeed};
use llama_server::{HttpServer, ToolServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging; stdout stays free for the stdio transport
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting DefiLlama proxy v{}", env!("CARGO_PKG_VERSION"));

    let config = ProxyConfig::load()?;
    let source: Arc<dyn DataSource> = Arc::new(LlamaFeed::new(&config.upstream)?);

    match config.server.transport {
        Transport::Stdio => {
            ToolServer::new(source).serve_stdio().await?;
        }
        Transport::Http => {
            let server = HttpServer::new(config.server, source);

            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                wait_for_signal().await;
                let _ = shutdown_tx.send(());
            });

            info!("HTTP server listening on {}", server.address());
            info!("Press Ctrl+C to shutdown");

            if let Err(e) = server.start_with_shutdown(shutdown_rx).await {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}
