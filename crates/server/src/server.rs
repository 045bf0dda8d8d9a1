//! HTTP server configuration and startup

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use llama_core::ServerConfig;
use llama_feed::DataSource;

use crate::routes::{create_router, AppState};

/// How long shutdown waits for open connections to finish
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// HTTP server wrapper
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: ServerConfig, source: Arc<dyn DataSource>) -> Self {
        let state = AppState::new(source, config.push_interval());
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = self.address().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Starting HTTP server on {}", addr);

        self.serve(listener, async {
            shutdown.await.ok();
            info!("Shutdown signal received");
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves.
    ///
    /// Idle HTTP/1 keep-alive connections are closed once no new request
    /// header arrives within the configured keep-alive timeout. On shutdown
    /// every open connection is asked to close after its in-flight response,
    /// and at most `SHUTDOWN_GRACE` is spent waiting for them. Open `/sse`
    /// streams never finish on their own and are dropped at the deadline.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let app = self.router();
        let keep_alive_timeout = self.config.keep_alive_timeout();
        let (signal_tx, signal_rx) = watch::channel(());
        let (close_tx, close_rx) = watch::channel(());
        tokio::pin!(shutdown);

        loop {
            let (stream, remote) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Accept error: {}", e);
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };

            let service = TowerToHyperService::new(app.clone());
            let mut signal_rx = signal_rx.clone();
            let close_rx = close_rx.clone();

            tokio::spawn(async move {
                let mut builder = Builder::new(TokioExecutor::new());
                builder
                    .http1()
                    .keep_alive(true)
                    .timer(TokioTimer::new())
                    .header_read_timeout(keep_alive_timeout);

                let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
                tokio::pin!(conn);

                let result = tokio::select! {
                    result = conn.as_mut() => result,
                    _ = signal_rx.changed() => {
                        conn.as_mut().graceful_shutdown();
                        conn.as_mut().await
                    }
                };

                if let Err(e) = result {
                    debug!(%remote, "Connection closed: {}", e);
                }
                drop(close_rx);
            });
        }

        drop(listener);
        let _ = signal_tx.send(());
        drop(close_rx);

        info!(
            open = close_tx.receiver_count(),
            "HTTP server stopped accepting connections, draining"
        );
        if tokio::time::timeout(SHUTDOWN_GRACE, close_tx.closed()).await.is_err() {
            warn!(
                open = close_tx.receiver_count(),
                "Connections still open after shutdown grace period"
            );
        }
        Ok(())
    }

    /// Get server address
    pub fn address(&self) -> String {
        self.config.address()
    }
}

/// Builder for server configuration
pub struct HttpServerBuilder {
    config: ServerConfig,
}

impl HttpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.config.keep_alive_timeout_secs = timeout.as_secs();
        self
    }

    pub fn push_interval(mut self, interval: Duration) -> Self {
        self.config.push_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn build(self, source: Arc<dyn DataSource>) -> HttpServer {
        HttpServer::new(self.config, source)
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
