//! HTTP server that binds an axum Router to a TCP socket.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use sheetrun_runtime::ExecutionService;

use crate::error::HttpTransportError;
use crate::router::{build_router, AppState};

/// Axum-based HTTP server for the execution transport.
pub struct HttpServer {
    pub(crate) addr: SocketAddr,
    pub(crate) state: AppState,
}

impl HttpServer {
    /// Creates a new HTTP server.
    ///
    /// # Arguments
    ///
    /// * `service` - shared execution orchestrator
    /// * `host` - IP address to bind
    /// * `port` - TCP port to listen on
    /// * `token` - optional Bearer token for authentication
    ///
    /// # Errors
    ///
    /// Returns `HttpTransportError::InvalidAddress` if `host` is not an IP
    /// address.
    pub fn new(
        service: Arc<ExecutionService>,
        host: &str,
        port: u16,
        token: Option<String>,
    ) -> Result<Self, HttpTransportError> {
        let raw = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        let addr = raw
            .parse::<SocketAddr>()
            .map_err(|_| HttpTransportError::InvalidAddress { addr: raw })?;
        Ok(Self {
            addr,
            state: AppState { service, token },
        })
    }

    /// The address the server will bind.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Starts the server and blocks until Ctrl-C, then drains in-flight
    /// executions.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP bind fails or the server crashes.
    pub async fn run(self) -> Result<(), HttpTransportError> {
        let listener =
            TcpListener::bind(self.addr)
                .await
                .map_err(|e| HttpTransportError::Bind {
                    addr: self.addr.to_string(),
                    source: e,
                })?;

        tracing::info!(
            addr = %self.addr,
            auth = self.state.token.is_some(),
            "sheetrun HTTP server ready"
        );

        let service = Arc::clone(&self.state.service);
        let router = build_router(self.state);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| HttpTransportError::Serve(e.to_string()))?;

        service.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
