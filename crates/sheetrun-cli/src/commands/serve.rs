//! `sheetrun serve` command.
//!
//! Starts the HTTP server exposing `POST /execute`, `GET /health` and
//! `GET /health/ready`.

use clap::Args;

use sheetrun_config::SheetrunConfig;
use sheetrun_transport_http::HttpServer;

use crate::shared::{self, LimitArgs};

/// Start the HTTP server.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind address (defaults to `server.host`).
    #[arg(long)]
    pub host: Option<String>,
    /// TCP port (defaults to `server.port`, or `PORT`).
    #[arg(long)]
    pub port: Option<u16>,
    /// Bearer token required on /execute (optional).
    #[arg(long)]
    pub token: Option<String>,
    /// Maximum concurrent executions; 0 means unbounded.
    #[arg(long)]
    pub concurrency: Option<usize>,
    #[command(flatten)]
    pub limits: LimitArgs,
}

impl ServeArgs {
    /// Writes any given flag into `config`.
    fn apply(&self, config: &mut SheetrunConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(token) = &self.token {
            config.server.token = Some(token.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.runtime.max_concurrent = concurrency;
        }
        self.limits.apply(config);
    }
}

/// Executes the serve command.
pub async fn execute(args: &ServeArgs, mut config: SheetrunConfig) -> anyhow::Result<()> {
    args.apply(&mut config);
    let service = shared::create_service(&config)?;

    let server = HttpServer::new(
        service,
        &config.server.host,
        config.server.port,
        config.server.token.clone(),
    )
    .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    tracing::info!(addr = %server.addr(), "starting sheetrun");
    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}
