//! sheetrun CLI - untrusted script to spreadsheet executor.

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;
mod output;
pub(crate) mod shared;

/// sheetrun - run untrusted scripts that build xlsx workbooks.
#[derive(Debug, Parser)]
#[command(name = "sheetrun", version, about)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format: plain (default) or json (for log aggregation).
    #[arg(long, global = true, default_value = "plain", value_parser = ["plain", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the HTTP server exposing POST /execute.
    Serve(commands::serve::ServeArgs),
    /// Run a script file locally and write its workbook.
    Run(commands::run::RunArgs),
    /// List every name scripts can reach.
    Capabilities(commands::capabilities::CapabilitiesArgs),
}

/// Picks the log filter: `-v` flags win over `logging.level`.
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = shared::load(cli.config.as_deref())?;

    let filter = log_filter(cli.verbose, &config.logging.level);
    match cli.log_format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    };

    tracing::debug!("sheetrun starting with config: {:?}", cli.config);

    match &cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Run(args) => commands::run::execute(args, config).await,
        Commands::Capabilities(args) => commands::capabilities::execute(args),
    }
}
