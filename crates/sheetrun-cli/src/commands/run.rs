//! `sheetrun run` command.
//!
//! Runs a script file through the same pipeline as `POST /execute` and
//! writes the workbook locally, or prints the diagnostic payload.

use std::path::{Path, PathBuf};

use clap::Args;

use sheetrun_config::SheetrunConfig;
use sheetrun_runtime::ExecutionResponse;
use sheetrun_transport_http::ARTIFACT_FILENAME;
use sheetrun_types::{ErrorKind, ExecuteRequestBody, FailurePayload};

use crate::output;
use crate::shared::{self, LimitArgs};

/// Run a script file and write its workbook.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the script file.
    pub script: PathBuf,
    /// Where to write the workbook.
    #[arg(short, long, default_value = ARTIFACT_FILENAME)]
    pub output: PathBuf,
    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Executes the run command.
pub async fn execute(args: &RunArgs, mut config: SheetrunConfig) -> anyhow::Result<()> {
    args.limits.apply(&mut config);
    let request = ExecuteRequestBody {
        script: Some(read_script(&args.script)?),
    }
    .into_request()
    .map_err(|e| anyhow::anyhow!("{}", e.message))?;
    let service = shared::create_service(&config)?;

    tracing::info!(script = %args.script.display(), "running script");

    match service.execute(request).await {
        ExecutionResponse::Artifact(bytes) => {
            std::fs::write(&args.output, &bytes).map_err(|e| {
                anyhow::anyhow!("cannot write {}: {e}", args.output.display())
            })?;
            output::print_success(&format!(
                "wrote {} ({} bytes)",
                args.output.display(),
                bytes.len()
            ));
            Ok(())
        }
        ExecutionResponse::Failure { payload, kind } => {
            report_failure(&payload, kind)?;
            anyhow::bail!("execution failed")
        }
        ExecutionResponse::Rejected(e) => anyhow::bail!("{}", e.message),
    }
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("script not found: {}", path.display());
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))
}

fn report_failure(payload: &FailurePayload, kind: ErrorKind) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    output::print_error(&payload.error);
    if let Some(hint) = failure_hint(kind) {
        eprintln!("\n  Cause: {hint}\n");
    }
    Ok(())
}

fn failure_hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::ScriptEvaluation => {
            Some("The script raised an error; the traceback points at the failing line.")
        }
        ErrorKind::ArtifactContract => {
            Some("The script finished without calling save(output_path) on a workbook.")
        }
        ErrorKind::ArtifactRead | ErrorKind::Internal => {
            Some("The host failed while handling the artifact; retry with -v for details.")
        }
        ErrorKind::ClientInput => None,
    }
}
