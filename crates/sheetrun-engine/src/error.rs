//! Engine-specific error types.

use sheetrun_sandbox::SandboxError;
use sheetrun_types::{DiagnosticError, ErrorKind, ExecutionOutcome, SheetrunError};
use thiserror::Error;

/// Errors from one sandboxed evaluation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The script body was empty.
    #[error("script is empty")]
    EmptyScript,
    /// The output path was already taken before the script ran.
    #[error("output path already exists: {path}")]
    OutputExists { path: String },
    /// The per-call limits are unusable.
    #[error("invalid execution limits: {0}")]
    InvalidLimits(#[from] SandboxError),
    /// The script failed to parse or raised during evaluation.
    #[error("execution failed: {message}")]
    Script { message: String, trace: String },
    /// The script was stopped by an execution limit.
    #[error("execution terminated: {reason}")]
    Terminated { reason: String, trace: String },
    /// The script completed without writing its artifact.
    #[error("script completed without producing the expected artifact")]
    MissingArtifact { path: String },
}

impl EngineError {
    /// Diagnostic trace pointing into the script, when there is one.
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::Script { trace, .. } | Self::Terminated { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// Domain classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyScript => ErrorKind::ClientInput,
            Self::Script { .. } | Self::Terminated { .. } => ErrorKind::ScriptEvaluation,
            Self::MissingArtifact { .. } => ErrorKind::ArtifactContract,
            Self::OutputExists { .. } | Self::InvalidLimits(_) => ErrorKind::Internal,
        }
    }

    /// Converts into the failure outcome reported to the caller.
    pub fn into_outcome(self) -> ExecutionOutcome {
        let trace = self.trace().map(str::to_string);
        ExecutionOutcome::failure(self.to_string(), trace)
    }
}

impl From<EngineError> for SheetrunError {
    fn from(e: EngineError) -> Self {
        SheetrunError::new(e.kind(), e.to_string())
    }
}

impl DiagnosticError for EngineError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Script { .. } => {
                Some("The script raised an error; see the trace for the failing line.".into())
            }
            Self::Terminated { .. } => {
                Some("The script exceeded the execution budget configured for the sandbox.".into())
            }
            Self::MissingArtifact { .. } => Some(
                "The script finished without saving a workbook to `output_path`.".into(),
            ),
            Self::EmptyScript => Some("No script text was supplied.".into()),
            Self::OutputExists { .. } | Self::InvalidLimits(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::MissingArtifact { .. } => Some(
                "End the script with:\n  wb.save(output_path);".into(),
            ),
            Self::Terminated { .. } => Some(
                "Raise the limit in the config:\n  [sandbox]\n  max_operations = 10000000\n  timeout_ms = 30000"
                    .into(),
            ),
            Self::InvalidLimits(e) => e.fix(),
            _ => None,
        }
    }
}
