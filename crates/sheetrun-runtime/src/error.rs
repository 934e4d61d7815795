//! Runtime-specific error types.

use sheetrun_engine::EngineError;
use sheetrun_types::{DiagnosticError, ErrorKind, ExecutionOutcome, SheetrunError};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::state::RequestState;

/// Errors from the request orchestrator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Script evaluation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Artifact allocation, read or removal failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// The blocking worker panicked or was cancelled.
    #[error("execution worker crashed: {reason}")]
    WorkerCrashed { reason: String },
    /// The scheduler no longer accepts work.
    #[error("runtime is shutting down")]
    SchedulerClosed,
    /// A lifecycle step was skipped or reversed.
    #[error("invalid request state transition: {from} -> {to}")]
    InvalidTransition { from: RequestState, to: RequestState },
}

impl RuntimeError {
    /// Domain classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Engine(e) => e.kind(),
            Self::Artifact(e) => e.kind(),
            Self::WorkerCrashed { .. }
            | Self::SchedulerClosed
            | Self::InvalidTransition { .. } => ErrorKind::Internal,
        }
    }

    /// Script trace, when the failure came from inside the script.
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::Engine(e) => e.trace(),
            _ => None,
        }
    }

    /// Converts into the failure outcome reported to the caller.
    pub fn into_outcome(self) -> ExecutionOutcome {
        match self {
            Self::Engine(e) => e.into_outcome(),
            other => ExecutionOutcome::failure(other.to_string(), None),
        }
    }
}

impl From<RuntimeError> for SheetrunError {
    fn from(e: RuntimeError) -> Self {
        SheetrunError::new(e.kind(), e.to_string())
    }
}

impl DiagnosticError for RuntimeError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Engine(e) => e.hint(),
            Self::Artifact(e) => e.hint(),
            Self::WorkerCrashed { .. } => {
                Some("The interpreter panicked while running the script.".into())
            }
            Self::SchedulerClosed => Some("The server is draining in-flight executions.".into()),
            Self::InvalidTransition { .. } => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Engine(e) => e.fix(),
            Self::Artifact(e) => e.fix(),
            _ => None,
        }
    }
}
