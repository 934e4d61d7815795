//! Unified error types for the sheetrun domain layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The inbound request was malformed or missing a required field.
    ClientInput,
    /// The untrusted script raised while being compiled or evaluated.
    ScriptEvaluation,
    /// The script completed but did not write the expected artifact.
    ArtifactContract,
    /// The artifact existed but could not be read back.
    ArtifactRead,
    /// Internal error (worker crash, scratch directory failure).
    Internal,
}

impl ErrorKind {
    /// Returns `true` when the fault lies with the caller, not the server.
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::ClientInput)
    }
}

/// Domain-level error with structured context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetrunError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional context.
    pub context: Option<String>,
}

impl SheetrunError {
    /// Creates a new `SheetrunError`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates a client-input error.
    pub fn client_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientInput, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for SheetrunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({ctx})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SheetrunError {}

/// Transforms technical errors into user-actionable diagnostics.
///
/// Implementors provide optional `hint` (cause explanation) and `fix`
/// (concrete remediation step) for each error variant.
pub trait DiagnosticError {
    /// A human-readable explanation of the likely cause.
    fn hint(&self) -> Option<String> {
        None
    }
    /// A concrete fix the user can apply (e.g. a config change).
    fn fix(&self) -> Option<String> {
        None
    }
}
