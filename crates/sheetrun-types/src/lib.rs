//! # sheetrun-types
//!
//! Domain types for sheetrun.
//! Pure data types shared by every layer: request identity, execution
//! outcomes, wire payloads and the unified error taxonomy.

pub mod error;
pub mod outcome;
pub mod request;

// Re-exports for convenience.
pub use error::{DiagnosticError, ErrorKind, SheetrunError};
pub use outcome::{ExecutionOutcome, FailurePayload, MISSING_ARTIFACT_MESSAGE};
pub use request::{ExecuteRequestBody, ExecutionRequest, RequestId};
