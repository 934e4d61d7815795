//! Execution outcomes and the diagnostic payload returned on failure.

use serde::{Deserialize, Serialize};

/// Message reported when a script finishes cleanly but never writes its
/// output file.
pub const MISSING_ARTIFACT_MESSAGE: &str =
    "script completed without producing the expected artifact";

/// What happened to one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The script produced an artifact; carries its bytes.
    Success(Vec<u8>),
    /// The script failed or produced nothing.
    Failure {
        /// Human-readable failure message.
        message: String,
        /// Diagnostic trace, when the failure originated inside the script.
        trace: Option<String>,
    },
}

impl ExecutionOutcome {
    /// Builds a failure outcome.
    pub fn failure(message: impl Into<String>, trace: Option<String>) -> Self {
        Self::Failure {
            message: message.into(),
            trace,
        }
    }

    /// Builds the failure reported for a missing artifact.
    pub fn missing_artifact() -> Self {
        Self::failure(MISSING_ARTIFACT_MESSAGE, None)
    }

    /// Returns `true` for [`ExecutionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Structured body returned to the caller when execution fails.
///
/// Carries the failing script verbatim so the calling workflow can show
/// or log the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailurePayload {
    /// Failure message.
    pub error: String,
    /// Full diagnostic trace (empty when none is available).
    pub traceback: String,
    /// The exact script text that failed.
    pub failing_script: String,
}

impl FailurePayload {
    /// Assembles a payload from a failure message, optional trace and script.
    pub fn new(message: impl Into<String>, trace: Option<String>, script: &str) -> Self {
        Self {
            error: message.into(),
            traceback: trace.unwrap_or_default(),
            failing_script: script.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_has_no_trace() {
        match ExecutionOutcome::missing_artifact() {
            ExecutionOutcome::Failure { message, trace } => {
                assert_eq!(message, MISSING_ARTIFACT_MESSAGE);
                assert!(trace.is_none());
            }
            ExecutionOutcome::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let payload = FailurePayload::new("boom", Some("trace".into()), "throw \"boom\";");
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["traceback"], "trace");
        assert_eq!(json["failingScript"], "throw \"boom\";");
    }

    #[test]
    fn payload_without_trace_has_empty_traceback() {
        let payload = FailurePayload::new(MISSING_ARTIFACT_MESSAGE, None, "let x = 1;");
        assert!(payload.traceback.is_empty());
    }

    #[test]
    fn success_is_success() {
        assert!(ExecutionOutcome::Success(vec![1, 2]).is_success());
        assert!(!ExecutionOutcome::missing_artifact().is_success());
    }
}
