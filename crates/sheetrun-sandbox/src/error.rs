//! Sandbox-specific error types.

use sheetrun_types::{DiagnosticError, ErrorKind, SheetrunError};
use thiserror::Error;

/// Errors from the capability layer.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Invalid execution limits.
    #[error("invalid sandbox config: {reason}")]
    InvalidConfig { reason: String },
    /// A workbook could not be rendered to disk.
    #[error("failed to render workbook: {reason}")]
    Render { reason: String },
}

impl From<SandboxError> for SheetrunError {
    fn from(e: SandboxError) -> Self {
        let kind = match &e {
            SandboxError::InvalidConfig { .. } => ErrorKind::Internal,
            SandboxError::Render { .. } => ErrorKind::ScriptEvaluation,
        };
        SheetrunError::new(kind, e.to_string())
    }
}

impl DiagnosticError for SandboxError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidConfig { .. } => {
                Some("The [sandbox] section of the configuration has invalid values.".into())
            }
            Self::Render { .. } => Some(
                "The script built a workbook that the spreadsheet writer rejected.".into(),
            ),
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::InvalidConfig { .. } => Some(
                "Use a positive value or remove the key:\n  [sandbox]\n  max_operations = 1000000"
                    .into(),
            ),
            Self::Render { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_maps_to_internal() {
        let err: SheetrunError = SandboxError::InvalidConfig {
            reason: "zero".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[test]
    fn render_maps_to_script_evaluation() {
        let err: SheetrunError = SandboxError::Render {
            reason: "bad sheet".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::ScriptEvaluation);
        assert!(err.message.contains("bad sheet"));
    }

    #[test]
    fn invalid_config_fix_mentions_section() {
        let e = SandboxError::InvalidConfig {
            reason: "zero".into(),
        };
        assert!(e.fix().expect("has fix").contains("[sandbox]"));
    }

    #[test]
    fn render_has_no_fix() {
        let e = SandboxError::Render {
            reason: "x".into(),
        };
        assert!(e.fix().is_none());
    }
}
