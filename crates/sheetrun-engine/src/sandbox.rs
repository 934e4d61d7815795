//! Sandboxed script evaluation.
//!
//! Pipeline: check preconditions → compile → bind `output_path` → evaluate
//! under limits → check the artifact postcondition.

use std::sync::Arc;
use std::time::Instant;

use rhai::{EvalAltResult, Scope};
use tracing::{debug, warn};

use sheetrun_sandbox::{
    ArtifactPath, CapabilityRegistry, CapabilitySet, ExecutionLimits, LimitGuard,
};

use crate::error::EngineError;
use crate::trace::{format_trace, innermost, message};

/// Per-invocation values handed to the script.
#[derive(Debug, Clone)]
pub struct Bindings {
    /// The one location the script may write to.
    pub output_path: ArtifactPath,
    /// Optional operation and time budget.
    pub limits: ExecutionLimits,
}

impl Bindings {
    /// Bindings with no execution limits.
    pub fn new(output_path: ArtifactPath) -> Self {
        Self {
            output_path,
            limits: ExecutionLimits::unbounded(),
        }
    }

    /// Replaces the execution limits.
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Facts about a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Wall-clock time spent compiling and evaluating.
    pub duration_ms: u64,
}

/// Evaluates `script` against `capabilities` with `bindings` in scope.
///
/// Any value the script returns is ignored. Success means a file exists at
/// `bindings.output_path` once evaluation completes.
///
/// # Errors
///
/// Returns `EngineError::EmptyScript` or `EngineError::OutputExists` when a
/// precondition does not hold, `EngineError::Script` or
/// `EngineError::Terminated` when evaluation fails, and
/// `EngineError::MissingArtifact` when the script wrote nothing.
#[tracing::instrument(skip_all, fields(
    output = %bindings.output_path,
    script_len = script.len(),
))]
pub fn run(
    script: &str,
    bindings: &Bindings,
    capabilities: &CapabilitySet,
) -> Result<RunReport, EngineError> {
    let start = Instant::now();

    if script.trim().is_empty() {
        return Err(EngineError::EmptyScript);
    }
    let output = bindings.output_path.as_path();
    if output.exists() {
        return Err(EngineError::OutputExists {
            path: bindings.output_path.to_string(),
        });
    }
    bindings.limits.validate()?;

    let engine = capabilities.engine();
    let ast = engine.compile(script).map_err(|e| {
        let err: Box<EvalAltResult> = e.into();
        script_error(&err, script)
    })?;

    let mut scope = Scope::new();
    scope.push(
        CapabilityRegistry::OUTPUT_BINDING,
        bindings.output_path.clone(),
    );

    let evaluated = {
        let _guard = LimitGuard::install(&bindings.limits);
        engine.run_ast_with_scope(&mut scope, &ast)
    };
    if let Err(err) = evaluated {
        let err = script_error(&err, script);
        warn!(error = %err, "script raised");
        return Err(err);
    }

    if !output.exists() {
        warn!("script completed without writing its artifact");
        return Err(EngineError::MissingArtifact {
            path: bindings.output_path.to_string(),
        });
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(duration_ms, "script produced artifact");
    Ok(RunReport { duration_ms })
}

fn script_error(err: &EvalAltResult, script: &str) -> EngineError {
    let trace = format_trace(err, script);
    match innermost(err) {
        EvalAltResult::ErrorTerminated(..) => EngineError::Terminated {
            reason: message(err),
            trace,
        },
        _ => EngineError::Script {
            message: message(err),
            trace,
        },
    }
}

/// Seam between the orchestrator and script evaluation.
pub trait ScriptRunner: Send + Sync {
    /// Evaluates `script` with `bindings`; see [`run`].
    fn run(&self, script: &str, bindings: &Bindings) -> Result<RunReport, EngineError>;
}

/// [`ScriptRunner`] over a shared, frozen capability set.
#[derive(Debug, Clone)]
pub struct Sandbox {
    capabilities: Arc<CapabilitySet>,
}

impl Sandbox {
    /// Creates a sandbox over `capabilities`.
    pub fn new(capabilities: Arc<CapabilitySet>) -> Self {
        Self { capabilities }
    }

    /// Builds the standard capability set and wraps it.
    pub fn standard() -> Self {
        Self::new(Arc::new(CapabilityRegistry::build()))
    }

    /// The capability set scripts run against.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

impl ScriptRunner for Sandbox {
    fn run(&self, script: &str, bindings: &Bindings) -> Result<RunReport, EngineError> {
        run(script, bindings, &self.capabilities)
    }
}
