//! Top-level request orchestrator: validation, artifact lifecycle and
//! sandboxed execution.

use std::any::Any;
use std::sync::Arc;

use sheetrun_engine::{Bindings, EngineError, Sandbox, ScriptRunner};
use sheetrun_sandbox::{CapabilitySet, ExecutionLimits};
use sheetrun_types::{
    ErrorKind, ExecuteRequestBody, ExecutionOutcome, ExecutionRequest, FailurePayload,
    SheetrunError,
};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn, Span};

use crate::artifact::{select_scratch_dir, ArtifactHandle, ArtifactStore};
use crate::error::RuntimeError;
use crate::metrics::ExecutionMetrics;
use crate::runtime_config::RuntimeConfig;
use crate::scheduler::{Permit, Scheduler, SchedulerConfig};
use crate::state::{RequestLifecycle, RequestState};

/// What the front door should send back.
#[derive(Debug, Clone)]
pub enum ExecutionResponse {
    /// The artifact bytes.
    Artifact(Vec<u8>),
    /// Diagnostic payload for a failed execution.
    Failure {
        payload: FailurePayload,
        kind: ErrorKind,
    },
    /// The request was invalid; nothing was executed.
    Rejected(SheetrunError),
}

impl ExecutionResponse {
    /// Returns `true` for [`ExecutionResponse::Artifact`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Artifact(_))
    }

    /// Error classification, `None` on success.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Artifact(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
            Self::Rejected(e) => Some(e.kind),
        }
    }
}

/// Runs untrusted scripts, one isolated artifact per request.
///
/// Use `metrics()` to read live counters.
pub struct ExecutionService {
    runner: Arc<dyn ScriptRunner>,
    store: ArtifactStore,
    scheduler: Scheduler,
    limits: ExecutionLimits,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionService {
    /// Creates a service that evaluates scripts through `runner`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Engine` for invalid limits and
    /// `RuntimeError::Artifact` if the scratch directory is unusable.
    pub fn new(config: &RuntimeConfig, runner: Arc<dyn ScriptRunner>) -> Result<Self, RuntimeError> {
        config.limits.validate().map_err(EngineError::from)?;
        let store = ArtifactStore::new(select_scratch_dir(config.scratch_dir.as_deref()))?;
        let scheduler = Scheduler::new(&SchedulerConfig {
            max_concurrent: config.max_concurrent,
        });
        info!(
            scratch_dir = %store.scratch_dir().display(),
            max_concurrent = config.max_concurrent,
            "execution service ready"
        );
        Ok(Self {
            runner,
            store,
            scheduler,
            limits: config.limits,
            metrics: ExecutionMetrics::new_shared(),
        })
    }

    /// Creates a service over the sandbox for `capabilities`.
    ///
    /// # Errors
    ///
    /// See [`ExecutionService::new`].
    pub fn with_capabilities(
        config: &RuntimeConfig,
        capabilities: Arc<CapabilitySet>,
    ) -> Result<Self, RuntimeError> {
        Self::new(config, Arc::new(Sandbox::new(capabilities)))
    }

    /// Validates a raw JSON body and executes it.
    pub async fn execute_json(&self, body: &str) -> ExecutionResponse {
        self.execute_body(body.as_bytes()).await
    }

    /// Validates raw request bytes and executes them. Bytes that are not a
    /// UTF-8 JSON object are rejected like any other malformed body.
    pub async fn execute_body(&self, body: &[u8]) -> ExecutionResponse {
        match ExecuteRequestBody::from_slice(body).and_then(ExecuteRequestBody::into_request) {
            Ok(request) => self.execute(request).await,
            Err(e) => {
                self.metrics.record_rejected();
                warn!(error = %e, "request rejected");
                ExecutionResponse::Rejected(e)
            }
        }
    }

    /// Executes one validated request.
    ///
    /// Never fails: every fault becomes an [`ExecutionResponse::Failure`],
    /// and the artifact file is gone by the time this returns.
    #[tracing::instrument(skip_all, fields(request_id = %request.request_id()))]
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResponse {
        info!(script_len = request.script().len(), "executing script");
        self.metrics.record_attempt();
        let mut lifecycle = RequestLifecycle::new(request.request_id());

        let result = match self.scheduler.acquire().await {
            Ok(permit) => self.attempt(&request, permit, &mut lifecycle).await,
            Err(e) => {
                step(&mut lifecycle, RequestState::Failed);
                step(&mut lifecycle, RequestState::Cleaned);
                Err(e)
            }
        };

        let response = self.respond(result, request.script());
        step(&mut lifecycle, RequestState::Responded);
        response
    }

    async fn attempt(
        &self,
        request: &ExecutionRequest,
        permit: Permit,
        lifecycle: &mut RequestLifecycle,
    ) -> Result<Vec<u8>, RuntimeError> {
        let handle = match self.store.allocate(request.request_id()) {
            Ok(handle) => {
                step(lifecycle, RequestState::Allocated);
                handle
            }
            Err(e) => {
                step(lifecycle, RequestState::Failed);
                step(lifecycle, RequestState::Cleaned);
                return Err(e.into());
            }
        };
        step(lifecycle, RequestState::Executing);

        // The worker owns the handle and the permit, so the file is released
        // and the slot stays taken until the script actually stops, even if
        // this future is dropped or the worker unwinds.
        let runner = Arc::clone(&self.runner);
        let store = self.store.clone();
        let script = request.script().to_string();
        let limits = self.limits;
        let mut worker_lifecycle = *lifecycle;
        let span = Span::current();
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _entered = span.enter();
            let result = run_to_completion(
                runner.as_ref(),
                &store,
                handle,
                &script,
                limits,
                &mut worker_lifecycle,
            );
            (worker_lifecycle, result)
        })
        .await;

        match joined {
            Ok((finished, result)) => {
                *lifecycle = finished;
                result
            }
            Err(join_error) => {
                let reason = crash_reason(join_error);
                error!(%reason, "execution worker crashed");
                step(lifecycle, RequestState::Failed);
                step(lifecycle, RequestState::Cleaned);
                Err(RuntimeError::WorkerCrashed { reason })
            }
        }
    }

    fn respond(&self, result: Result<Vec<u8>, RuntimeError>, script: &str) -> ExecutionResponse {
        let (outcome, kind) = match result {
            Ok(bytes) => (ExecutionOutcome::Success(bytes), None),
            Err(e) => {
                warn!(error = %e, "execution failed");
                let kind = e.kind();
                (e.into_outcome(), Some(kind))
            }
        };

        match outcome {
            ExecutionOutcome::Success(bytes) => {
                self.metrics.record_success(bytes.len() as u64);
                info!(bytes = bytes.len(), "artifact returned");
                ExecutionResponse::Artifact(bytes)
            }
            ExecutionOutcome::Failure { message, trace } => {
                let kind = kind.unwrap_or(ErrorKind::Internal);
                if kind == ErrorKind::ArtifactContract {
                    self.metrics.record_missing_artifact();
                } else {
                    self.metrics.record_failure();
                }
                ExecutionResponse::Failure {
                    payload: FailurePayload::new(message, trace, script),
                    kind,
                }
            }
        }
    }

    /// Shared handle to the execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The concurrency scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Waits for in-flight executions and refuses new ones.
    pub async fn shutdown(&self) {
        self.scheduler.drain().await;
        info!("execution service drained");
    }
}

/// Runs the script, reads the artifact and releases it, all on the
/// blocking worker.
fn run_to_completion(
    runner: &dyn ScriptRunner,
    store: &ArtifactStore,
    mut handle: ArtifactHandle,
    script: &str,
    limits: ExecutionLimits,
    lifecycle: &mut RequestLifecycle,
) -> Result<Vec<u8>, RuntimeError> {
    let bindings = Bindings::new(handle.artifact_path()).with_limits(limits);

    let result = match runner.run(script, &bindings) {
        Ok(_) if !store.exists(&handle) => {
            step(lifecycle, RequestState::Failed);
            Err(EngineError::MissingArtifact {
                path: handle.path().display().to_string(),
            }
            .into())
        }
        Ok(report) => {
            step(lifecycle, RequestState::Succeeded);
            debug!(duration_ms = report.duration_ms, "script finished");
            store.read(&handle).map_err(|e| {
                step(lifecycle, RequestState::Failed);
                RuntimeError::from(e)
            })
        }
        Err(e) => {
            step(lifecycle, RequestState::Failed);
            Err(e.into())
        }
    };

    if let Err(e) = store.release(&mut handle) {
        warn!(error = %e, "artifact release failed");
    }
    step(lifecycle, RequestState::Cleaned);
    result
}

fn step(lifecycle: &mut RequestLifecycle, next: RequestState) {
    if let Err(e) = lifecycle.advance(next) {
        error!(error = %e, "request lifecycle violated");
    }
}

fn crash_reason(join_error: JoinError) -> String {
    if !join_error.is_panic() {
        return join_error.to_string();
    }
    let payload: Box<dyn Any + Send> = join_error.into_panic();
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panic: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panic: {text}")
    } else {
        "panic".to_string()
    }
}
