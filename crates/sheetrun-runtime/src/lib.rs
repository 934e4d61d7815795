//! # sheetrun-runtime
//!
//! Runtime orchestrator for sheetrun.
//! Owns the per-request lifecycle: validate, allocate an artifact path, run
//! the script on a blocking worker, read the artifact back and release it
//! on every exit path.
//!
//! Use `ExecutionService` as the entry point; the transport and the CLI
//! both drive it.

pub mod artifact;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod runtime_config;
pub mod scheduler;
pub mod state;

pub use artifact::{select_scratch_dir, ArtifactError, ArtifactHandle, ArtifactStore};
pub use error::RuntimeError;
pub use metrics::{ExecutionMetrics, MetricsSnapshot};
pub use orchestrator::{ExecutionResponse, ExecutionService};
pub use runtime_config::RuntimeConfig;
pub use scheduler::{Permit, Scheduler, SchedulerConfig};
pub use state::{RequestLifecycle, RequestState};
