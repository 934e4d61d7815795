//! Shared helpers used across CLI commands.
//!
//! Centralises loading the layered configuration and building the
//! `ExecutionService`, so `serve` and `run` share one pipeline.

use std::sync::Arc;

use clap::Args;

use sheetrun_config::SheetrunConfig;
use sheetrun_runtime::{ExecutionService, RuntimeConfig};
use sheetrun_sandbox::{CapabilityRegistry, ExecutionLimits};

use crate::output;

/// Limit flags shared by `serve` and `run`; they override the config file.
#[derive(Debug, Default, Args)]
pub struct LimitArgs {
    /// Interpreter operation budget per script.
    #[arg(long)]
    pub max_operations: Option<u64>,
    /// Wall-clock budget per script, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl LimitArgs {
    /// Writes any given flag into `config`.
    pub fn apply(&self, config: &mut SheetrunConfig) {
        if self.max_operations.is_some() {
            config.sandbox.max_operations = self.max_operations;
        }
        if self.timeout_ms.is_some() {
            config.sandbox.timeout_ms = self.timeout_ms;
        }
    }
}

/// Loads the layered configuration, printing a hint on failure.
///
/// # Errors
///
/// Returns an error if a layer cannot be read or a value is invalid.
pub fn load(path: Option<&str>) -> anyhow::Result<SheetrunConfig> {
    sheetrun_config::load_config(path).map_err(|e| {
        output::print_diagnostic(&e);
        anyhow::anyhow!(e)
    })
}

/// Maps the file-level configuration onto the runtime's.
pub fn runtime_config(config: &SheetrunConfig) -> RuntimeConfig {
    RuntimeConfig {
        scratch_dir: config.sandbox.scratch_dir.clone(),
        limits: ExecutionLimits {
            max_operations: config.sandbox.max_operations,
            timeout: config.sandbox.timeout(),
        },
        max_concurrent: config.runtime.max_concurrent,
    }
}

/// Builds the execution service over the standard capability set.
///
/// Flag overrides are applied after loading, so the merged config is
/// validated again here.
///
/// # Errors
///
/// Returns an error if a value is invalid.
pub fn create_service(config: &SheetrunConfig) -> anyhow::Result<Arc<ExecutionService>> {
    sheetrun_config::validate(config).map_err(|e| {
        output::print_diagnostic(&e);
        anyhow::anyhow!(e)
    })?;
    let capabilities = Arc::new(CapabilityRegistry::build());
    let service = ExecutionService::with_capabilities(&runtime_config(config), capabilities)
        .map_err(|e| {
            output::print_diagnostic(&e);
            anyhow::anyhow!("runtime init error: {e}")
        })?;
    Ok(Arc::new(service))
}
