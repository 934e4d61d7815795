//! Configuration for the sheetrun runtime.

use std::path::PathBuf;

use sheetrun_sandbox::ExecutionLimits;

/// Configuration for the sheetrun runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Scratch directory for artifacts; `None` selects `/tmp` or the
    /// working directory.
    pub scratch_dir: Option<PathBuf>,
    /// Limits applied to every script.
    pub limits: ExecutionLimits,
    /// Scheduler concurrency limit; `0` means unbounded.
    pub max_concurrent: usize,
}
