//! # sheetrun-config
//!
//! Configuration management for sheetrun.
//! Supports layered config: defaults -> file -> env vars -> `PORT`.

pub mod loader;
pub mod schema;

pub use loader::{load_config, validate, ConfigError, ENV_PREFIX, MAX_CONCURRENT_LIMIT};
pub use schema::{LoggingConfig, RuntimeConfig, SandboxConfig, ServerConfig, SheetrunConfig};
