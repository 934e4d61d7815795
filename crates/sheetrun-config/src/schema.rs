//! Configuration schema types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level sheetrun configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetrunConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Sandbox settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required on `/execute`; open when unset.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    10000
}

/// Sandbox settings. Limits are unset unless configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory for per-request artifacts; `/tmp` or the working
    /// directory when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Interpreter operation budget per script.
    #[serde(default)]
    pub max_operations: Option<u64>,
    /// Wall-clock budget per script in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SandboxConfig {
    /// Returns the timeout as a `Duration`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum concurrent executions; `0` means unbounded.
    #[serde(default)]
    pub max_concurrent: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "sheetrun::script=debug").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_contract() {
        let cfg = SheetrunConfig::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 10000);
        assert!(cfg.server.token.is_none());
        assert!(cfg.sandbox.scratch_dir.is_none());
        assert!(cfg.sandbox.timeout().is_none());
        assert_eq!(cfg.runtime.max_concurrent, 0);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: SheetrunConfig = toml::from_str("[server]\nport = 8080\n").expect("parse");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SheetrunConfig, _> = toml::from_str("[registry]\npath = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let sandbox = SandboxConfig {
            timeout_ms: Some(1500),
            ..SandboxConfig::default()
        };
        assert_eq!(sandbox.timeout(), Some(Duration::from_millis(1500)));
    }
}
