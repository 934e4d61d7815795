//! Configuration loader (file + env merge).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use sheetrun_types::{DiagnosticError, SheetrunError};
use thiserror::Error;

use crate::schema::SheetrunConfig;

/// Prefix of sheetrun environment variables; `__` separates sections
/// (`SHEETRUN_SERVER__PORT`).
pub const ENV_PREFIX: &str = "SHEETRUN_";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load or merge configuration.
    #[error("configuration error: {0}")]
    Load(String),
    /// A value was loaded but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SheetrunError {
    fn from(e: ConfigError) -> Self {
        SheetrunError::internal(e.to_string())
    }
}

impl DiagnosticError for ConfigError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Load(_) => Some(
                "A config file or SHEETRUN_* variable has an unknown key or a wrongly typed value."
                    .into(),
            ),
            Self::Invalid(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        Some("Valid sections are [server], [sandbox], [runtime] and [logging].".into())
    }
}

/// Loads configuration by merging layers:
/// 1. Default values
/// 2. Config file (if given)
/// 3. Environment variables (`SHEETRUN_` prefix)
/// 4. `PORT`, which overrides `server.port`
pub fn load_config(config_path: Option<&str>) -> Result<SheetrunConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(SheetrunConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()));

    let config: SheetrunConfig = figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Largest accepted `runtime.max_concurrent`.
pub const MAX_CONCURRENT_LIMIT: usize = 65_536;

/// Checks values that parse but cannot be used.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` for a zero limit, a concurrency cap above
/// [`MAX_CONCURRENT_LIMIT`] or a blank token.
pub fn validate(config: &SheetrunConfig) -> Result<(), ConfigError> {
    if config.sandbox.max_operations == Some(0) {
        return Err(ConfigError::Invalid(
            "sandbox.max_operations must be greater than 0".into(),
        ));
    }
    if config.sandbox.timeout_ms == Some(0) {
        return Err(ConfigError::Invalid(
            "sandbox.timeout_ms must be greater than 0".into(),
        ));
    }
    if config.runtime.max_concurrent > MAX_CONCURRENT_LIMIT {
        return Err(ConfigError::Invalid(format!(
            "runtime.max_concurrent must be at most {MAX_CONCURRENT_LIMIT}"
        )));
    }
    if config.server.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ConfigError::Invalid("server.token must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::path::PathBuf;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let cfg = load_config(None).expect("load");
            assert_eq!(cfg, SheetrunConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_env_then_port() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "sheetrun.toml",
                r#"
                [server]
                port = 7000
                host = "127.0.0.1"

                [sandbox]
                scratch_dir = "/var/tmp/sheetrun"
                timeout_ms = 5000
                "#,
            )?;
            let cfg = load_config(Some("sheetrun.toml")).expect("file");
            assert_eq!(cfg.server.port, 7000);
            assert_eq!(cfg.sandbox.scratch_dir, Some(PathBuf::from("/var/tmp/sheetrun")));

            jail.set_env("SHEETRUN_SERVER__PORT", "7100");
            jail.set_env("SHEETRUN_RUNTIME__MAX_CONCURRENT", "4");
            let cfg = load_config(Some("sheetrun.toml")).expect("env");
            assert_eq!(cfg.server.port, 7100);
            assert_eq!(cfg.runtime.max_concurrent, 4);
            assert_eq!(cfg.server.host, "127.0.0.1");

            jail.set_env("PORT", "7200");
            let cfg = load_config(Some("sheetrun.toml")).expect("port");
            assert_eq!(cfg.server.port, 7200);
            Ok(())
        });
    }

    #[test]
    fn token_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("SHEETRUN_SERVER__TOKEN", "s3cret");
            let cfg = load_config(None).expect("load");
            assert_eq!(cfg.server.token.as_deref(), Some("s3cret"));
            Ok(())
        });
    }

    #[test]
    fn zero_limits_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("SHEETRUN_SANDBOX__MAX_OPERATIONS", "0");
            let err = load_config(None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn oversized_concurrency_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("SHEETRUN_RUNTIME__MAX_CONCURRENT", "18446744073709551615");
            let err = load_config(None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));

            jail.set_env("SHEETRUN_RUNTIME__MAX_CONCURRENT", "65536");
            assert_eq!(load_config(None).expect("load").runtime.max_concurrent, 65_536);
            Ok(())
        });
    }

    #[test]
    fn unknown_key_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[cache]\nsize = 3\n")?;
            assert!(load_config(Some("bad.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn non_numeric_port_is_load_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "eighty");
            let err = load_config(None).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
