use std::time::Duration;

use crate::config::helpers::{optional_env, parse_optional};
use crate::error::ConfigError;
use crate::provision::backoff::RetryPolicy;

/// Container runtime CLI used when `DOCKDB_DOCKER_BIN` is unset.
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Location of `sqlcmd` inside the SQL Server image (mssql-tools18).
pub const DEFAULT_SQLCMD_PATH: &str = "/opt/mssql-tools18/bin/sqlcmd";

/// Longest accepted `DOCKDB_STARTUP_TIMEOUT_SECS`.
pub const MAX_STARTUP_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings that are not part of a single provisioning request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionConfig {
    /// Container runtime CLI.
    pub docker_bin: String,
    /// Path of `sqlcmd` inside the SQL Server container.
    pub sqlcmd_path: String,
    /// How long to wait for SQL Server to answer after the container starts.
    pub startup_timeout: Duration,
    /// Readiness polling schedule.
    pub retry: RetryPolicy,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            docker_bin: DEFAULT_DOCKER_BIN.to_string(),
            sqlcmd_path: DEFAULT_SQLCMD_PATH.to_string(),
            startup_timeout: Duration::from_secs(60),
            // SQL Server cannot be up within the first second, and early
            // connection attempts take long to fail.
            retry: RetryPolicy {
                pre_delay: Duration::from_secs(1),
                ..RetryPolicy::default()
            },
        }
    }
}

impl ProvisionConfig {
    /// Resolve from process environment variables.
    pub fn resolve() -> Result<Self, ConfigError> {
        Self::resolve_from(optional_env)
    }

    /// Resolve using `lookup` to read variables.
    pub fn resolve_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            let ms = parse_optional(key, lookup(key)?, default.as_millis() as u64)?;
            Ok(Duration::from_millis(ms))
        };

        let retry = RetryPolicy {
            pre_delay: millis("DOCKDB_WAIT_PRE_DELAY_MS", defaults.retry.pre_delay)?,
            min_delay: millis("DOCKDB_WAIT_MIN_DELAY_MS", defaults.retry.min_delay)?,
            max_delay: millis("DOCKDB_WAIT_MAX_DELAY_MS", defaults.retry.max_delay)?,
            rate: parse_optional(
                "DOCKDB_WAIT_RATE",
                lookup("DOCKDB_WAIT_RATE")?,
                defaults.retry.rate,
            )?,
        };
        retry.validate().map_err(|e| ConfigError::InvalidValue {
            key: "DOCKDB_WAIT_*".to_string(),
            message: e.to_string(),
        })?;

        let startup_timeout_secs = parse_optional(
            "DOCKDB_STARTUP_TIMEOUT_SECS",
            lookup("DOCKDB_STARTUP_TIMEOUT_SECS")?,
            defaults.startup_timeout.as_secs(),
        )?;
        let startup_timeout = Duration::from_secs(startup_timeout_secs);
        if startup_timeout > MAX_STARTUP_TIMEOUT {
            return Err(ConfigError::InvalidValue {
                key: "DOCKDB_STARTUP_TIMEOUT_SECS".to_string(),
                message: format!(
                    "{startup_timeout_secs}s exceeds the maximum of {}s",
                    MAX_STARTUP_TIMEOUT.as_secs()
                ),
            });
        }

        Ok(Self {
            docker_bin: lookup("DOCKDB_DOCKER_BIN")?.unwrap_or(defaults.docker_bin),
            sqlcmd_path: lookup("DOCKDB_SQLCMD_PATH")?.unwrap_or(defaults.sqlcmd_path),
            startup_timeout,
            retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve(vars: &[(&str, &str)]) -> Result<ProvisionConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProvisionConfig::resolve_from(|key| Ok(vars.get(key).cloned()))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config, ProvisionConfig::default());
        assert_eq!(config.docker_bin, "docker");
        assert_eq!(config.startup_timeout, Duration::from_secs(60));
        assert_eq!(config.retry.pre_delay, Duration::from_secs(1));
        assert_eq!(config.retry.rate, 1.5);
    }

    #[test]
    fn test_overrides() {
        let config = resolve(&[
            ("DOCKDB_DOCKER_BIN", "podman"),
            ("DOCKDB_SQLCMD_PATH", "/opt/mssql-tools/bin/sqlcmd"),
            ("DOCKDB_STARTUP_TIMEOUT_SECS", "120"),
            ("DOCKDB_WAIT_MIN_DELAY_MS", "250"),
            ("DOCKDB_WAIT_RATE", "2"),
        ])
        .unwrap();

        assert_eq!(config.docker_bin, "podman");
        assert_eq!(config.sqlcmd_path, "/opt/mssql-tools/bin/sqlcmd");
        assert_eq!(config.startup_timeout, Duration::from_secs(120));
        assert_eq!(config.retry.min_delay, Duration::from_millis(250));
        assert_eq!(config.retry.rate, 2.0);
    }

    #[test]
    fn test_invalid_policy_is_config_error() {
        let err = resolve(&[("DOCKDB_WAIT_RATE", "0.5")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = resolve(&[
            ("DOCKDB_WAIT_MIN_DELAY_MS", "3000"),
            ("DOCKDB_WAIT_MAX_DELAY_MS", "1000"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("below the minimum"));
    }

    #[test]
    fn test_startup_timeout_upper_bound() {
        let config = resolve(&[("DOCKDB_STARTUP_TIMEOUT_SECS", "86400")]).unwrap();
        assert_eq!(config.startup_timeout, MAX_STARTUP_TIMEOUT);

        let err = resolve(&[("DOCKDB_STARTUP_TIMEOUT_SECS", "18446744073709551615")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "DOCKDB_STARTUP_TIMEOUT_SECS"),
        }
    }

    #[test]
    fn test_unparsable_value() {
        let err = resolve(&[("DOCKDB_STARTUP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("DOCKDB_STARTUP_TIMEOUT_SECS"));
    }
}
