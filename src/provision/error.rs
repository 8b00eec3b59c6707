//! Error types for provisioning.

use std::time::Duration;

use thiserror::Error;

use crate::process::ProcessError;
use crate::provision::backoff::InvalidRetryPolicy;
use crate::provision::mssql::escape::InvalidIdentifier;
use crate::provision::mssql::password::PasswordPolicyError;

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Errors that can occur while resolving options or creating a container.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Retry parameters violate their invariants.
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(#[from] InvalidRetryPolicy),

    /// The password was rejected by the engine's policy.
    #[error("Password does not meet the requirements: {0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    /// A name cannot be used as a SQL identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] InvalidIdentifier),

    /// A subprocess failed to start or exited nonzero.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The SQL client reported a statement failure.
    #[error("SQL error (severity {level}):\n{output}")]
    Sql {
        /// Parsed severity level.
        level: u32,
        /// Raw client output.
        output: String,
    },

    /// The SQL client produced output that looks like an error header but
    /// cannot be parsed.
    #[error("Malformed SQL client output: {reason}")]
    MalformedOutput {
        /// What could not be parsed.
        reason: String,
    },

    /// The database did not become reachable in time.
    #[error("Database was not ready within {timeout:?} ({attempts} attempts){}", last_error_suffix(.last_error))]
    Timeout {
        /// Total time allowed.
        timeout: Duration,
        /// Number of probes made.
        attempts: u32,
        /// Last probe failure.
        last_error: Option<String>,
    },

    /// A required option was not supplied.
    #[error("Missing {name}: {hint}")]
    MissingParameter {
        /// Option name.
        name: &'static str,
        /// How to supply it.
        hint: String,
    },

    /// Interactive input failed or was cancelled.
    #[error("Interactive input failed: {reason}")]
    Prompt {
        /// Reason for failure.
        reason: String,
    },
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(": {}", e.trim()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_includes_last_error() {
        let err = ProvisionError::Timeout {
            timeout: Duration::from_secs(60),
            attempts: 9,
            last_error: Some("Login timeout expired\n".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Database was not ready within 60s (9 attempts): Login timeout expired"
        );
    }

    #[test]
    fn test_password_error_wraps_reason() {
        let err = ProvisionError::from(PasswordPolicyError::TooShort { min: 10 });
        assert!(err.to_string().contains("at least 10"));
    }
}
