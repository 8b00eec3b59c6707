//! Crate-level error types that are not tied to provisioning itself.

use thiserror::Error;

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}
