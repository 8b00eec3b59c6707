//! Configuration resolved from the environment.
//!
//! A `.env` file in the working directory is loaded first (see `main`), so
//! every setting below can live there too. Precedence: env var > default.

pub(crate) mod helpers;
mod provision;

pub use provision::{
    DEFAULT_DOCKER_BIN, DEFAULT_SQLCMD_PATH, MAX_STARTUP_TIMEOUT, ProvisionConfig,
};
