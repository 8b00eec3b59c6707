//! Disposable database containers.
//!
//! The coordinator merges command-line input, wizard answers and engine
//! defaults into a [`ProvisionRequest`], then hands it to one of the
//! [`Engine`] implementations. All side effects go through a
//! [`CommandRunner`](crate::process::CommandRunner).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           coordinator                                │
//! │                                                                      │
//! │   select_engine() ──▶ resolve() ──▶ provision()                      │
//! │                          │               │                           │
//! │           (password checked before       ▼                           │
//! │            any process runs)      ┌──────────────┐                   │
//! │                                   │ Engine       │                   │
//! │                                   │  ::create()  │                   │
//! │                                   └──────┬───────┘                   │
//! │            ┌──────────────┬──────────────┼──────────────┐            │
//! │            ▼              ▼              ▼              ▼            │
//! │      Postgres/MySql   Mongo/Redis     SqlServer                      │
//! │      (docker run)     (docker run)       │                           │
//! │                                          ▼                           │
//! │                              docker run ─▶ wait_for(probe)           │
//! │                                          ─▶ bootstrap steps          │
//! │                                             (sqlcmd via SqlSession)  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dockdb::config::ProvisionConfig;
//! use dockdb::process::ShellRunner;
//! use dockdb::provision::{EngineKind, ProvisionInput, provision, resolve};
//!
//! # async fn example() -> Result<(), dockdb::provision::ProvisionError> {
//! let config = ProvisionConfig::default();
//! let engine = EngineKind::Postgres.engine(&config);
//! let request = resolve(engine.as_ref(), ProvisionInput::default(), None)?;
//! let created = provision(engine.as_ref(), &ShellRunner::new(false), &request).await?;
//! println!("{} is running", created.name);
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod coordinator;
pub mod engine;
pub mod engines;
pub mod error;
pub mod mssql;
pub mod names;
pub mod progress;
pub mod request;

pub use backoff::{BackoffError, InvalidRetryPolicy, RetryPolicy, wait_for};
pub use coordinator::{
    DEFAULT_DATABASE, Prompter, ProvisionInput, Validator, provision, resolve, select_engine,
};
pub use engine::{Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind};
pub use engines::{Mongo, MySql, Postgres, Redis};
pub use error::{ProvisionError, Result};
pub use mssql::SqlServer;
pub use request::ProvisionRequest;
