//! Test doubles for the process boundary.
//!
//! Provides:
//! - [`ScriptedRunner`]: a [`CommandRunner`] that records every invocation and
//!   answers with a caller-supplied script instead of spawning processes
//! - [`Invocation`]: one recorded call, with helpers for picking out the SQL
//!   statement of a `sqlcmd` call
//!
//! # Usage
//!
//! ```rust,no_run
//! use dockdb::process::CommandOutput;
//! use dockdb::testing::ScriptedRunner;
//!
//! let runner = ScriptedRunner::new(|call| {
//!     if call.is_sql() {
//!         Ok(CommandOutput::default())
//!     } else {
//!         Ok(CommandOutput::from_stdout("abc123\n"))
//!     }
//! });
//! ```

use std::sync::Mutex;

use async_trait::async_trait;

use crate::process::{CommandOutput, CommandRunner, ProcessError};

/// Container identifier returned by [`ScriptedRunner::succeeding`] for `docker run`.
pub const FAKE_CONTAINER_ID: &str = "4f3c2b1a0d9e";

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Made through [`CommandRunner::run_tee`].
    pub streamed: bool,
}

impl Invocation {
    /// The statement passed with `-Q`, if this is a `sqlcmd` call.
    pub fn sql(&self) -> Option<&str> {
        let idx = self.args.iter().position(|a| a == "-Q")?;
        self.args.get(idx + 1).map(String::as_str)
    }

    /// Whether this call runs a SQL statement.
    pub fn is_sql(&self) -> bool {
        self.sql().is_some()
    }

    /// Docker subcommand (`run`, `exec`, ...).
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

type Responder = dyn Fn(&Invocation) -> Result<CommandOutput, ProcessError> + Send + Sync;

/// A scripted, recording [`CommandRunner`].
pub struct ScriptedRunner {
    responder: Box<Responder>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// Answer every call with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Invocation) -> Result<CommandOutput, ProcessError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `docker run` prints [`FAKE_CONTAINER_ID`]; everything else succeeds
    /// with empty output.
    pub fn succeeding() -> Self {
        Self::new(|call| {
            if call.subcommand() == Some("run") {
                Ok(CommandOutput::from_stdout(format!("{FAKE_CONTAINER_ID}\n")))
            } else {
                Ok(CommandOutput::default())
            }
        })
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    fn record(
        &self,
        program: &str,
        args: &[String],
        streamed: bool,
    ) -> Result<CommandOutput, ProcessError> {
        let call = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            streamed,
        };
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(call.clone());
        (self.responder)(&call)
    }

    /// SQL statements of all `sqlcmd` calls, in order.
    pub fn sql_statements(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.sql().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        self.record(program, args, false)
    }

    async fn run_tee(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        self.record(program, args, true)
    }
}

/// A failed `docker exec` as seen while SQL Server is still starting up.
pub fn login_timeout() -> ProcessError {
    ProcessError::NonZeroExit {
        command: "docker".to_string(),
        code: Some(1),
        output: "Sqlcmd: Error: Microsoft ODBC Driver 18 for SQL Server : Login timeout expired."
            .to_string(),
    }
}

/// `sqlcmd` output reporting a severity-16 failure.
pub fn severity_16(message: &str) -> CommandOutput {
    CommandOutput::from_stdout(format!(
        "Msg 15023, Level 16, State 1, Server {FAKE_CONTAINER_ID}, Line 2\n{message}\n"
    ))
}
