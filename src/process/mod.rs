//! Process boundary.
//!
//! Everything that talks to the container runtime or the in-container SQL
//! client goes through [`CommandRunner`]. [`ShellRunner`] spawns real
//! processes; [`DryRunRunner`] only prints what would be run, which is how
//! `--dry` works without touching Docker.

pub mod detect;

use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

pub use detect::{DockerDetection, DockerStatus, Platform, check_docker};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started at all.
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        /// Program name.
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure.
    #[error("'{command}' exited with status {}: {}", exit_label(.code), .output.trim())]
    NonZeroExit {
        /// Program name.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured stdout followed by stderr.
        output: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output with only stdout populated.
    pub fn from_stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            stderr: String::new(),
        }
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Runs a program with arguments and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, failing on spawn errors and nonzero exit.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError>;

    /// Like [`run`](Self::run), but also copies the child's stderr to ours
    /// line by line while it runs (image pull progress, for instance).
    async fn run_tee(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        self.run(program, args).await
    }
}

/// Spawns real child processes.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    verbose: bool,
}

impl ShellRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        if self.verbose {
            println!("{}", command_line(program, args));
        }
        tracing::debug!(program, args = args.len(), "Spawning process");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Spawn {
                command: program.to_string(),
                source,
            })?;

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(ProcessError::NonZeroExit {
                command: program.to_string(),
                code: output.status.code(),
                output: captured.combined(),
            });
        }
        Ok(captured)
    }

    async fn run_tee(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        if self.verbose {
            println!("{}", command_line(program, args));
        }
        tracing::debug!(program, args = args.len(), "Spawning process with stderr tee");

        let spawn_error = |source| ProcessError::Spawn {
            command: program.to_string(),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let read_stdout = async {
            let mut text = String::new();
            if let Some(mut stdout) = stdout
                && let Err(e) = stdout.read_to_string(&mut text).await
            {
                tracing::debug!(error = %e, "Failed to read child stdout");
            }
            text
        };
        let tee_stderr = async {
            let mut text = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    eprintln!("{line}");
                    text.push_str(&line);
                    text.push('\n');
                }
            }
            text
        };
        let (stdout, stderr) = tokio::join!(read_stdout, tee_stderr);
        let status = child.wait().await.map_err(spawn_error)?;

        let captured = CommandOutput { stdout, stderr };
        if !status.success() {
            return Err(ProcessError::NonZeroExit {
                command: program.to_string(),
                code: status.code(),
                output: captured.combined(),
            });
        }
        Ok(captured)
    }
}

/// Prints the command line instead of running it.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        println!("{}", command_line(program, args));
        Ok(CommandOutput::default())
    }
}

static NEEDS_QUOTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w@%+=:,./-]").expect("shell quoting pattern is valid"));

/// Quote `arg` for display as a POSIX shell word.
pub fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if NEEDS_QUOTING.is_match(arg) {
        return format!("'{}'", arg.replace('\'', r#"'"'"'"#));
    }
    arg.to_string()
}

/// `program arg1 arg2 ...` with every argument shell-quoted.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg));
    }
    line
}
