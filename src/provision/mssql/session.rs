//! Running T-SQL inside a SQL Server container through `sqlcmd`.

use secrecy::{ExposeSecret, SecretString};

use crate::process::{CommandOutput, CommandRunner, ProcessError};
use crate::provision::error::Result;
use crate::provision::mssql::classify::classify;
use crate::provision::mssql::escape::escape_identifier;

/// Login used for every bootstrap statement.
pub const SUPERUSER: &str = "SA";

/// Where `sqlcmd` runs and how it authenticates.
pub struct SqlSession<'a> {
    runner: &'a dyn CommandRunner,
    docker_bin: &'a str,
    sqlcmd_path: &'a str,
    container: &'a str,
    database: &'a str,
    password: &'a SecretString,
    verbose: bool,
}

impl<'a> SqlSession<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        docker_bin: &'a str,
        sqlcmd_path: &'a str,
        container: &'a str,
        database: &'a str,
        password: &'a SecretString,
    ) -> Self {
        Self {
            runner,
            docker_bin,
            sqlcmd_path,
            container,
            database,
            password,
            verbose: false,
        }
    }

    /// Echo statements and raw client output to stdout.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run `sql` at server scope.
    pub async fn run(&self, sql: &str) -> Result<()> {
        if self.verbose {
            if sql.contains('\n') {
                println!("SQL:\n{sql} --> END SQL");
            } else {
                println!("SQL: {sql}");
            }
        }

        let result = self.runner.run(self.docker_bin, &self.args(sql)).await;
        if self.verbose
            && let Some(text) = client_output(&result)
        {
            println!("{text}");
        }
        classify(&result?.combined())
    }

    /// Run `sql` after switching to the session database.
    pub async fn run_in_database(&self, sql: &str) -> Result<()> {
        let database = escape_identifier(self.database)?;
        self.run(&format!("USE {database}\n{sql}")).await
    }

    fn args(&self, sql: &str) -> Vec<String> {
        [
            "exec",
            self.container,
            self.sqlcmd_path,
            "-C",
            "-S",
            "localhost",
            "-U",
            SUPERUSER,
            "-P",
            self.password.expose_secret(),
            "-Q",
            sql,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

/// What the SQL client printed, whether or not it exited cleanly.
fn client_output(result: &std::result::Result<CommandOutput, ProcessError>) -> Option<String> {
    match result {
        Ok(output) => Some(output.combined()),
        Err(ProcessError::NonZeroExit { output, .. }) => Some(output.clone()),
        Err(ProcessError::Spawn { .. }) => None,
    }
}
