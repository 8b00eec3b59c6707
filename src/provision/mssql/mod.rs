//! Microsoft SQL Server.
//!
//! Unlike the other images, `mcr.microsoft.com/mssql/server` only sets up
//! the `SA` login. After the container starts we wait for the server to
//! answer and then create the database, a login, and a database user that
//! owns it, all through `sqlcmd` inside the container:
//!
//! ```text
//! docker run ──► wait_for(SELECT SERVERPROPERTY) ──► CREATE DATABASE
//!                                                    CREATE LOGIN
//!                                                    CREATE USER      (USE db)
//!                                                    ALTER ROLE ...   (USE db)
//! ```

pub mod bootstrap;
pub mod classify;
pub mod escape;
pub mod password;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use crate::config::{MAX_STARTUP_TIMEOUT, ProvisionConfig};
use crate::process::CommandRunner;
use crate::provision::backoff::{BackoffError, RetryPolicy, wait_for};
use crate::provision::engine::{
    Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind, field,
};
use crate::provision::engines::launch;
use crate::provision::error::{ProvisionError, Result};
use crate::provision::mssql::bootstrap::{BootstrapStep, bootstrap_plan};
use crate::provision::mssql::password::{PasswordPolicyError, validate_password};
use crate::provision::mssql::session::SqlSession;
use crate::provision::progress::Progress;
use crate::provision::request::{ProvisionRequest, docker_env};

const PORT: u16 = 1433;
const IMAGE: &str = "mcr.microsoft.com/mssql/server";

/// Trivial query used to tell whether the server accepts logins.
pub const READINESS_PROBE: &str = "SELECT SERVERPROPERTY('ProductVersion')";

/// SQL Server, see <https://hub.docker.com/r/microsoft/mssql-server>.
#[derive(Debug, Clone)]
pub struct SqlServer {
    docker_bin: String,
    sqlcmd_path: String,
    startup_timeout: Duration,
    retry: RetryPolicy,
    show_progress: bool,
}

impl SqlServer {
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            docker_bin: config.docker_bin.clone(),
            sqlcmd_path: config.sqlcmd_path.clone(),
            startup_timeout: config.startup_timeout,
            retry: config.retry.clone(),
            show_progress: true,
        }
    }

    /// Suppress the console progress indicator.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn run_args(&self, request: &ProvisionRequest, password: &SecretString) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-e".to_string(),
            "ACCEPT_EULA=Y".to_string(),
            "--name".to_string(),
            request.container_name.clone(),
            "--hostname".to_string(),
            request.container_name.clone(),
            "-e".to_string(),
            docker_env("MSSQL_SA_PASSWORD", password.expose_secret()),
        ];
        args.extend(request.port_args(PORT));
        args.push("-d".to_string());
        args.push(format!("{IMAGE}:{}", request.image_tag));
        args
    }

    fn progress(&self, request: &ProvisionRequest) -> Progress {
        if self.show_progress {
            Progress::new(request.verbose)
        } else {
            Progress::silent()
        }
    }

    async fn bootstrap(
        &self,
        session: &SqlSession<'_>,
        plan: &[BootstrapStep],
        dry_run: bool,
        progress: &mut Progress,
    ) -> Result<()> {
        progress.set_state("Waiting for SQL Server to start").await;
        self.wait_until_ready(session, dry_run).await?;

        progress.set_state("Creating database and user").await;
        bootstrap::execute(session, plan).await
    }

    async fn wait_until_ready(&self, session: &SqlSession<'_>, dry_run: bool) -> Result<()> {
        let mut policy = self.retry.clone();
        if dry_run {
            policy.pre_delay = Duration::ZERO;
        }

        let started = Instant::now();
        let deadline = started
            .checked_add(self.startup_timeout)
            .unwrap_or_else(|| started + MAX_STARTUP_TIMEOUT);
        wait_for(&policy, deadline, move || session.run(READINESS_PROBE))
            .await
            .map_err(|e| match e {
                BackoffError::InvalidPolicy(e) => ProvisionError::InvalidRetryPolicy(e),
                BackoffError::TimedOut {
                    attempts,
                    last_error,
                } => ProvisionError::Timeout {
                    timeout: self.startup_timeout,
                    attempts,
                    last_error,
                },
            })?;

        tracing::info!(elapsed = ?started.elapsed(), "SQL Server is accepting connections");
        Ok(())
    }
}

#[async_trait]
impl Engine for SqlServer {
    fn kind(&self) -> EngineKind {
        EngineKind::Mssql
    }

    fn default_settings(&self) -> DefaultSettings {
        DefaultSettings {
            user: Some("mssql"),
            image_tag: "2022-latest",
            port: PORT,
            password: Some("Password12"),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            database_name: true,
            user_password: true,
        }
    }

    fn validate_password(&self, password: &str) -> std::result::Result<(), PasswordPolicyError> {
        validate_password(password)
    }

    async fn create(
        &self,
        runner: &dyn CommandRunner,
        request: &ProvisionRequest,
    ) -> Result<CreatedContainer> {
        let password = request
            .password
            .as_ref()
            .ok_or_else(|| ProvisionError::MissingParameter {
                name: "password",
                hint: "SQL Server needs an SA password".to_string(),
            })?;
        let database = field(&request.database);
        let plan = bootstrap_plan(database, field(&request.user), password.expose_secret())?;

        let created = launch(
            runner,
            &self.docker_bin,
            request,
            self.run_args(request, password),
        )
        .await?;

        let session = SqlSession::new(
            runner,
            &self.docker_bin,
            &self.sqlcmd_path,
            created.exec_target(),
            database,
            password,
        )
        .verbose(request.verbose);

        let mut progress = self.progress(request);
        let result = self
            .bootstrap(&session, &plan, request.dry_run, &mut progress)
            .await;
        progress.finish().await;

        result?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::process::CommandOutput;
    use crate::testing::{FAKE_CONTAINER_ID, ScriptedRunner, login_timeout, severity_16};

    fn engine() -> SqlServer {
        let config = ProvisionConfig {
            startup_timeout: Duration::from_secs(10),
            ..ProvisionConfig::default()
        };
        SqlServer::new(&config).quiet()
    }

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            container_name: "brisk-falcon".to_string(),
            database: Some("db".to_string()),
            user: Some("app".to_string()),
            password: Some(SecretString::from("Password12".to_string())),
            ports: vec!["127.0.0.1:1433".to_string()],
            image_tag: "2022-latest".to_string(),
            verbose: false,
            dry_run: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_then_bootstrap_in_order() {
        let runner = ScriptedRunner::succeeding();

        let created = engine().create(&runner, &request()).await.unwrap();

        assert_eq!(created.id, FAKE_CONTAINER_ID);
        let calls = runner.calls();
        assert_eq!(
            calls[0].args,
            vec![
                "run",
                "-e",
                "ACCEPT_EULA=Y",
                "--name",
                "brisk-falcon",
                "--hostname",
                "brisk-falcon",
                "-e",
                "MSSQL_SA_PASSWORD=Password12",
                "-p",
                "127.0.0.1:1433:1433",
                "-d",
                "mcr.microsoft.com/mssql/server:2022-latest",
            ]
        );
        assert!(calls[1..].iter().all(|c| c.args[1] == FAKE_CONTAINER_ID));
        assert!(calls[0].streamed);
        assert!(calls[1..].iter().all(|c| !c.streamed));
        assert_eq!(
            runner.sql_statements(),
            vec![
                READINESS_PROBE,
                "CREATE DATABASE [db]",
                "CREATE LOGIN [app] WITH PASSWORD = 'Password12'",
                "USE [db]\nCREATE USER [app] FOR LOGIN [app]",
                "USE [db]\nALTER ROLE db_owner ADD MEMBER [app]",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_retried_until_server_answers() {
        let probes = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&probes);
        let runner = ScriptedRunner::new(move |call| match call.sql() {
            Some(READINESS_PROBE) if seen.fetch_add(1, Ordering::SeqCst) < 2 => {
                Err(login_timeout())
            }
            Some(_) => Ok(CommandOutput::default()),
            None => Ok(CommandOutput::from_stdout(FAKE_CONTAINER_ID)),
        });

        engine().create(&runner, &request()).await.unwrap();

        assert_eq!(probes.load(Ordering::SeqCst), 3);
        assert_eq!(runner.sql_statements().len(), 3 + 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_create_user_stops_the_sequence() {
        let runner = ScriptedRunner::new(|call| match call.sql() {
            Some(sql) if sql.contains("CREATE USER") => {
                Ok(severity_16("User, group, or role 'app' already exists."))
            }
            Some(_) => Ok(CommandOutput::default()),
            None => Ok(CommandOutput::from_stdout(FAKE_CONTAINER_ID)),
        });

        let err = engine().create(&runner, &request()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Sql { level: 16, .. }));
        assert!(
            !runner
                .sql_statements()
                .iter()
                .any(|sql| sql.contains("ALTER ROLE"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_never_ready_times_out() {
        let runner = ScriptedRunner::new(|call| {
            if call.is_sql() {
                Err(login_timeout())
            } else {
                Ok(CommandOutput::from_stdout(FAKE_CONTAINER_ID))
            }
        });

        let started = Instant::now();
        let err = engine().create(&runner, &request()).await.unwrap_err();

        assert!(started.elapsed() <= Duration::from_secs(10));
        match err {
            ProvisionError::Timeout {
                timeout,
                attempts,
                last_error,
            } => {
                assert_eq!(timeout, Duration::from_secs(10));
                assert!(attempts >= 1);
                assert!(last_error.unwrap().contains("Login timeout expired"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(
            runner
                .sql_statements()
                .iter()
                .all(|sql| sql == READINESS_PROBE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_startup_timeout_does_not_overflow() {
        let config = ProvisionConfig {
            startup_timeout: Duration::MAX,
            ..ProvisionConfig::default()
        };
        let engine = SqlServer::new(&config).quiet();
        let runner = ScriptedRunner::succeeding();

        let created = engine.create(&runner, &request()).await.unwrap();

        assert_eq!(created.id, FAKE_CONTAINER_ID);
        assert_eq!(runner.sql_statements().len(), 5);
    }

    #[tokio::test]
    async fn test_unusable_database_name_launches_nothing() {
        let runner = ScriptedRunner::succeeding();
        let mut request = request();
        request.database = Some("db]; DROP LOGIN sa; --".to_string());

        let err = engine().create(&runner, &request).await.unwrap_err();

        assert!(matches!(err, ProvisionError::InvalidIdentifier(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_targets_container_name() {
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::default()));
        let mut request = request();
        request.dry_run = true;

        let created = engine().create(&runner, &request).await.unwrap();

        assert_eq!(created.id, "");
        let calls = runner.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls[1..].iter().all(|c| c.args[1] == "brisk-falcon"));
    }

    #[test]
    fn test_password_policy_applies() {
        let engine = engine();
        assert_eq!(
            engine.validate_password("short"),
            Err(PasswordPolicyError::TooShort { min: 10 })
        );
        assert!(engine.validate_password("Password12").is_ok());
    }
}
