//! The ordered statements that turn a fresh SQL Server into a usable
//! database with its own owner login.

use crate::provision::error::Result;
use crate::provision::mssql::escape::{escape_identifier, escape_literal, escape_user};
use crate::provision::mssql::session::SqlSession;

/// Where a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The server's default database.
    Server,
    /// The database being provisioned (`USE` prefix).
    Database,
}

/// One rendered bootstrap statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    pub name: &'static str,
    pub scope: Scope,
    pub sql: String,
}

/// Render the plan for `database` owned by `user`.
///
/// All names are escaped here, so a name SQL Server cannot accept is
/// rejected before any container exists.
pub fn bootstrap_plan(database: &str, user: &str, password: &str) -> Result<Vec<BootstrapStep>> {
    let database = escape_identifier(database)?;
    let user = escape_user(user)?;
    let password = escape_literal(password);

    Ok(vec![
        BootstrapStep {
            name: "create database",
            scope: Scope::Server,
            sql: format!("CREATE DATABASE {database}"),
        },
        BootstrapStep {
            name: "create login",
            scope: Scope::Server,
            sql: format!("CREATE LOGIN {user} WITH PASSWORD = {password}"),
        },
        BootstrapStep {
            name: "create user",
            scope: Scope::Database,
            sql: format!("CREATE USER {user} FOR LOGIN {user}"),
        },
        BootstrapStep {
            name: "grant db_owner",
            scope: Scope::Database,
            sql: format!("ALTER ROLE db_owner ADD MEMBER {user}"),
        },
    ])
}

/// Run `steps` in order, stopping at the first failure.
pub async fn execute(session: &SqlSession<'_>, steps: &[BootstrapStep]) -> Result<()> {
    for step in steps {
        tracing::debug!(step = step.name, "Running bootstrap step");
        match step.scope {
            Scope::Server => session.run(&step.sql).await,
            Scope::Database => session.run_in_database(&step.sql).await,
        }
        .inspect_err(|e| tracing::warn!(step = step.name, error = %e, "Bootstrap step failed"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    use super::*;
    use crate::provision::error::ProvisionError;
    use crate::provision::mssql::escape::InvalidIdentifier;
    use crate::testing::{ScriptedRunner, severity_16};

    #[test]
    fn test_plan_order_and_scope() {
        let plan = bootstrap_plan("db", "app", "it's").unwrap();
        let rendered: Vec<(Scope, &str)> = plan.iter().map(|s| (s.scope, s.sql.as_str())).collect();
        assert_eq!(
            rendered,
            vec![
                (Scope::Server, "CREATE DATABASE [db]"),
                (Scope::Server, "CREATE LOGIN [app] WITH PASSWORD = 'it''s'"),
                (Scope::Database, "CREATE USER [app] FOR LOGIN [app]"),
                (Scope::Database, "ALTER ROLE db_owner ADD MEMBER [app]"),
            ]
        );
    }

    #[test]
    fn test_control_chars_in_password_become_char_codes() {
        let plan = bootstrap_plan("db", "app", "Pass\tword12").unwrap();
        assert_eq!(
            plan[1].sql,
            "CREATE LOGIN [app] WITH PASSWORD = 'Pass' + CHAR(9) + 'word12'"
        );
    }

    #[test]
    fn test_bad_names_rejected() {
        assert!(matches!(
            bootstrap_plan("", "app", "x"),
            Err(ProvisionError::InvalidIdentifier(InvalidIdentifier::Empty))
        ));
        assert!(matches!(
            bootstrap_plan("db", &"u".repeat(128), "x"),
            Err(ProvisionError::InvalidIdentifier(InvalidIdentifier::TooLong { .. }))
        ));
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let runner = ScriptedRunner::new(|call| match call.sql() {
            Some(sql) if sql.contains("CREATE LOGIN") => Ok(severity_16(
                "The server principal 'app' already exists.",
            )),
            _ => Ok(Default::default()),
        });
        let password = SecretString::from("Password12".to_string());
        let session = SqlSession::new(&runner, "docker", "sqlcmd", "abc", "db", &password);
        let plan = bootstrap_plan("db", "app", "Password12").unwrap();

        let err = execute(&session, &plan).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Sql { level: 16, .. }));
        assert_eq!(runner.sql_statements().len(), 2);
    }
}
