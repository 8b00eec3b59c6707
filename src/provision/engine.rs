//! The engine abstraction shared by all supported databases.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::ProvisionConfig;
use crate::process::CommandRunner;
use crate::provision::engines::{Mongo, MySql, Postgres, Redis};
use crate::provision::error::Result;
use crate::provision::mssql::SqlServer;
use crate::provision::mssql::password::PasswordPolicyError;
use crate::provision::request::ProvisionRequest;

/// Which database to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum EngineKind {
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
    #[value(alias = "sqlserver")]
    Mssql,
    Mysql,
    #[value(alias = "mongodb")]
    Mongo,
    Redis,
}

impl EngineKind {
    pub const ALL: [EngineKind; 5] = [
        EngineKind::Postgres,
        EngineKind::Mssql,
        EngineKind::Mysql,
        EngineKind::Mongo,
        EngineKind::Redis,
    ];

    /// Build the engine implementation for this kind.
    pub fn engine(self, config: &ProvisionConfig) -> Box<dyn Engine> {
        match self {
            EngineKind::Postgres => Box::new(Postgres::new(config)),
            EngineKind::Mssql => Box::new(SqlServer::new(config)),
            EngineKind::Mysql => Box::new(MySql::new(config)),
            EngineKind::Mongo => Box::new(Mongo::new(config)),
            EngineKind::Redis => Box::new(Redis::new(config)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::Mssql => "mssql",
            EngineKind::Mysql => "mysql",
            EngineKind::Mongo => "mongo",
            EngineKind::Redis => "redis",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "mysql" => Ok(Self::Mysql),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "redis" => Ok(Self::Redis),
            _ => Err(format!(
                "unknown db type '{s}'. Must be one of 'postgres', 'mssql', 'mysql', 'mongo', or 'redis'"
            )),
        }
    }
}

/// Which optional parameters an engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub database_name: bool,
    pub user_password: bool,
}

/// Values used for anything the caller leaves unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSettings {
    pub user: Option<&'static str>,
    pub image_tag: &'static str,
    pub port: u16,
    pub password: Option<&'static str>,
}

/// A container that was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub name: String,
    /// Identifier printed by `docker run -d`; empty in dry-run mode.
    pub id: String,
}

impl CreatedContainer {
    pub(crate) fn from_run_output(name: &str, stdout: &str) -> Self {
        Self {
            name: name.to_string(),
            id: stdout.trim().to_string(),
        }
    }

    /// Target for `docker exec`: the id when known, the name otherwise.
    pub fn exec_target(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }
}

/// A database that can be provisioned in a container.
#[async_trait]
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    fn default_settings(&self) -> DefaultSettings;

    fn capabilities(&self) -> Capabilities;

    /// Reject passwords the database would refuse. Most engines accept
    /// anything.
    fn validate_password(&self, _password: &str) -> std::result::Result<(), PasswordPolicyError> {
        Ok(())
    }

    /// Launch the container and perform any follow-up setup.
    async fn create(
        &self,
        runner: &dyn CommandRunner,
        request: &ProvisionRequest,
    ) -> Result<CreatedContainer>;
}

/// Value of an optional request field, empty when unset.
pub(crate) fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Password of a request, empty when unset.
pub(crate) fn password(request: &ProvisionRequest) -> &str {
    request
        .password
        .as_ref()
        .map(|p| p.expose_secret())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine_kind() {
        assert_eq!("postgres".parse::<EngineKind>(), Ok(EngineKind::Postgres));
        assert_eq!("PG".parse::<EngineKind>(), Ok(EngineKind::Postgres));
        assert_eq!("sqlserver".parse::<EngineKind>(), Ok(EngineKind::Mssql));
        assert_eq!("mongodb".parse::<EngineKind>(), Ok(EngineKind::Mongo));
        assert!("oracle".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for kind in EngineKind::ALL {
            assert_eq!(kind.to_string().parse::<EngineKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_engine_reports_its_kind() {
        let config = ProvisionConfig::default();
        for kind in EngineKind::ALL {
            assert_eq!(kind.engine(&config).kind(), kind);
        }
    }

    #[test]
    fn test_exec_target_falls_back_to_name() {
        let created = CreatedContainer::from_run_output("quiet-otter", "\n");
        assert_eq!(created.exec_target(), "quiet-otter");

        let created = CreatedContainer::from_run_output("quiet-otter", "abc123\n");
        assert_eq!(created.exec_target(), "abc123");
    }
}
