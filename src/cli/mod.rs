//! Command-line interface.
//!
//! A single command: every option is a flag, missing values are asked for
//! by the [`Wizard`] unless `--non-interactive` is given.

mod completion;
mod wizard;

pub use completion::write_completions;
pub use wizard::Wizard;

use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use clap_complete::Shell;
use secrecy::SecretString;

use crate::provision::{EngineKind, ProvisionInput};

const EXAMPLES: &str = "\
Examples:
  dockdb                          Run in wizard mode
  dockdb --dry                    Dry-run in wizard mode
  dockdb -t mssql -u app_user     Create a MsSQL database using provided username
  dockdb -t pg -n -P 15432 orders Create Postgres non-interactively on port 15432";

#[derive(Parser, Debug)]
#[command(name = "dockdb")]
#[command(about = "Create a disposable database docker container.")]
#[command(after_help = EXAMPLES)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    /// Name of the database container to be created
    #[arg(value_name = "CONTAINER_NAME")]
    pub container_name: Option<String>,

    /// Database type
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    pub engine: Option<EngineKind>,

    /// Database user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Database name
    #[arg(short, long)]
    pub database: Option<String>,

    /// User's password
    #[arg(short, long, env = "DOCKDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Port with optional IP address to which the database is mapped (repeatable)
    #[arg(short = 'P', long = "port", value_name = "[IP:]PORT")]
    pub ports: Vec<String>,

    /// Expose the default port on all interfaces instead of 127.0.0.1
    #[arg(long)]
    pub public: bool,

    /// Docker tag to use with the container
    #[arg(short = 'T', long)]
    pub tag: Option<String>,

    /// Exit if any required parameters are missing
    #[arg(short, long)]
    pub non_interactive: bool,

    /// Dry run: print docker commands to stdout without running them
    #[arg(short = 'D', long)]
    pub dry: bool,

    /// Run with verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Provisioning options carried by the flags. Empty strings count as
    /// "not given".
    pub fn to_input(&self) -> ProvisionInput {
        ProvisionInput {
            engine: self.engine,
            container_name: given(&self.container_name),
            database: given(&self.database),
            user: given(&self.user),
            password: given(&self.password).map(SecretString::from),
            ports: self.ports.iter().filter(|p| !p.is_empty()).cloned().collect(),
            public: self.public,
            image_tag: given(&self.tag),
            verbose: self.verbose,
            dry_run: self.dry,
        }
    }
}

fn given(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    DockerNotFound = 1,
    InvalidOptions = 2,
    CreateFailed = 3,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version() {
        let cmd = Cli::command();
        assert_eq!(
            cmd.get_version().unwrap_or("unknown"),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_help_lists_examples() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("Examples:"));
        assert!(help.contains("--non-interactive"));
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "dockdb", "-t", "SQLServer", "-u", "app", "-d", "sales", "-p", "Sup3rSecret!", "-P",
            "0.0.0.0:1433", "-P", "11433", "-T", "2019-latest", "-n", "-D", "-v", "sales-db",
        ])
        .unwrap();

        assert_eq!(cli.engine, Some(EngineKind::Mssql));
        assert_eq!(cli.container_name.as_deref(), Some("sales-db"));
        assert!(cli.non_interactive && cli.dry && cli.verbose);

        let input = cli.to_input();
        assert_eq!(input.ports, vec!["0.0.0.0:1433", "11433"]);
        assert_eq!(input.image_tag.as_deref(), Some("2019-latest"));
        assert_eq!(
            input.password.as_ref().map(|p| p.expose_secret()),
            Some("Sup3rSecret!")
        );
    }

    #[test]
    fn test_engine_aliases() {
        for (arg, kind) in [
            ("pg", EngineKind::Postgres),
            ("postgresql", EngineKind::Postgres),
            ("mongodb", EngineKind::Mongo),
            ("REDIS", EngineKind::Redis),
        ] {
            let cli = Cli::try_parse_from(["dockdb", "--type", arg]).unwrap();
            assert_eq!(cli.engine, Some(kind), "{arg}");
        }
        assert!(Cli::try_parse_from(["dockdb", "--type", "oracle"]).is_err());
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let cli = Cli::try_parse_from(["dockdb", "-u", "", "-T", ""]).unwrap();
        let input = cli.to_input();
        assert_eq!(input.user, None);
        assert_eq!(input.image_tag, None);
    }
}
