//! dockdb - main entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dockdb::cli::{Cli, ExitStatus, Wizard, write_completions};
use dockdb::config::ProvisionConfig;
use dockdb::process::{CommandRunner, DryRunRunner, ShellRunner, check_docker};
use dockdb::provision::{
    CreatedContainer, Engine, Prompter, ProvisionRequest, provision, resolve,
    select_engine,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        write_completions(shell, &mut std::io::stdout());
        return ExitStatus::Success.into();
    }

    // Load .env if present
    let _ = dotenvy::dotenv();

    let default_filter = if cli.verbose { "dockdb=debug" } else { "dockdb=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    run(cli).await.into()
}

async fn run(cli: Cli) -> ExitStatus {
    let config = match ProvisionConfig::resolve().context("Invalid configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitStatus::InvalidOptions;
        }
    };

    if !cli.dry {
        let detection = check_docker(&config.docker_bin).await;
        if let Some(hint) = detection.hint() {
            eprintln!(
                "Error: '{}' is {}.",
                config.docker_bin,
                detection.status.as_str()
            );
            eprintln!("{hint}");
            eprintln!("Run with --dry flag to see commands without requiring Docker.");
            return ExitStatus::DockerNotFound;
        }
    }

    let mut wizard = if cli.non_interactive {
        None
    } else {
        match Wizard::new() {
            Ok(wizard) => Some(wizard),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitStatus::InvalidOptions;
            }
        }
    };

    let (engine, request) = match resolve_request(&cli, &config, &mut wizard) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitStatus::InvalidOptions;
        }
    };

    let runner: Box<dyn CommandRunner> = if request.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ShellRunner::new(request.verbose))
    };

    let created = provision(engine.as_ref(), runner.as_ref(), &request)
        .await
        .with_context(|| format!("Failed to create container '{}'", request.container_name));
    match created {
        Ok(created) => {
            if !request.dry_run {
                print_summary(&created, &request);
            }
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitStatus::CreateFailed
        }
    }
}

fn resolve_request(
    cli: &Cli,
    config: &ProvisionConfig,
    wizard: &mut Option<Wizard>,
) -> anyhow::Result<(Box<dyn Engine>, ProvisionRequest)> {
    let kind =
        select_engine(cli.engine, prompter(wizard)).context("Failed to select database type")?;
    let engine = kind.engine(config);
    let request = resolve(engine.as_ref(), cli.to_input(), prompter(wizard))
        .with_context(|| format!("Invalid options for {kind}"))?;
    Ok((engine, request))
}

fn prompter(wizard: &mut Option<Wizard>) -> Option<&mut dyn Prompter> {
    wizard.as_mut().map(|w| w as &mut dyn Prompter)
}

fn print_summary(created: &CreatedContainer, request: &ProvisionRequest) {
    println!("Container '{}' is running ({})", created.name, created.id);
    if let Some(database) = &request.database {
        println!("  database: {database}");
    }
    if let Some(user) = &request.user {
        println!("  user:     {user}");
    }
    for port in &request.ports {
        println!("  port:     {port}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_is_reported_with_context() {
        let cli = Cli::try_parse_from(["dockdb", "-n"]).unwrap();
        let err = resolve_request(&cli, &ProvisionConfig::default(), &mut None)
            .err()
            .unwrap();

        let message = format!("{err:#}");
        assert!(message.starts_with("Failed to select database type: "));
        assert!(message.contains("--type"));
    }

    #[test]
    fn test_resolved_request_for_explicit_type() {
        let cli = Cli::try_parse_from(["dockdb", "-n", "-t", "redis", "cache"]).unwrap();
        let (engine, request) =
            resolve_request(&cli, &ProvisionConfig::default(), &mut None).unwrap();

        assert_eq!(engine.kind().to_string(), "redis");
        assert_eq!(request.container_name, "cache");
    }

    #[test]
    fn test_policy_violation_names_the_engine() {
        let cli = Cli::try_parse_from(["dockdb", "-n", "-t", "mssql", "-p", "short"]).unwrap();
        let err = resolve_request(&cli, &ProvisionConfig::default(), &mut None)
            .err()
            .unwrap();

        assert!(format!("{err:#}").starts_with("Invalid options for mssql: "));
    }
}
