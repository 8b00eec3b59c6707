//! Turns command-line input into a [`ProvisionRequest`] and hands it to
//! the selected engine.
//!
//! Merge order: explicit input, then wizard answers (interactive only),
//! then engine defaults. An explicit password is checked against the
//! engine policy before anything is prompted, and the final password is
//! checked again before any process runs.

use secrecy::{ExposeSecret, SecretString};

use crate::process::CommandRunner;
use crate::provision::engine::{CreatedContainer, Engine, EngineKind};
use crate::provision::error::{ProvisionError, Result};
use crate::provision::names;
use crate::provision::request::ProvisionRequest;

/// Database name used when none is given.
pub const DEFAULT_DATABASE: &str = "db";

/// Validation hook handed to a [`Prompter`]. The error is shown to the user.
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Source of answers for values the caller left out.
///
/// An empty answer means "use the placeholder", and is never validated.
/// Implementations re-ask until `validate` accepts the answer.
pub trait Prompter {
    fn select_engine(&mut self, choices: &[EngineKind]) -> Result<EngineKind>;

    fn ask(&mut self, question: &str, placeholder: &str, validate: Validator<'_>) -> Result<String>;

    /// Like [`ask`](Self::ask), without echoing the input.
    fn ask_password(
        &mut self,
        question: &str,
        placeholder: &str,
        validate: Validator<'_>,
    ) -> Result<String>;
}

/// Options as supplied on the command line. `None` means "not given".
#[derive(Debug, Default)]
pub struct ProvisionInput {
    pub engine: Option<EngineKind>,
    pub container_name: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    /// Host bindings (`[IP:]PORT`).
    pub ports: Vec<String>,
    /// Bind the default port on all interfaces instead of loopback.
    pub public: bool,
    pub image_tag: Option<String>,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Pick the engine: explicit choice, otherwise ask.
///
/// `prompter` is `None` in non-interactive mode.
pub fn select_engine(
    requested: Option<EngineKind>,
    prompter: Option<&mut dyn Prompter>,
) -> Result<EngineKind> {
    if let Some(kind) = requested {
        return Ok(kind);
    }
    match prompter {
        Some(prompter) => prompter.select_engine(&EngineKind::ALL),
        None => Err(ProvisionError::MissingParameter {
            name: "database type",
            hint: "must supply database type (--type) in non-interactive mode".to_string(),
        }),
    }
}

/// Merge `input` with wizard answers and `engine` defaults.
pub fn resolve(
    engine: &dyn Engine,
    input: ProvisionInput,
    mut prompter: Option<&mut dyn Prompter>,
) -> Result<ProvisionRequest> {
    let defaults = engine.default_settings();
    let caps = engine.capabilities();
    let interactive = prompter.is_some();

    let mut ports = input.ports;
    if ports.is_empty() {
        ports.push(if input.public {
            defaults.port.to_string()
        } else {
            format!("127.0.0.1:{}", defaults.port)
        });
    }
    let image_tag = input
        .image_tag
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| defaults.image_tag.to_string());

    if let Some(password) = &input.password {
        engine.validate_password(password.expose_secret())?;
    }

    let fallback_name = names::generate();
    let mut database = input.database;
    let mut user = input.user;
    let mut password = input.password;
    let mut container_name = input.container_name;

    if let Some(prompter) = prompter.as_deref_mut() {
        if caps.database_name && database.is_none() {
            database = answered(prompter.ask("Database name?", DEFAULT_DATABASE, &accept_any)?);
        }
        if caps.user_password {
            if user.is_none() {
                let placeholder = defaults.user.unwrap_or_default();
                user = answered(prompter.ask("Database user?", placeholder, &accept_any)?);
            }
            if password.is_none() {
                let placeholder = defaults.password.unwrap_or_default();
                let check = |value: &str| engine.validate_password(value).map_err(|e| e.to_string());
                let value = prompter.ask_password("Database password?", placeholder, &check)?;
                password = (!value.is_empty()).then(|| SecretString::from(value));
            }
        }
        if container_name.is_none() {
            container_name = answered(prompter.ask(
                "Container name?",
                &fallback_name,
                &names::validate_container_name,
            )?);
        }
    }

    let mut user = user.or_else(|| defaults.user.map(str::to_string));
    let mut password = password.or_else(|| defaults.password.map(|p| SecretString::from(p.to_string())));
    let container_name = container_name.unwrap_or(fallback_name);

    let database = if caps.database_name {
        Some(database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()))
    } else {
        if database.is_some() {
            tracing::warn!(
                engine = %engine.kind(),
                "This DB type doesn't support database name, so provided argument is ignored"
            );
        }
        None
    };

    if caps.user_password {
        let how = if interactive {
            "no default exists for this DB type; pass it as an argument or answer the prompt"
        } else {
            "required in non-interactive mode, but not provided"
        };
        if user.is_none() {
            return Err(ProvisionError::MissingParameter {
                name: "db username",
                hint: how.to_string(),
            });
        }
        if password.is_none() {
            return Err(ProvisionError::MissingParameter {
                name: "password",
                hint: how.to_string(),
            });
        }
    } else {
        if user.take().is_some() {
            tracing::warn!(
                engine = %engine.kind(),
                "This DB type doesn't support user/password for its auth, so provided username argument is ignored"
            );
        }
        if password.take().is_some() {
            tracing::warn!(
                engine = %engine.kind(),
                "This DB type doesn't support user/password for its auth, so provided password argument is ignored"
            );
        }
    }

    if let Some(password) = &password {
        engine.validate_password(password.expose_secret())?;
    }

    Ok(ProvisionRequest {
        container_name,
        database,
        user,
        password,
        ports,
        image_tag,
        verbose: input.verbose,
        dry_run: input.dry_run,
    })
}

/// Create the container described by `request`.
pub async fn provision(
    engine: &dyn Engine,
    runner: &dyn CommandRunner,
    request: &ProvisionRequest,
) -> Result<CreatedContainer> {
    tracing::info!(
        engine = %engine.kind(),
        container = %request.container_name,
        tag = %request.image_tag,
        "Provisioning container"
    );
    engine.create(runner, request).await
}

fn accept_any(_: &str) -> std::result::Result<(), String> {
    Ok(())
}

fn answered(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
