//! Resolved provisioning parameters.

use secrecy::SecretString;

/// Everything an engine needs to create its container.
///
/// Built by the coordinator after merging explicit input, wizard answers and
/// engine defaults. Fields an engine does not support are `None`.
#[derive(Debug)]
pub struct ProvisionRequest {
    pub container_name: String,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    /// Host side of each port mapping, with optional IP (`127.0.0.1:5432`).
    pub ports: Vec<String>,
    pub image_tag: String,
    pub verbose: bool,
    pub dry_run: bool,
}

impl ProvisionRequest {
    /// `-p HOST:CONTAINER` arguments for every requested binding.
    pub fn port_args(&self, container_port: u16) -> Vec<String> {
        self.ports
            .iter()
            .flat_map(|binding| ["-p".to_string(), format!("{binding}:{container_port}")])
            .collect()
    }
}

/// `KEY=value` for `docker run -e`.
pub fn docker_env(key: &str, value: &str) -> String {
    format!("{key}={value}")
}
