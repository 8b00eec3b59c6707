use async_trait::async_trait;

use crate::config::ProvisionConfig;
use crate::process::CommandRunner;
use crate::provision::engine::{
    Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind, field, password,
};
use crate::provision::engines::launch;
use crate::provision::error::Result;
use crate::provision::request::{ProvisionRequest, docker_env};

const PORT: u16 = 5432;

/// PostgreSQL, see <https://hub.docker.com/_/postgres>.
#[derive(Debug, Clone)]
pub struct Postgres {
    docker_bin: String,
}

impl Postgres {
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            docker_bin: config.docker_bin.clone(),
        }
    }

    fn run_args(&self, request: &ProvisionRequest) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--name".to_string(),
            request.container_name.clone(),
            "-e".to_string(),
            docker_env("POSTGRES_PASSWORD", password(request)),
            "-e".to_string(),
            docker_env("POSTGRES_USER", field(&request.user)),
            "-e".to_string(),
            docker_env("POSTGRES_DB", field(&request.database)),
        ];
        args.extend(request.port_args(PORT));
        args.push("-d".to_string());
        args.push(format!("postgres:{}", request.image_tag));
        args
    }
}

#[async_trait]
impl Engine for Postgres {
    fn kind(&self) -> EngineKind {
        EngineKind::Postgres
    }

    fn default_settings(&self) -> DefaultSettings {
        DefaultSettings {
            user: Some("postgres"),
            image_tag: "latest",
            port: PORT,
            password: Some("postgres"),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            database_name: true,
            user_password: true,
        }
    }

    async fn create(
        &self,
        runner: &dyn CommandRunner,
        request: &ProvisionRequest,
    ) -> Result<CreatedContainer> {
        launch(runner, &self.docker_bin, request, self.run_args(request)).await
    }
}
