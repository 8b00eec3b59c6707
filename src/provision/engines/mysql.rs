use async_trait::async_trait;

use crate::config::ProvisionConfig;
use crate::process::CommandRunner;
use crate::provision::engine::{
    Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind, field, password,
};
use crate::provision::engines::launch;
use crate::provision::error::Result;
use crate::provision::request::{ProvisionRequest, docker_env};

const PORT: u16 = 3306;

/// MySQL, see <https://hub.docker.com/_/mysql>.
#[derive(Debug, Clone)]
pub struct MySql {
    docker_bin: String,
}

impl MySql {
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            docker_bin: config.docker_bin.clone(),
        }
    }

    fn run_args(&self, request: &ProvisionRequest) -> Vec<String> {
        let password = password(request);
        let mut args = vec![
            "run".to_string(),
            "--name".to_string(),
            request.container_name.clone(),
            "-e".to_string(),
            docker_env("MYSQL_USER", field(&request.user)),
            "-e".to_string(),
            docker_env("MYSQL_ROOT_PASSWORD", password),
            "-e".to_string(),
            docker_env("MYSQL_PASSWORD", password),
            "-e".to_string(),
            docker_env("MYSQL_DATABASE", field(&request.database)),
        ];
        args.extend(request.port_args(PORT));
        args.push("-d".to_string());
        args.push(format!("mysql:{}", request.image_tag));
        args
    }
}

#[async_trait]
impl Engine for MySql {
    fn kind(&self) -> EngineKind {
        EngineKind::Mysql
    }

    fn default_settings(&self) -> DefaultSettings {
        DefaultSettings {
            user: Some("mysql"),
            image_tag: "lts",
            port: PORT,
            password: None,
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
