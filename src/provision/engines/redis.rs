use async_trait::async_trait;

use crate::config::ProvisionConfig;
use crate::process::CommandRunner;
use crate::provision::engine::{Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind};
use crate::provision::engines::launch;
use crate::provision::error::Result;
use crate::provision::request::ProvisionRequest;

const PORT: u16 = 6379;

/// Redis, see <https://hub.docker.com/_/redis>. No auth, no named databases.
#[derive(Debug, Clone)]
pub struct Redis {
    docker_bin: String,
}

impl Redis {
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
        ];
        args.extend(request.port_args(PORT));
        args.push("-d".to_string());
        args.push(format!("redis:{}", request.image_tag));
        args.extend(
            ["redis-server", "--save", "60", "1", "--loglevel", "warning"].map(String::from),
        );
        args
    }
}

#[async_trait]
impl Engine for Redis {
    fn kind(&self) -> EngineKind {
        EngineKind::Redis
    }

    fn default_settings(&self) -> DefaultSettings {
        DefaultSettings {
            user: None,
            image_tag: "latest",
            port: PORT,
            password: None,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            database_name: false,
            user_password: false,
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
