use async_trait::async_trait;

use crate::config::ProvisionConfig;
use crate::process::CommandRunner;
use crate::provision::engine::{
    Capabilities, CreatedContainer, DefaultSettings, Engine, EngineKind, field, password,
};
use crate::provision::engines::launch;
use crate::provision::error::Result;
use crate::provision::request::{ProvisionRequest, docker_env};

const PORT: u16 = 27017;

/// MongoDB, see <https://hub.docker.com/_/mongo>.
#[derive(Debug, Clone)]
pub struct Mongo {
    docker_bin: String,
}

impl Mongo {
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
            docker_env("MONGO_INITDB_ROOT_PASSWORD", password(request)),
            "-e".to_string(),
            docker_env("MONGO_INITDB_ROOT_USERNAME", field(&request.user)),
            "-e".to_string(),
            docker_env("MONGO_INITDB_DATABASE", field(&request.database)),
        ];
        args.extend(request.port_args(PORT));
        args.push("-d".to_string());
        args.push(format!("mongo:{}", request.image_tag));
        args
    }
}

#[async_trait]
impl Engine for Mongo {
    fn kind(&self) -> EngineKind {
        EngineKind::Mongo
    }

    fn default_settings(&self) -> DefaultSettings {
        DefaultSettings {
            user: Some("mongo"),
            image_tag: "latest",
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::provision::engines::test_support::request;
    use crate::testing::ScriptedRunner;

    #[tokio::test]
    async fn test_root_credentials_env() {
        let runner = ScriptedRunner::succeeding();
        Mongo::new(&ProvisionConfig::default())
            .create(&runner, &request())
            .await
            .unwrap();

        let args = &runner.calls()[0].args;
        assert_eq!(args[3..9], [
            "-e",
            "MONGO_INITDB_ROOT_PASSWORD=s3cret",
            "-e",
            "MONGO_INITDB_ROOT_USERNAME=app",
            "-e",
            "MONGO_INITDB_DATABASE=db",
        ]);
        assert_eq!(args.last().map(String::as_str), Some("mongo:16"));
    }
}
