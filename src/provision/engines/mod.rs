//! Engines whose setup is a single `docker run`.
//!
//! Each image initialises its own user and database from environment
//! variables, so there is nothing to do once the container is started.

mod mongo;
mod mysql;
mod postgres;
mod redis;

pub use mongo::Mongo;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use redis::Redis;

use crate::process::CommandRunner;
use crate::provision::engine::CreatedContainer;
use crate::provision::error::Result;
use crate::provision::request::ProvisionRequest;

/// Run `docker <args>` and capture the new container's identifier.
pub(crate) async fn launch(
    runner: &dyn CommandRunner,
    docker_bin: &str,
    request: &ProvisionRequest,
    args: Vec<String>,
) -> Result<CreatedContainer> {
    tracing::info!(
        container = %request.container_name,
        "Starting container (the image is pulled first if it is not present locally)"
    );
    let output = runner.run_tee(docker_bin, &args).await?;
    let created = CreatedContainer::from_run_output(&request.container_name, &output.stdout);
    tracing::info!(container = %created.name, id = %created.id, "Container started");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FAKE_CONTAINER_ID, ScriptedRunner};

    #[tokio::test]
    async fn test_launch_streams_docker_output() {
        let runner = ScriptedRunner::succeeding();
        let request = test_support::request();

        let created = launch(&runner, "docker", &request, vec!["run".to_string()])
            .await
            .unwrap();

        assert_eq!(created.id, FAKE_CONTAINER_ID);
        assert!(runner.calls()[0].streamed);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use secrecy::SecretString;

    use crate::provision::request::ProvisionRequest;

    pub fn request() -> ProvisionRequest {
        ProvisionRequest {
            container_name: "brave-heron".to_string(),
            database: Some("db".to_string()),
            user: Some("app".to_string()),
            password: Some(SecretString::from("s3cret".to_string())),
            ports: vec!["127.0.0.1:4000".to_string()],
            image_tag: "16".to_string(),
            verbose: false,
            dry_run: false,
        }
    }
}
