//! Docker availability check with platform-specific guidance.
//!
//! Checks whether the Docker CLI is installed (binary on PATH) and whether
//! it can reach a daemon (`docker version` reports a server version), and
//! provides installation or startup instructions when it cannot.

use std::process::Stdio;

use tokio::process::Command;

/// Docker availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerStatus {
    /// CLI found and daemon responding.
    Available,
    /// Docker binary not found on PATH.
    NotInstalled,
    /// Binary found but daemon not responding.
    NotRunning,
}

impl DockerStatus {
    /// Returns true if Docker is available and ready.
    pub fn is_ok(&self) -> bool {
        matches!(self, DockerStatus::Available)
    }

    /// Human-readable status string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DockerStatus::Available => "available",
            DockerStatus::NotInstalled => "not installed",
            DockerStatus::NotRunning => "not running",
        }
    }
}

/// Host platform for install guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
}

impl Platform {
    /// Detect the current platform.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Linux,
        }
    }

    /// Installation instructions for Docker on this platform.
    pub fn install_hint(&self) -> &'static str {
        match self {
            Platform::MacOS => {
                "Install Docker Desktop: https://docs.docker.com/desktop/install/mac-install/"
            }
            Platform::Linux => "Install Docker Engine: https://docs.docker.com/engine/install/",
            Platform::Windows => {
                "Install Docker Desktop: https://docs.docker.com/desktop/install/windows-install/"
            }
        }
    }

    /// Instructions to start the Docker daemon on this platform.
    pub fn start_hint(&self) -> &'static str {
        match self {
            Platform::MacOS => "Start Docker Desktop from Applications, or run: open -a Docker",
            Platform::Linux => "Start the Docker daemon: sudo systemctl start docker",
            Platform::Windows => "Start Docker Desktop from the Start menu",
        }
    }
}

/// Result of a Docker detection check.
pub struct DockerDetection {
    pub status: DockerStatus,
    pub platform: Platform,
}

impl DockerDetection {
    /// Guidance for the user when Docker is not usable, `None` otherwise.
    pub fn hint(&self) -> Option<&'static str> {
        match self.status {
            DockerStatus::Available => None,
            DockerStatus::NotInstalled => Some(self.platform.install_hint()),
            DockerStatus::NotRunning => Some(self.platform.start_hint()),
        }
    }
}

/// Check whether `docker_bin` is installed and can reach its daemon.
pub async fn check_docker(docker_bin: &str) -> DockerDetection {
    let platform = Platform::current();

    if !binary_exists(docker_bin).await {
        return DockerDetection {
            status: DockerStatus::NotInstalled,
            platform,
        };
    }

    let status = if daemon_reachable(docker_bin).await {
        DockerStatus::Available
    } else {
        DockerStatus::NotRunning
    };
    tracing::debug!(docker_bin, status = status.as_str(), "Docker detection finished");

    DockerDetection { status, platform }
}

/// Check if the binary exists on PATH.
async fn binary_exists(bin: &str) -> bool {
    let locator = if cfg!(windows) { "where" } else { "which" };
    quiet_success(Command::new(locator).arg(bin)).await
}

/// `docker version` requires daemon reachability for server fields.
async fn daemon_reachable(bin: &str) -> bool {
    quiet_success(Command::new(bin).args(["version", "--format", "{{.Server.Version}}"])).await
}

async fn quiet_success(command: &mut Command) -> bool {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .is_ok_and(|s| s.success())
}
