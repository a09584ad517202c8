//! Build worker launcher
//!
//! The dispatcher owns the store and bus credentials; a launch injects them
//! into the worker's environment so the worker never sources them itself.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tracing::{debug, info};

use skiff_platform::bus::client::BusAddress;
use skiff_platform::env as worker_env;
use skiff_platform::errors::PlatformError;
use skiff_platform::models::LaunchSpec;
use skiff_platform::store::StoreAddress;

/// Starts an isolated, disposable build environment for one deployment.
/// Fire-and-forget: acceptance of the launch says nothing about the build.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, spec: &LaunchSpec) -> Result<(), PlatformError>;
}

/// Configuration injected into every launched worker
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    /// Artifact store the worker uploads to
    pub store: StoreAddress,

    /// Bus the worker publishes its log stream on
    pub bus: BusAddress,

    /// Optional build command override
    pub build_command: Option<String>,

    /// Optional output directory override
    pub output_dir: Option<String>,
}

/// Launcher configuration
#[derive(Debug, Clone)]
pub struct LauncherOptions {
    /// Container image holding the build worker
    pub image: String,

    /// Configuration passed through to the worker
    pub worker: WorkerConfig,
}

impl Default for LauncherOptions {
    fn default() -> Self {
        Self {
            image: "skiff/builder:latest".to_string(),
            worker: WorkerConfig::default(),
        }
    }
}

/// Launches workers as disposable local containers
pub struct DockerLauncher {
    options: LauncherOptions,
}

impl DockerLauncher {
    pub fn new(options: LauncherOptions) -> Self {
        Self { options }
    }

    fn worker_environment(&self, spec: &LaunchSpec) -> Vec<(&'static str, String)> {
        let worker = &self.options.worker;
        let mut environment = vec![
            (worker_env::DEPLOYMENT_ID, spec.deployment_id.clone()),
            (worker_env::GIT_REPO_URL, spec.git_url.clone()),
            (worker_env::STORE_BASE_URL, worker.store.base_url.clone()),
            (worker_env::BUS_HOST, worker.bus.host.clone()),
            (worker_env::BUS_PORT, worker.bus.port.to_string()),
            (worker_env::BUS_TLS, worker.bus.use_tls.to_string()),
        ];

        if let Some(token) = &worker.store.access_token {
            environment.push((worker_env::STORE_ACCESS_TOKEN, token.expose_secret().to_string()));
        }
        if let Some(credentials) = &worker.bus.credentials {
            environment.push((worker_env::BUS_USERNAME, credentials.username.clone()));
            environment.push((worker_env::BUS_PASSWORD, credentials.password.expose_secret().to_string()));
        }
        if let Some(ca_cert_path) = &worker.bus.ca_cert_path {
            environment.push((worker_env::BUS_CA_CERT, ca_cert_path.clone()));
        }
        if let Some(build_command) = &worker.build_command {
            environment.push((worker_env::BUILD_COMMAND, build_command.clone()));
        }
        if let Some(output_dir) = &worker.output_dir {
            environment.push((worker_env::OUTPUT_DIR, output_dir.clone()));
        }

        environment
    }
}

#[async_trait]
impl Launcher for DockerLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> Result<(), PlatformError> {
        let container_name = format!("skiff-build-{}", spec.deployment_id);
        debug!("Launching container: {}", container_name);

        let mut command = Command::new("docker");
        command.args(["run", "-d", "--rm", "--name", &container_name]);
        for (key, value) in self.worker_environment(spec) {
            command.args(["-e", &format!("{}={}", key, value)]);
        }
        command.arg(&self.options.image);

        let status = command
            .status()
            .await
            .map_err(|e| PlatformError::LaunchError(format!("Failed to run docker run: {}", e)))?;

        if !status.success() {
            return Err(PlatformError::LaunchError(format!(
                "Docker run failed for {}",
                spec.deployment_id
            )));
        }

        info!("Launched build worker for {}", spec.deployment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_worker_environment_includes_identity_and_secrets() {
        let mut options = LauncherOptions::default();
        options.worker.store.base_url = "http://store.local:9100/skiff".to_string();
        options.worker.store.access_token = Some(SecretString::from("s3cret".to_string()));
        options.worker.bus.host = "bus.local".to_string();

        let launcher = DockerLauncher::new(options);
        let spec = LaunchSpec {
            deployment_id: "my-site".to_string(),
            git_url: "https://github.com/acme/site.git".to_string(),
        };

        let environment = launcher.worker_environment(&spec);
        let get = |key: &str| {
            environment
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(get("DEPLOYMENT_ID").as_deref(), Some("my-site"));
        assert_eq!(get("GIT_REPO_URL").as_deref(), Some("https://github.com/acme/site.git"));
        assert_eq!(get("STORE_ACCESS_TOKEN").as_deref(), Some("s3cret"));
        assert_eq!(get("BUS_HOST").as_deref(), Some("bus.local"));
        // No credentials configured for the bus, none injected
        assert_eq!(get("BUS_USERNAME"), None);
    }
}
