//! Worker configuration
//!
//! Everything comes from the process environment, injected by the
//! dispatcher through the launcher. The worker sources no secrets itself.

use secrecy::SecretString;

use skiff_platform::bus::client::{BusAddress, BusCredentials};
use skiff_platform::env as env_keys;
use skiff_platform::errors::PlatformError;
use skiff_platform::store::StoreAddress;

/// Default build command for cloned projects
const DEFAULT_BUILD_COMMAND: &str = "npm install && npm run build";

/// Default output directory, relative to the checkout
const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Default bound on concurrent uploads
const DEFAULT_UPLOAD_CONCURRENCY: usize = 8;

/// Build worker configuration
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Deployment this worker builds
    pub deployment_id: String,

    /// Repository to clone
    pub git_url: String,

    /// Artifact store endpoint
    pub store: StoreAddress,

    /// Bus broker the log stream is published on
    pub bus: BusAddress,

    /// Shell command producing the output tree
    pub build_command: String,

    /// Output directory relative to the checkout
    pub output_dir: String,

    /// Bound on concurrent uploads
    pub upload_concurrency: usize,
}

impl BuilderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, PlatformError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlatformError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| PlatformError::ConfigError(format!("{} is not set", key)))
        };

        let deployment_id = require(env_keys::DEPLOYMENT_ID)?;
        let git_url = require(env_keys::GIT_REPO_URL)?;

        let store = StoreAddress {
            base_url: require(env_keys::STORE_BASE_URL)?,
            access_token: lookup(env_keys::STORE_ACCESS_TOKEN).map(SecretString::from),
        };

        let credentials = match (
            lookup(env_keys::BUS_USERNAME),
            lookup(env_keys::BUS_PASSWORD),
        ) {
            (Some(username), Some(password)) => Some(BusCredentials {
                username,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        let bus = BusAddress {
            host: require(env_keys::BUS_HOST)?,
            port: lookup(env_keys::BUS_PORT)
                .and_then(|port| port.parse().ok())
                .unwrap_or(1883),
            use_tls: lookup(env_keys::BUS_TLS).map(|value| value == "true").unwrap_or(false),
            ca_cert_path: lookup(env_keys::BUS_CA_CERT),
            credentials,
        };

        Ok(Self {
            deployment_id,
            git_url,
            store,
            bus,
            build_command: lookup(env_keys::BUILD_COMMAND)
                .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string()),
            output_dir: lookup(env_keys::OUTPUT_DIR)
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        })
    }
}
