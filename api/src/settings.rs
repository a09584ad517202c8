//! Settings file management

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use skiff_platform::bus::client::{BusAddress, BusCredentials};
use skiff_platform::errors::PlatformError;
use skiff_platform::logs::LogLevel;
use skiff_platform::store::StoreAddress;

use crate::app::options::AppOptions;
use crate::launcher::{LauncherOptions, WorkerConfig};
use crate::server::serve::ServerOptions;
use crate::server::state::DispatchOptions;
use crate::workers::subscriber;

/// API service settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Bus broker configuration
    #[serde(default)]
    pub bus: BusSettings,

    /// Artifact store configuration
    #[serde(default)]
    pub store: StoreSettings,

    /// Worker launcher configuration
    #[serde(default)]
    pub launcher: LauncherSettings,

    /// Dispatch configuration
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Relay configuration
    #[serde(default)]
    pub relay: RelaySettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &str) -> Result<Self, PlatformError> {
        let raw = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&raw)?;
        Ok(settings)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    9000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Bus broker settings
#[derive(Debug, Clone, Deserialize)]
pub struct BusSettings {
    /// Broker host
    #[serde(default)]
    pub host: String,

    /// Broker port
    #[serde(default = "default_bus_port")]
    pub port: u16,

    /// Use TLS
    #[serde(default)]
    pub tls: bool,

    /// Optional path to a PEM-encoded CA certificate for broker TLS
    /// verification. When absent, the system certificate store is used.
    #[serde(default)]
    pub ca_cert_path: Option<String>,

    /// Optional broker username
    #[serde(default)]
    pub username: Option<String>,

    /// Optional broker password
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Reconnect delay in seconds
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Max reconnect attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_bus_port() -> u16 {
    1883
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            port: default_bus_port(),
            tls: false,
            ca_cert_path: None,
            username: None,
            password: None,
            reconnect_delay_secs: default_reconnect_delay_secs(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl BusSettings {
    fn to_address(&self) -> BusAddress {
        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(BusCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        BusAddress {
            host: self.host.clone(),
            port: self.port,
            use_tls: self.tls,
            ca_cert_path: self.ca_cert_path.clone(),
            credentials,
        }
    }
}

/// Artifact store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Store base URL
    #[serde(default = "default_store_base_url")]
    pub base_url: String,

    /// Optional bearer token for store writes
    #[serde(default)]
    pub access_token: Option<SecretString>,
}

fn default_store_base_url() -> String {
    "http://localhost:9100/skiff".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
            access_token: None,
        }
    }
}

/// Worker launcher settings
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherSettings {
    /// Container image holding the build worker
    #[serde(default = "default_builder_image")]
    pub image: String,

    /// Optional build command override passed to workers
    #[serde(default)]
    pub build_command: Option<String>,

    /// Optional output directory override passed to workers
    #[serde(default)]
    pub output_dir: Option<String>,
}

fn default_builder_image() -> String {
    "skiff/builder:latest".to_string()
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            image: default_builder_image(),
            build_command: None,
            output_dir: None,
        }
    }
}

/// Dispatch settings
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Domain deployments are served under
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// Scheme used in predicted serving URLs
    #[serde(default = "default_public_scheme")]
    pub public_scheme: String,
}

fn default_base_domain() -> String {
    "localhost:8000".to_string()
}

fn default_public_scheme() -> String {
    "http".to_string()
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            public_scheme: default_public_scheme(),
        }
    }
}

/// Relay settings
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Per-deployment viewer fan-out buffer size
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_channel_buffer() -> usize {
    256
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl From<Settings> for AppOptions {
    fn from(settings: Settings) -> Self {
        let bus = settings.bus.to_address();

        AppOptions {
            server: ServerOptions {
                host: settings.server.host,
                port: settings.server.port,
            },
            subscriber: subscriber::Options {
                bus: bus.clone(),
                reconnect_delay: Duration::from_secs(settings.bus.reconnect_delay_secs),
                max_reconnect_attempts: settings.bus.max_reconnect_attempts,
            },
            launcher: LauncherOptions {
                image: settings.launcher.image,
                worker: WorkerConfig {
                    store: StoreAddress {
                        base_url: settings.store.base_url,
                        access_token: settings.store.access_token,
                    },
                    bus,
                    build_command: settings.launcher.build_command,
                    output_dir: settings.launcher.output_dir,
                },
            },
            dispatch: DispatchOptions {
                base_domain: settings.dispatch.base_domain,
                public_scheme: settings.dispatch.public_scheme,
            },
            relay_buffer: settings.relay.channel_buffer,
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.bus.port, 1883);
        assert_eq!(settings.dispatch.base_domain, "localhost:8000");
        assert_eq!(settings.relay.channel_buffer, 256);
    }

    #[test]
    fn test_settings_to_options_carries_bus_credentials() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "bus": {"host": "bus.local", "username": "api", "password": "hunter2"},
                "dispatch": {"base_domain": "skiff.dev"}
            }"#,
        )
        .unwrap();

        let options: AppOptions = settings.into();
        assert_eq!(options.subscriber.bus.host, "bus.local");
        assert!(options.subscriber.bus.credentials.is_some());
        assert_eq!(options.dispatch.base_domain, "skiff.dev");
        // The launcher hands workers the same bus it subscribes on
        assert_eq!(options.launcher.worker.bus.host, "bus.local");
    }
}
