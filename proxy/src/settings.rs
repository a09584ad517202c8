//! Settings file management

use serde::Deserialize;

use skiff_platform::errors::PlatformError;
use skiff_platform::logs::LogLevel;

/// Proxy service settings
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

    /// Artifact store configuration
    #[serde(default)]
    pub store: StoreSettings,
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
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Artifact store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Store base URL the proxy reads from
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
}

fn default_store_base_url() -> String {
    "http://localhost:9100/skiff".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.store.base_url, "http://localhost:9100/skiff");
    }

    #[test]
    fn test_settings_overrides() {
        let settings: Settings = serde_json::from_str(
            r#"{"server": {"port": 80}, "store": {"base_url": "https://cdn.example.com/out"}}"#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 80);
        assert_eq!(settings.store.base_url, "https://cdn.example.com/out");
    }
}
