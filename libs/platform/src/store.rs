//! Artifact store client
//!
//! Content-addressable HTTP object storage. Every artifact of a deployment
//! is keyed `__outputs/{deploymentId}/{relativePath}`; objects are immutable
//! once written.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};

use crate::errors::PlatformError;

/// Prefix under which all build outputs are keyed
pub const OUTPUT_PREFIX: &str = "__outputs";

/// Store endpoint configuration
#[derive(Debug, Clone, Default)]
pub struct StoreAddress {
    /// Base URL of the store, e.g. the bucket endpoint
    pub base_url: String,

    /// Optional bearer token for writes
    pub access_token: Option<SecretString>,
}

/// Compute the store key for one artifact of a deployment.
/// Path separators are normalized to `/` regardless of platform.
pub fn object_key(deployment_id: &str, relative_path: &Path) -> String {
    let mut key = format!("{}/{}", OUTPUT_PREFIX, deployment_id);
    for component in relative_path.components() {
        key.push('/');
        key.push_str(&component.as_os_str().to_string_lossy());
    }
    key
}

/// Write side of the artifact store, mockable in tests
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Store one immutable object under the given key
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PlatformError>;
}

/// HTTP artifact store client
pub struct ObjectStore {
    client: Client,
    base_url: String,
    access_token: Option<SecretString>,
}

impl ObjectStore {
    /// Create a new store client
    pub fn new(address: &StoreAddress) -> Result<Self, PlatformError> {
        url::Url::parse(&address.base_url).map_err(|e| {
            PlatformError::ConfigError(format!("Invalid store base URL {}: {e}", address.base_url))
        })?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: address.base_url.trim_end_matches('/').to_string(),
            access_token: address.access_token.clone(),
        })
    }

    /// Absolute URL of one store object
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ObjectSink for ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PlatformError> {
        let url = self.object_url(key);
        debug!("PUT {}", url);

        let mut request = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes);

        if let Some(token) = &self.access_token {
            request = request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Store PUT failed: {} - {}", status, body);
            return Err(PlatformError::StoreError(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_object_key_flat_file() {
        let key = object_key("breezy-otter", Path::new("index.html"));
        assert_eq!(key, "__outputs/breezy-otter/index.html");
    }

    #[test]
    fn test_object_key_nested_file() {
        let relative: PathBuf = ["assets", "js", "app.js"].iter().collect();
        let key = object_key("breezy-otter", &relative);
        assert_eq!(key, "__outputs/breezy-otter/assets/js/app.js");
    }

    #[test]
    fn test_object_url_joins_base() {
        let store = ObjectStore::new(&StoreAddress {
            base_url: "http://store.local:9000/projects/".to_string(),
            access_token: None,
        })
        .unwrap();
        assert_eq!(
            store.object_url("__outputs/foo/index.html"),
            "http://store.local:9000/projects/__outputs/foo/index.html"
        );
    }
}
