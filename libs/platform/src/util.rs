//! Utility functions

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Version information for a service binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Generate a deployment slug. UUIDv4 makes collisions negligible; the
/// dispatcher does not actively check for them.
pub fn generate_slug() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Infer the MIME type for an artifact from its file extension
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
