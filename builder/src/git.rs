//! Repository checkout

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use skiff_platform::errors::PlatformError;

/// Shallow-clone a repository into the target directory
pub async fn clone_repository(repo_url: &str, target_dir: &Path) -> Result<(), PlatformError> {
    info!("Cloning repository: {} to {}", repo_url, target_dir.display());

    debug!("Running git clone...");
    let status = Command::new("git")
        .args(["clone", "--depth", "1", repo_url])
        .arg(target_dir)
        .status()
        .await
        .map_err(|e| PlatformError::BuildError(format!("Failed to run git clone: {}", e)))?;

    if !status.success() {
        return Err(PlatformError::BuildError("Git clone failed".to_string()));
    }

    info!("Successfully cloned repository");
    Ok(())
}
