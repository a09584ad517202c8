//! Build command execution

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use skiff_platform::errors::PlatformError;

use crate::reporter::BuildReporter;

/// Outcome of the build command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildStatus {
    pub success: bool,
}

/// Run the project's build command, streaming every stdout and stderr line
/// to the reporter as it appears. A nonzero exit is reported, not fatal:
/// whatever output exists is still uploaded afterwards.
pub async fn run_build(
    build_command: &str,
    checkout_dir: &Path,
    reporter: &BuildReporter,
) -> Result<BuildStatus, PlatformError> {
    info!("Running build command: {}", build_command);
    reporter.line(format!("Running build: {}", build_command)).await;

    let mut child = Command::new("sh")
        .args(["-c", build_command])
        .current_dir(checkout_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PlatformError::BuildError(format!("Failed to spawn build command: {}", e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PlatformError::BuildError("Failed to capture build stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| PlatformError::BuildError("Failed to capture build stderr".to_string()))?;

    let stream_stdout = async {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            reporter.line(line).await;
        }
    };
    let stream_stderr = async {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            reporter.line(format!("[stderr] {}", line)).await;
        }
    };

    // Both pipes drain while the build runs, so waiting afterwards cannot
    // deadlock on a full pipe
    tokio::join!(stream_stdout, stream_stderr);

    let status = child
        .wait()
        .await
        .map_err(|e| PlatformError::BuildError(format!("Failed to wait for build command: {}", e)))?;

    if status.success() {
        reporter.line("Build complete").await;
    } else {
        reporter
            .line(format!(
                "Build command failed ({}); uploading whatever output exists",
                status
            ))
            .await;
    }

    Ok(BuildStatus {
        success: status.success(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_platform::bus::client::{BusAddress, BusClient};

    // The publisher is never polled in tests; publishes queue locally and
    // the reporter swallows any publish error.
    fn test_reporter() -> (BusClient, BuildReporter) {
        let address = BusAddress {
            host: "localhost".to_string(),
            ..Default::default()
        };
        let bus = BusClient::connect(&address, "skiff-build-test").unwrap();
        let reporter = BuildReporter::new(bus.log_publisher(), "dep-1");
        (bus, reporter)
    }

    #[tokio::test]
    async fn test_successful_build() {
        let dir = tempfile::tempdir().unwrap();
        let (_bus, reporter) = test_reporter();

        let status = run_build("echo building && echo done", dir.path(), &reporter)
            .await
            .unwrap();
        assert!(status.success);
    }

    #[tokio::test]
    async fn test_failing_build_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (_bus, reporter) = test_reporter();

        let status = run_build("echo oops 1>&2; exit 3", dir.path(), &reporter)
            .await
            .unwrap();
        assert!(!status.success);
    }
}
