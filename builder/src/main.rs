//! Skiff Build Worker - Entry Point
//!
//! One process per deployment, inside the disposable environment started by
//! the dispatcher: clone the project, stream build output onto the bus,
//! upload the output tree to the artifact store, publish the terminal
//! completion message, exit.

use std::path::Path;
use std::process::ExitCode;

use skiff_builder::build::{run_build, BuildStatus};
use skiff_builder::config::BuilderConfig;
use skiff_builder::git::clone_repository;
use skiff_builder::output::collect_artifacts;
use skiff_builder::reporter::BuildReporter;
use skiff_builder::upload::upload_artifacts;
use skiff_platform::bus::client::BusClient;
use skiff_platform::errors::PlatformError;
use skiff_platform::logs::{init_logging, LogOptions};
use skiff_platform::store::ObjectStore;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging(LogOptions::default()) {
        println!("Failed to initialize logging: {e}");
    }

    let config = match BuilderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid worker configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Build worker failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: BuilderConfig) -> Result<(), PlatformError> {
    let client_id = format!("skiff-builder-{}", config.deployment_id);
    let bus = BusClient::connect(&config.bus, &client_id)?;
    let publisher = bus.log_publisher();

    // The event loop must be polled for queued publishes to reach the broker
    let driver = tokio::spawn(bus.drive());

    let reporter = BuildReporter::new(publisher.clone(), &config.deployment_id);
    let store = ObjectStore::new(&config.store)?;

    let checkout = std::env::temp_dir()
        .join(format!("skiff-build-{}", config.deployment_id))
        .join("source");

    let success = execute(&config, &reporter, &store, &checkout).await;
    reporter.finished(success).await;

    // Flush queued messages, then let the driver wind down
    let _ = publisher.disconnect().await;
    let _ = driver.await;

    info!("Build worker finished for {}", config.deployment_id);
    Ok(())
}

/// Clone, build and upload. Returns overall success; every failure along
/// the way is reported on the log stream rather than bubbled up, so the
/// terminal message is always published.
async fn execute(
    config: &BuilderConfig,
    reporter: &BuildReporter,
    store: &ObjectStore,
    checkout: &Path,
) -> bool {
    reporter.line(format!("Starting build for {}", config.git_url)).await;

    if let Err(e) = clone_repository(&config.git_url, checkout).await {
        reporter.line(format!("Clone failed: {}", e)).await;
        return false;
    }

    let build_status = match run_build(&config.build_command, checkout, reporter).await {
        Ok(status) => status,
        Err(e) => {
            // The command never ran; there may still be committed output
            // worth uploading
            reporter.line(format!("Build could not run: {}", e)).await;
            BuildStatus { success: false }
        }
    };

    let output_root = checkout.join(&config.output_dir);
    let artifacts = match collect_artifacts(&output_root).await {
        Ok(artifacts) => artifacts,
        Err(e) => {
            reporter
                .line(format!("No build output at {}: {}", output_root.display(), e))
                .await;
            return false;
        }
    };

    reporter.line(format!("Uploading {} file(s)", artifacts.len())).await;
    let summary = upload_artifacts(
        store,
        reporter,
        &config.deployment_id,
        &artifacts,
        config.upload_concurrency,
    )
    .await;
    reporter
        .line(format!(
            "Upload complete: {} uploaded, {} failed",
            summary.uploaded, summary.failed
        ))
        .await;

    build_status.success && summary.failed == 0
}
