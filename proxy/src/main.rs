//! Skiff Edge Router - Entry Point
//!
//! Reverse proxy mapping `{deploymentId}.{base-domain}` requests onto the
//! artifact store's output tree for that deployment.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use skiff_platform::logs::{init_logging, LogOptions};
use skiff_platform::util::version_info;
use skiff_proxy::server::{serve, ProxyState, ServerOptions};
use skiff_proxy::settings::Settings;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Load settings, falling back to defaults when no file is given
    let settings = match cli_args.get("config") {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {path}: {e}");
                return;
            }
        },
        None => Settings::default(),
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let state = match ProxyState::new(&settings) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize proxy: {e}");
            return;
        }
    };

    let options = ServerOptions {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };

    info!("Running Skiff Edge Router with options: {:?}", options);

    let handle = match serve(&options, state, await_shutdown_signal()).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start edge router: {e}");
            return;
        }
    };

    match handle.await {
        Ok(Ok(())) => info!("Edge router stopped"),
        Ok(Err(e)) => error!("Edge router server error: {e}"),
        Err(e) => error!("Edge router task failed: {e}"),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
