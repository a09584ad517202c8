//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use skiff_platform::errors::PlatformError;

use crate::app::options::AppOptions;
use crate::launcher::{DockerLauncher, Launcher};
use crate::relay::hub::RelayHub;
use crate::server::serve::{serve, ServerOptions};
use crate::server::state::ServerState;
use crate::workers::subscriber;

/// Run the api service
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), PlatformError> {
    info!("Initializing Skiff API...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.max_shutdown_delay);

    if let Err(e) = init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start api service: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), PlatformError> {
    let hub = Arc::new(RelayHub::new(options.relay_buffer));
    let launcher: Arc<dyn Launcher> = Arc::new(DockerLauncher::new(options.launcher.clone()));
    let state = Arc::new(ServerState::new(
        launcher,
        hub.clone(),
        options.dispatch.clone(),
    ));

    init_subscriber_worker(
        options.subscriber.clone(),
        hub,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    init_server(&options.server, state, shutdown_manager, shutdown_tx.subscribe()).await?;

    Ok(())
}

async fn init_subscriber_worker(
    options: subscriber::Options,
    hub: Arc<RelayHub>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), PlatformError> {
    info!("Initializing subscriber worker...");

    let handle = tokio::spawn(async move {
        subscriber::run(
            &options,
            hub,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_subscriber_worker_handle(handle)?;
    Ok(())
}

async fn init_server(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), PlatformError> {
    info!("Initializing HTTP server...");

    let handle = serve(options, state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: Duration,
    subscriber_worker_handle: Option<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), PlatformError>>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, max_shutdown_delay: Duration) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay,
            subscriber_worker_handle: None,
            server_handle: None,
        }
    }

    fn with_subscriber_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), PlatformError> {
        if self.subscriber_worker_handle.is_some() {
            return Err(PlatformError::ShutdownError("subscriber_handle already set".to_string()));
        }
        self.subscriber_worker_handle = Some(handle);
        Ok(())
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), PlatformError>>,
    ) -> Result<(), PlatformError> {
        if self.server_handle.is_some() {
            return Err(PlatformError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), PlatformError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.max_shutdown_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), PlatformError> {
        info!("Shutting down Skiff API...");

        // 1. Subscriber worker
        if let Some(handle) = self.subscriber_worker_handle.take() {
            handle.await.map_err(|e| PlatformError::ShutdownError(e.to_string()))?;
        }

        // 2. HTTP server (drains in-flight connections)
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| PlatformError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
