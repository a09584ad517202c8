//! HTTP server setup
//!
//! The router has no routes of its own: every path on every hostname is
//! proxied, so a fixed endpoint here would shadow that path on every
//! deployment.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use skiff_platform::errors::PlatformError;

use crate::forward::forward_handler;
use crate::settings::Settings;

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Proxy state shared across requests
pub struct ProxyState {
    /// Outbound client for store fetches
    pub client: reqwest::Client,

    /// Artifact store base URL
    pub store_base_url: String,
}

impl ProxyState {
    pub fn new(settings: &Settings) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            store_base_url: settings.store.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Build the proxy router. Exposed so tests can drive it in process.
pub fn build_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .fallback(forward_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ProxyState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), PlatformError>>, PlatformError> {
    let app = build_router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting edge router on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PlatformError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| PlatformError::ServerError(e.to_string()))
    });

    Ok(handle)
}
