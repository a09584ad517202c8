//! Bus subscriber worker feeding the relay hub
//!
//! Exactly one wildcard subscription covers every deployment's log channel;
//! subscriptions never grow with the number of deployments.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use skiff_platform::bus::channels::Channels;
use skiff_platform::bus::client::{BusAddress, BusClient};

use crate::relay::hub::RelayHub;

/// Subscriber worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Bus broker address
    pub bus: BusAddress,

    /// Reconnect delay on failure
    pub reconnect_delay: Duration,

    /// Max reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bus: BusAddress::default(),
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }
}

/// Run the subscriber worker
pub async fn run(
    options: &Options,
    hub: Arc<RelayHub>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    if options.bus.host.is_empty() {
        info!("Bus host not configured, subscriber worker will not start.");
        return;
    }

    info!("Subscriber worker starting...");

    let mut reconnect_attempts: u32 = 0;

    loop {
        let client_id = format!("skiff-api-{}", uuid::Uuid::new_v4());

        info!("Connecting to bus: {}:{}", options.bus.host, options.bus.port);
        let mut client = match BusClient::connect(&options.bus, &client_id) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create bus client: {}", e);
                reconnect_attempts += 1;
                if reconnect_attempts >= options.max_reconnect_attempts {
                    error!("Max reconnect attempts reached, giving up");
                    return;
                }
                tokio::select! {
                    _ = &mut shutdown_signal => return,
                    _ = tokio::time::sleep(options.reconnect_delay) => continue,
                }
            }
        };

        if let Err(e) = client.subscribe_logs().await {
            error!("Failed to subscribe to log channels: {}", e);
            tokio::select! {
                _ = &mut shutdown_signal => return,
                _ = tokio::time::sleep(options.reconnect_delay) => continue,
            }
        }

        reconnect_attempts = 0;
        info!("Subscriber worker connected and subscribed");

        // Main event loop
        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Subscriber worker shutting down...");
                    let _ = client.disconnect().await;
                    return;
                }
                polled = client.poll() => {
                    match polled {
                        Ok(Some(message)) => {
                            match Channels::parse_deployment_id(&message.channel) {
                                Some(deployment_id) => {
                                    let delivered = hub.publish(&deployment_id, message.body_utf8()).await;
                                    debug!("Relayed message for {} to {} viewer(s)", deployment_id, delivered);
                                }
                                None => {
                                    debug!("Ignoring message on foreign channel: {}", message.channel);
                                }
                            }
                        }
                        Ok(None) => {
                            // No message, continue
                        }
                        Err(e) => {
                            warn!("Bus poll error: {}, reconnecting...", e);
                            break;
                        }
                    }
                }
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => return,
            _ = tokio::time::sleep(options.reconnect_delay) => {}
        }
    }
}
