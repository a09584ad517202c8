//! Message bus client implementation

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::bus::channels::Channels;
use crate::errors::PlatformError;
use crate::models::LogMessage;

/// Bus broker address
#[derive(Debug, Clone)]
pub struct BusAddress {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    /// Optional path to a PEM-encoded CA certificate for broker verification.
    /// When `None` and `use_tls` is `true`, the system certificate store is used.
    pub ca_cert_path: Option<String>,
    /// Optional broker credentials
    pub credentials: Option<BusCredentials>,
}

impl Default for BusAddress {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            port: 1883,
            use_tls: false,
            ca_cert_path: None,
            credentials: None,
        }
    }
}

/// Username/password pair for the broker
#[derive(Debug, Clone)]
pub struct BusCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Bus client wrapper
pub struct BusClient {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl BusClient {
    /// Create a new bus client for the given broker
    pub fn connect(address: &BusAddress, client_id: &str) -> Result<Self, PlatformError> {
        if address.host.is_empty() {
            return Err(PlatformError::BusError("bus host is not configured".to_string()));
        }

        let mut options = MqttOptions::new(client_id, &address.host, address.port);
        options.set_keep_alive(std::time::Duration::from_secs(30));

        if let Some(credentials) = &address.credentials {
            options.set_credentials(&credentials.username, credentials.password.expose_secret());
        }

        if address.use_tls {
            use rumqttc::{TlsConfiguration, Transport};
            use rustls::ClientConfig;
            use std::sync::Arc;

            let mut root_cert_store = rustls::RootCertStore::empty();

            if let Some(ref ca_path) = address.ca_cert_path {
                let ca_pem = std::fs::read(ca_path)
                    .map_err(|e| PlatformError::BusError(format!("Failed to read CA cert {ca_path}: {e}")))?;
                let mut cursor = std::io::Cursor::new(ca_pem);
                for cert in rustls_pemfile::certs(&mut cursor).flatten() {
                    let _ = root_cert_store.add(cert);
                }
            } else {
                for cert in rustls_native_certs::load_native_certs().unwrap_or_default() {
                    let _ = root_cert_store.add(cert);
                }
            }

            let client_config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();

            options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
                Arc::new(client_config),
            )));
        }

        let (client, eventloop) = AsyncClient::new(options, 64);

        Ok(Self { client, eventloop })
    }

    /// Subscribe to every deployment's log channel via the single wildcard
    pub async fn subscribe_logs(&mut self) -> Result<(), PlatformError> {
        self.client
            .subscribe(Channels::LOGS_WILDCARD, QoS::AtMostOnce)
            .await
            .map_err(|e| PlatformError::BusError(e.to_string()))?;
        info!("Subscribed to: {}", Channels::LOGS_WILDCARD);
        Ok(())
    }

    /// Clonable publish handle for log streams
    pub fn log_publisher(&self) -> LogPublisher {
        LogPublisher {
            client: self.client.clone(),
        }
    }

    /// Poll for events
    pub async fn poll(&mut self) -> Result<Option<BusMessage>, PlatformError> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("Received message on channel: {}", publish.topic);

                Ok(Some(BusMessage {
                    channel: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                }))
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Bus connected");
                Ok(None)
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                debug!("Subscription acknowledged");
                Ok(None)
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Bus poll error: {}", e);
                Err(PlatformError::BusError(e.to_string()))
            }
        }
    }

    /// Drive the event loop for publish-only processes. Queued publishes
    /// only reach the broker while the loop is polled; returns once a
    /// disconnect requested on a publisher handle has been flushed, or the
    /// connection drops.
    pub async fn drive(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("Bus disconnect flushed");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Bus connection error: {}", e);
                    return;
                }
            }
        }
    }

    /// Disconnect from the broker
    pub async fn disconnect(&mut self) -> Result<(), PlatformError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| PlatformError::BusError(e.to_string()))?;
        info!("Bus disconnected");
        Ok(())
    }
}

/// Clonable handle publishing log messages onto their deployment's channel
#[derive(Clone)]
pub struct LogPublisher {
    client: AsyncClient,
}

impl LogPublisher {
    /// Publish one log message. Delivery is at-most-once; publish order is
    /// preserved per channel.
    pub async fn publish(&self, message: &LogMessage) -> Result<(), PlatformError> {
        let channel = Channels::logs(&message.deployment_id);
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(channel, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| PlatformError::BusError(e.to_string()))?;

        Ok(())
    }

    /// Request a clean disconnect from the broker
    pub async fn disconnect(&self) -> Result<(), PlatformError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| PlatformError::BusError(e.to_string()))
    }
}

/// Raw message received from the bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    /// Parse payload as JSON
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, PlatformError> {
        serde_json::from_slice(&self.payload).map_err(|e| PlatformError::BusError(e.to_string()))
    }

    /// Payload as text, replacing invalid UTF-8
    pub fn body_utf8(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogMessage;

    #[test]
    fn test_connect_requires_host() {
        let address = BusAddress::default();
        assert!(BusClient::connect(&address, "skiff-test").is_err());
    }

    #[test]
    fn test_bus_message_parse_json() {
        let original = LogMessage::line("dep-1", "hello");
        let message = BusMessage {
            channel: Channels::logs("dep-1"),
            payload: serde_json::to_vec(&original).unwrap(),
        };
        let parsed: LogMessage = message.parse_json().unwrap();
        assert_eq!(parsed.deployment_id, "dep-1");
        assert_eq!(parsed.text, "hello");
    }
}
