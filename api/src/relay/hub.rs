//! Fan-out hub bridging the bus subscription to live viewer connections
//!
//! One bounded broadcast channel per deployment, created when the first
//! viewer joins and dropped once nobody is left. Delivery to one viewer
//! never blocks delivery to another: a viewer that cannot keep up loses the
//! oldest messages in its own buffer and nothing else.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Per-deployment broadcast channels
pub struct RelayHub {
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
    buffer: usize,
}

impl RelayHub {
    /// Create a hub whose per-deployment buffers hold `buffer` messages
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer,
        }
    }

    /// Attach a viewer to one deployment's stream. Only messages published
    /// after this call are delivered; there is no backlog or replay.
    pub async fn join(&self, deployment_id: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.write().await;
        match channels.get(deployment_id) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.buffer);
                channels.insert(deployment_id.to_string(), sender);
                debug!("Opened viewer channel for {}", deployment_id);
                receiver
            }
        }
    }

    /// Broadcast one message body to every viewer of a deployment, in
    /// publish order. Returns the number of viewers reached.
    pub async fn publish(&self, deployment_id: &str, body: String) -> usize {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(deployment_id) {
                Some(sender) => sender.send(body).unwrap_or(0),
                None => return 0,
            }
        };

        if delivered == 0 {
            // The last viewer has gone; drop the idle channel
            let mut channels = self.channels.write().await;
            if let Some(sender) = channels.get(deployment_id) {
                if sender.receiver_count() == 0 {
                    channels.remove(deployment_id);
                    debug!("Dropped idle viewer channel for {}", deployment_id);
                }
            }
        }

        delivered
    }

    /// Number of live deployment channels
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}
