//! Build progress reporting
//!
//! Every progress line goes both to local diagnostics and onto the
//! deployment's bus channel, so viewers and local logs see the same stream.
//! Publish failures are logged and swallowed; losing a log line never fails
//! the build.

use tracing::{info, warn};

use skiff_platform::bus::client::LogPublisher;
use skiff_platform::models::LogMessage;

/// Reports one deployment's build progress
pub struct BuildReporter {
    publisher: LogPublisher,
    deployment_id: String,
}

impl BuildReporter {
    pub fn new(publisher: LogPublisher, deployment_id: impl Into<String>) -> Self {
        Self {
            publisher,
            deployment_id: deployment_id.into(),
        }
    }

    /// Emit one progress line
    pub async fn line(&self, text: impl Into<String>) {
        let message = LogMessage::line(&self.deployment_id, text);
        info!("[{}] {}", self.deployment_id, message.text);
        if let Err(e) = self.publisher.publish(&message).await {
            warn!("Failed to publish log line: {}", e);
        }
    }

    /// Emit the terminal completion message
    pub async fn finished(&self, success: bool) {
        let message = LogMessage::finished(&self.deployment_id, success);
        info!("[{}] {}", self.deployment_id, message.text);
        if let Err(e) = self.publisher.publish(&message).await {
            warn!("Failed to publish completion message: {}", e);
        }
    }
}
