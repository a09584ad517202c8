//! Bus channel naming
//!
//! Every deployment gets exactly one log channel, named deterministically
//! from its id. Consumers cover the whole family with a single wildcard
//! subscription instead of one subscription per deployment.

/// Channel name patterns for build log streams
pub struct Channels;

impl Channels {
    /// Single wildcard covering every deployment's log channel
    pub const LOGS_WILDCARD: &'static str = "skiff/logs/+";

    /// Log channel for one deployment
    pub fn logs(deployment_id: &str) -> String {
        format!("skiff/logs/{}", deployment_id)
    }

    /// Parse a log channel name back to its deployment id
    pub fn parse_deployment_id(channel: &str) -> Option<String> {
        let parts: Vec<&str> = channel.split('/').collect();
        if parts.len() == 3 && parts[0] == "skiff" && parts[1] == "logs" && !parts[2].is_empty() {
            Some(parts[2].to_string())
        } else {
            None
        }
    }

    /// Check if a channel carries a deployment log stream
    pub fn is_log_channel(channel: &str) -> bool {
        Self::parse_deployment_id(channel).is_some()
    }
}
