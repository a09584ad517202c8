//! Core data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One build-and-serve unit, created by the dispatcher on request receipt.
/// Never mutated afterwards; artifacts persist until externally collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique slug identifying the deployment
    pub id: String,

    /// Source repository URL
    pub git_url: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Hostname the deployment is served under
    pub host: String,
}

impl Deployment {
    /// Create a deployment with its derived serving hostname
    pub fn new(id: impl Into<String>, git_url: impl Into<String>, base_domain: &str) -> Self {
        let id = id.into();
        let host = format!("{}.{}", id, base_domain);
        Self {
            id,
            git_url: git_url.into(),
            created_at: Utc::now(),
            host,
        }
    }

    /// Public serving URL for the deployment
    pub fn serving_url(&self, scheme: &str) -> String {
        format!("{}://{}", scheme, self.host)
    }
}

/// What a log message represents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogKind {
    /// One line of build or upload progress
    #[default]
    Line,

    /// Terminal message: the worker is done with this deployment.
    /// `success` is true only when the build exited cleanly and every
    /// discovered artifact uploaded.
    Finished { success: bool },
}

/// A log message in flight on the bus. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    /// Deployment the message belongs to
    pub deployment_id: String,

    /// Message text
    pub text: String,

    /// Publish time
    pub timestamp: DateTime<Utc>,

    /// Message kind
    #[serde(default)]
    pub kind: LogKind,
}

impl LogMessage {
    /// A progress line for one deployment
    pub fn line(deployment_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            kind: LogKind::Line,
        }
    }

    /// The terminal message closing one deployment's log stream
    pub fn finished(deployment_id: impl Into<String>, success: bool) -> Self {
        let text = if success {
            "build finished: success".to_string()
        } else {
            "build finished: failure".to_string()
        };
        Self {
            deployment_id: deployment_id.into(),
            text,
            timestamp: Utc::now(),
            kind: LogKind::Finished { success },
        }
    }
}

/// Instruction handed to the worker launcher for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Deployment identity assigned by the dispatcher
    pub deployment_id: String,

    /// Repository the worker should clone and build
    pub git_url: String,
}
