//! Server state

use std::sync::Arc;

use crate::launcher::Launcher;
use crate::relay::hub::RelayHub;

/// Dispatch configuration shared with handlers
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Domain deployments are served under, e.g. `skiff.local:8000`
    pub base_domain: String,

    /// Scheme used in predicted serving URLs
    pub public_scheme: String,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            base_domain: "localhost:8000".to_string(),
            public_scheme: "http".to_string(),
        }
    }
}

/// Server state shared across handlers
pub struct ServerState {
    pub launcher: Arc<dyn Launcher>,
    pub hub: Arc<RelayHub>,
    pub dispatch: DispatchOptions,
}

impl ServerState {
    pub fn new(launcher: Arc<dyn Launcher>, hub: Arc<RelayHub>, dispatch: DispatchOptions) -> Self {
        Self {
            launcher,
            hub,
            dispatch,
        }
    }
}
