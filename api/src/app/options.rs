//! Application configuration options

use std::time::Duration;

use crate::launcher::LauncherOptions;
use crate::server::serve::ServerOptions;
use crate::server::state::DispatchOptions;
use crate::workers::subscriber;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// HTTP server configuration
    pub server: ServerOptions,

    /// Bus subscriber worker options
    pub subscriber: subscriber::Options,

    /// Worker launcher configuration
    pub launcher: LauncherOptions,

    /// Dispatch configuration
    pub dispatch: DispatchOptions,

    /// Per-deployment viewer fan-out buffer size
    pub relay_buffer: usize,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            server: ServerOptions::default(),
            subscriber: subscriber::Options::default(),
            launcher: LauncherOptions::default(),
            dispatch: DispatchOptions::default(),
            relay_buffer: 256,
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}
