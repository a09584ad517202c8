//! Skiff Edge Router Library
//!
//! Resolves inbound hostnames to deployments and serves each request
//! straight from the artifact store. Resolution is purely syntactic; the
//! store's answer (including its 404s) is the client's answer.

pub mod forward;
pub mod routing;
pub mod server;
pub mod settings;
