//! Skiff API Library
//!
//! Deployment intake and live build log relay. One process hosts both: the
//! dispatcher hands build jobs to the worker launcher, and the relay bridges
//! the bus's log channels to WebSocket viewers.

pub mod app;
pub mod launcher;
pub mod relay;
pub mod server;
pub mod settings;
pub mod workers;
