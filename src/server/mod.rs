//! WebSocket signaling server
//!
//! Accepts clients over TCP, upgrades them to WebSocket, and runs one task per
//! connection that feeds the [`crate::session::Dispatcher`] in arrival order.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SignalingServer;
