//! WebRTC signaling relay
//!
//! Brokers connection-negotiation messages (offers, answers, ICE candidates)
//! between one broadcaster and any number of watchers inside a named room.
//! Media never passes through the relay and negotiation payloads are
//! forwarded untouched.
//!
//! # Architecture
//!
//! ```text
//!   WebSocket ──► ClientConnection ──► Dispatcher ──► RoomManager
//!                       ▲                                 │
//!                       │                          relay plan (under lock)  
//!                       │                                 ▼
//!                 outbound queue ◄──────────────── ConnectionRegistry
//! ```
//!
//! - [`room::RoomManager`] owns room lifecycle and the conference flag.
//! - [`registry::ConnectionRegistry`] delivers events to one connection or to
//!   every member of a room's multicast group.
//! - [`server::SignalingServer`] accepts WebSocket clients and runs one task
//!   per connection.
//!
//! # Example
//!
//! ```no_run
//! use signal_relay::{ServerConfig, SignalingServer};
//!
//! # async fn example() -> signal_relay::error::Result<()> {
//! let server = SignalingServer::new(ServerConfig::default());
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;

pub use error::{Error, Result};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use room::{ConferenceFlagPolicy, RoomConfig, RoomError, RoomManager};
pub use server::{ServerConfig, SignalingServer};
pub use session::Dispatcher;
