//! Connection registry and relay primitives
//!
//! The registry tracks every live connection's outbound queue and the named
//! multicast groups (one per room) each connection belongs to.
//!
//! # Delivery
//!
//! Outbound frames are pushed onto an unbounded `tokio::sync::mpsc` queue per
//! connection. Pushing never blocks, so relay plans can be applied without
//! awaiting the socket writers; each connection task drains its own queue in
//! order.
//!
//! ```text
//!   RoomManager ──Vec<Relay>──► ConnectionRegistry::apply()
//!                                   │
//!          ┌────────────────────────┼────────────────────────┐
//!          ▼                        ▼                        ▼
//!    [broadcaster tx]         [watcher tx]             [watcher tx]
//! ```

pub mod id;
pub mod relay;
pub mod store;

pub use id::ConnectionId;
pub use relay::Relay;
pub use store::{ConnectionRegistry, OutboundReceiver};
