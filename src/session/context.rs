//! Session context
//!
//! Identity of a connected client, handed to the dispatcher with every frame.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::registry::ConnectionId;

/// Context of one client connection
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Connection id, also the client's peer id in negotiation messages
    pub connection_id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// When the connection was accepted
    pub connected_at: Instant,
}

impl SessionContext {
    /// Create a context with a freshly allocated connection id
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            peer_addr,
            connected_at: Instant::now(),
        }
    }

    /// Get session duration
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
