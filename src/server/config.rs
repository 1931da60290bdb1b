//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

use crate::room::RoomConfig;

/// Default listening port
pub const DEFAULT_PORT: u16 = 5002;

/// Default cap on a single WebSocket message (64 KiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Largest WebSocket message or frame accepted from a client
    pub max_message_size: usize,

    /// Room manager configuration
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Signaling is latency-sensitive
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the largest accepted WebSocket message
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set room manager configuration
    pub fn room(mut self, room: RoomConfig) -> Self {
        self.room = room;
        self
    }
}
