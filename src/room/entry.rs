//! Room entry and statistics types

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::registry::ConnectionId;

/// One active room
#[derive(Debug, Clone)]
pub struct RoomEntry {
    /// Room name, also the name of its multicast group
    pub name: String,

    /// Connection that started the broadcast
    pub broadcaster: ConnectionId,

    /// Connections watching the broadcast
    pub watchers: HashSet<ConnectionId>,

    /// When the room was created
    pub created_at: Instant,
}

impl RoomEntry {
    pub(super) fn new(name: String, broadcaster: ConnectionId) -> Self {
        Self {
            name,
            broadcaster,
            watchers: HashSet::new(),
            created_at: Instant::now(),
        }
    }

    /// Number of watchers
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Snapshot for reporting
    pub fn stats(&self) -> RoomStats {
        let mut watchers: Vec<ConnectionId> = self.watchers.iter().copied().collect();
        watchers.sort();

        RoomStats {
            broadcaster: self.broadcaster,
            watcher_count: watchers.len(),
            watchers,
            age: self.created_at.elapsed(),
        }
    }
}

/// Statistics for a room
#[derive(Debug, Clone)]
pub struct RoomStats {
    /// Broadcaster's connection
    pub broadcaster: ConnectionId,
    /// Watchers, sorted by id
    pub watchers: Vec<ConnectionId>,
    /// Number of watchers
    pub watcher_count: usize,
    /// Time since the room was created
    pub age: Duration,
}
