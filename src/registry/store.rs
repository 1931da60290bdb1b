//! Connection registry implementation

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::protocol::{OutboundFrame, ServerEvent};

use super::id::ConnectionId;
use super::relay::Relay;

/// Receiving end of a connection's outbound queue
pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundFrame>;

struct ConnectionEntry {
    tx: mpsc::UnboundedSender<OutboundFrame>,
    groups: HashSet<String>,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl RegistryInner {
    fn send(&self, to: ConnectionId, frame: OutboundFrame) -> bool {
        match self.connections.get(&to) {
            // A closed receiver means the connection task is already gone
            Some(entry) => entry.tx.send(frame).is_ok(),
            None => false,
        }
    }

    fn send_direct(
        &self,
        to: ConnectionId,
        from: Option<ConnectionId>,
        event: ServerEvent,
    ) -> bool {
        if from == Some(to) {
            return false;
        }
        self.send(to, OutboundFrame::Event(event))
    }

    fn multicast(&self, group: &str, event: &ServerEvent, exclude: Option<ConnectionId>) -> usize {
        let Some(members) = self.groups.get(group) else {
            return 0;
        };

        members
            .iter()
            .filter(|id| Some(**id) != exclude)
            .filter(|id| self.send(**id, OutboundFrame::Event(event.clone())))
            .count()
    }

    fn join(&mut self, connection: ConnectionId, group: &str) -> bool {
        let Some(entry) = self.connections.get_mut(&connection) else {
            return false;
        };

        entry.groups.insert(group.to_string());
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(connection);
        true
    }

    fn leave(&mut self, connection: ConnectionId, group: &str) {
        if let Some(entry) = self.connections.get_mut(&connection) {
            entry.groups.remove(group);
        }
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(&connection);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    fn dissolve(&mut self, group: &str) -> Vec<ConnectionId> {
        let members: Vec<ConnectionId> = self
            .groups
            .remove(group)
            .map(|m| m.into_iter().collect())
            .unwrap_or_default();

        for id in &members {
            if let Some(entry) = self.connections.get_mut(id) {
                entry.groups.remove(group);
            }
        }

        members
    }
}

/// Registry of live connections and their multicast groups
///
/// Thread-safe via `RwLock`. All delivery is a non-blocking push onto the
/// target's unbounded queue; unknown or departed targets are silently skipped.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a connection and return the receiver for its outbound frames
    ///
    /// Registering an id twice replaces the previous queue.
    pub async fn register(&self, connection: ConnectionId) -> OutboundReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.connections.remove(&connection) {
            for group in previous.groups {
                if let Some(members) = inner.groups.get_mut(&group) {
                    members.remove(&connection);
                }
            }
        }

        inner.connections.insert(
            connection,
            ConnectionEntry {
                tx,
                groups: HashSet::new(),
            },
        );

        tracing::debug!(
            connection = %connection,
            connections = inner.connections.len(),
            "Connection registered"
        );

        rx
    }

    /// Remove a connection and its memberships
    ///
    /// Returns false if the connection was not registered.
    pub async fn unregister(&self, connection: ConnectionId) -> bool {
        let mut inner = self.inner.write().await;

        let Some(entry) = inner.connections.get(&connection) else {
            return false;
        };
        let groups: Vec<String> = entry.groups.iter().cloned().collect();

        for group in groups {
            inner.leave(connection, &group);
        }
        inner.connections.remove(&connection);

        tracing::debug!(
            connection = %connection,
            connections = inner.connections.len(),
            "Connection unregistered"
        );

        true
    }

    /// Check whether a connection is registered
    pub async fn is_connected(&self, connection: ConnectionId) -> bool {
        self.inner.read().await.connections.contains_key(&connection)
    }

    /// Get the number of live connections
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Send a frame to one connection
    ///
    /// Returns false if the connection is unknown or its queue is closed.
    pub async fn send(&self, to: ConnectionId, frame: OutboundFrame) -> bool {
        self.inner.read().await.send(to, frame)
    }

    /// Send an event to one connection on behalf of `from`
    ///
    /// Nothing is delivered when `to == from`.
    pub async fn send_direct(
        &self,
        to: ConnectionId,
        from: Option<ConnectionId>,
        event: ServerEvent,
    ) -> bool {
        self.inner.read().await.send_direct(to, from, event)
    }

    /// Send an event to every member of a group
    ///
    /// Returns the number of connections the event was queued for.
    pub async fn multicast(
        &self,
        group: &str,
        event: ServerEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        self.inner.read().await.multicast(group, &event, exclude)
    }

    /// Add a connection to a group
    ///
    /// Returns false if the connection is not registered.
    pub async fn join(&self, connection: ConnectionId, group: &str) -> bool {
        self.inner.write().await.join(connection, group)
    }

    /// Remove a connection from a group
    pub async fn leave(&self, connection: ConnectionId, group: &str) {
        self.inner.write().await.leave(connection, group);
    }

    /// Remove every member from a group, returning the former members
    pub async fn dissolve(&self, group: &str) -> Vec<ConnectionId> {
        self.inner.write().await.dissolve(group)
    }

    /// Get the members of a group
    pub async fn group_members(&self, group: &str) -> Vec<ConnectionId> {
        self.inner
            .read()
            .await
            .groups
            .get(group)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Apply a relay plan in order
    pub async fn apply(&self, plan: Vec<Relay>) {
        if plan.is_empty() {
            return;
        }

        let mut inner = self.inner.write().await;

        for step in plan {
            match step {
                Relay::Join { connection, group } => {
                    if !inner.join(connection, &group) {
                        tracing::debug!(
                            connection = %connection,
                            group = %group,
                            "Join skipped, connection already gone"
                        );
                    }
                }
                Relay::Direct { to, from, event } => {
                    let name = event.name();
                    if !inner.send_direct(to, from, event) {
                        tracing::debug!(to = %to, event = name, "Direct event dropped");
                    }
                }
                Relay::Multicast {
                    group,
                    event,
                    exclude,
                } => {
                    let delivered = inner.multicast(&group, &event, exclude);
                    tracing::debug!(
                        group = %group,
                        event = event.name(),
                        delivered = delivered,
                        "Multicast"
                    );
                }
                Relay::Dissolve { group } => {
                    inner.dissolve(&group);
                }
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
