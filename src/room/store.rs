//! Room manager implementation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::protocol::{NegotiationKind, ServerEvent};
use crate::registry::{ConnectionId, ConnectionRegistry, Relay};

use super::config::{ConferenceFlagPolicy, RoomConfig};
use super::entry::{RoomEntry, RoomStats};
use super::error::RoomError;

/// Rooms a single connection takes part in
#[derive(Debug, Default)]
struct Membership {
    broadcasting: HashSet<String>,
    watching: HashSet<String>,
}

impl Membership {
    fn is_empty(&self) -> bool {
        self.broadcasting.is_empty() && self.watching.is_empty()
    }
}

/// Everything guarded by the manager lock
#[derive(Debug, Default)]
struct RoomTable {
    rooms: HashMap<String, RoomEntry>,
    memberships: HashMap<ConnectionId, Membership>,
    conference_active: bool,
}

impl RoomTable {
    fn membership(&mut self, connection: ConnectionId) -> &mut Membership {
        self.memberships.entry(connection).or_default()
    }

    fn forget(&mut self, connection: ConnectionId, room: &str) {
        if let Some(membership) = self.memberships.get_mut(&connection) {
            membership.broadcasting.remove(room);
            membership.watching.remove(room);
            if membership.is_empty() {
                self.memberships.remove(&connection);
            }
        }
    }

    /// Remove a room and every reverse-index entry pointing at it
    fn remove_room(&mut self, name: &str, policy: ConferenceFlagPolicy) -> Option<RoomEntry> {
        let room = self.rooms.remove(name)?;

        self.forget(room.broadcaster, name);
        for watcher in &room.watchers {
            self.forget(*watcher, name);
        }

        self.conference_active = match policy {
            ConferenceFlagPolicy::AnyRoomActive => !self.rooms.is_empty(),
            ConferenceFlagPolicy::LastTransition => false,
        };

        Some(room)
    }
}

/// Owner of all rooms and the conference flag
///
/// One `Mutex` guards the whole table; rooms are few and every operation is
/// at worst linear in the rooms a single connection belongs to. Relay plans
/// are applied before the lock is released so group membership in the
/// registry never disagrees with the room table.
pub struct RoomManager {
    state: Mutex<RoomTable>,
    connections: Arc<ConnectionRegistry>,
    config: RoomConfig,
}

impl RoomManager {
    /// Create a room manager with default configuration
    pub fn new(connections: Arc<ConnectionRegistry>) -> Self {
        Self::with_config(connections, RoomConfig::default())
    }

    /// Create a room manager with custom configuration
    pub fn with_config(connections: Arc<ConnectionRegistry>, config: RoomConfig) -> Self {
        Self {
            state: Mutex::new(RoomTable::default()),
            connections,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Get the connection registry relay plans are applied to
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    /// Check whether a conference is running
    pub async fn conference_active(&self) -> bool {
        self.state.lock().await.conference_active
    }

    /// Check whether a room name is free
    ///
    /// A missing name is always reported free since no room can carry it.
    pub async fn is_room_available(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => !self.state.lock().await.rooms.contains_key(name),
            None => true,
        }
    }

    /// Start a broadcast in a new room
    ///
    /// The broadcaster joins the room's group, which then receives
    /// `broadcaster(name)`.
    pub async fn start_broadcast(
        &self,
        name: Option<&str>,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let name = valid_name(name).inspect_err(|_| {
            tracing::warn!(connection = %connection, "Broadcaster sent an invalid room name");
        })?;

        let mut table = self.state.lock().await;

        if table.rooms.contains_key(name) {
            tracing::warn!(room = %name, connection = %connection, "Room already occupied");
            return Err(RoomError::RoomOccupied(name.to_string()));
        }
        self.ensure_connected(connection).await?;

        table
            .rooms
            .insert(name.to_string(), RoomEntry::new(name.to_string(), connection));
        table.membership(connection).broadcasting.insert(name.to_string());

        if !table.conference_active {
            table.conference_active = true;
            tracing::info!(rooms = table.rooms.len(), "Conference started");
        }

        tracing::info!(room = %name, broadcaster = %connection, "Broadcast started");

        self.connections
            .apply(vec![
                Relay::Join {
                    connection,
                    group: name.to_string(),
                },
                Relay::Multicast {
                    group: name.to_string(),
                    event: ServerEvent::Broadcaster {
                        room: name.to_string(),
                    },
                    exclude: None,
                },
            ])
            .await;

        Ok(())
    }

    /// Join an active room as watcher
    ///
    /// The broadcaster receives `watcher(connection)` and is expected to start
    /// negotiating with the new watcher.
    pub async fn join_as_watcher(
        &self,
        name: Option<&str>,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let name = valid_name(name).inspect_err(|_| {
            tracing::warn!(connection = %connection, "Watcher sent an invalid room name");
        })?;

        let mut table = self.state.lock().await;

        if !table.rooms.contains_key(name) {
            tracing::warn!(room = %name, watcher = %connection, "Room not available for watchers");
            return Err(RoomError::RoomNotFound(name.to_string()));
        }
        self.ensure_connected(connection).await?;

        let Some(room) = table.rooms.get_mut(name) else {
            return Err(RoomError::RoomNotFound(name.to_string()));
        };
        room.watchers.insert(connection);
        let broadcaster = room.broadcaster;
        let watchers = room.watcher_count();
        table.membership(connection).watching.insert(name.to_string());

        tracing::info!(
            room = %name,
            watcher = %connection,
            watchers = watchers,
            "Watcher joined"
        );

        self.connections
            .apply(vec![
                Relay::Join {
                    connection,
                    group: name.to_string(),
                },
                Relay::Direct {
                    to: broadcaster,
                    from: Some(connection),
                    event: ServerEvent::Watcher {
                        watcher: connection,
                    },
                },
            ])
            .await;

        Ok(())
    }

    /// Forward an opaque negotiation payload to one connection
    ///
    /// There is no existence check: a missing target or a target that has
    /// disconnected drops the message. Returns whether it was queued.
    pub async fn relay_negotiation(
        &self,
        kind: NegotiationKind,
        target: Option<ConnectionId>,
        sender: ConnectionId,
        payload: Value,
    ) -> bool {
        let Some(target) = target else {
            tracing::debug!(kind = %kind, sender = %sender, "Negotiation without valid target dropped");
            return false;
        };

        let delivered = self
            .connections
            .send_direct(
                target,
                Some(sender),
                ServerEvent::Negotiation {
                    kind,
                    sender,
                    payload,
                },
            )
            .await;

        tracing::debug!(
            kind = %kind,
            sender = %sender,
            target = %target,
            delivered = delivered,
            "Negotiation relayed"
        );

        delivered
    }

    /// End a room's broadcast
    ///
    /// Every member receives `endConference` and the room's group is
    /// dissolved.
    pub async fn end_broadcast(&self, name: Option<&str>) -> Result<(), RoomError> {
        let name = valid_name(name).inspect_err(|_| {
            tracing::warn!("End of conference requested with an invalid room name");
        })?;

        let mut table = self.state.lock().await;

        if table.remove_room(name, self.config.conference_flag).is_none() {
            tracing::warn!(room = %name, "Room does not exist");
            return Err(RoomError::RoomNotFound(name.to_string()));
        }

        tracing::info!(
            room = %name,
            conference_active = table.conference_active,
            "Broadcast ended"
        );

        self.connections.apply(teardown_plan(name, None)).await;

        Ok(())
    }

    /// Clean up after a connection has gone away
    ///
    /// Rooms it watched keep running and their broadcasters receive
    /// `disconnectPeer(connection)`; rooms it broadcast are ended. Must run
    /// after the connection was unregistered from the registry.
    pub async fn handle_disconnect(&self, connection: ConnectionId) {
        let mut table = self.state.lock().await;

        let Some(membership) = table.memberships.remove(&connection) else {
            return;
        };

        let mut plan = Vec::new();

        for name in &membership.watching {
            if let Some(room) = table.rooms.get_mut(name) {
                room.watchers.remove(&connection);

                tracing::info!(
                    room = %name,
                    watcher = %connection,
                    watchers = room.watcher_count(),
                    "Watcher disconnected"
                );

                plan.push(Relay::Direct {
                    to: room.broadcaster,
                    from: Some(connection),
                    event: ServerEvent::DisconnectPeer { peer: connection },
                });
            }
        }

        for name in &membership.broadcasting {
            if table.remove_room(name, self.config.conference_flag).is_some() {
                tracing::info!(
                    room = %name,
                    broadcaster = %connection,
                    conference_active = table.conference_active,
                    "Room closed, broadcaster disconnected"
                );

                plan.extend(teardown_plan(name, Some(connection)));
            }
        }

        self.connections.apply(plan).await;
    }

    /// Reject connections whose transport is already gone
    ///
    /// Checked under the manager lock. A connection that unregisters after
    /// this check is cleaned up by its pending `handle_disconnect`, which
    /// waits for the same lock.
    async fn ensure_connected(&self, connection: ConnectionId) -> Result<(), RoomError> {
        if self.connections.is_connected(connection).await {
            Ok(())
        } else {
            tracing::debug!(connection = %connection, "Connection already closed");
            Err(RoomError::ConnectionClosed)
        }
    }

    /// Get the number of active rooms
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    /// Get room statistics
    pub async fn room_stats(&self, name: &str) -> Option<RoomStats> {
        self.state.lock().await.rooms.get(name).map(RoomEntry::stats)
    }

    /// Get the names of all active rooms
    pub async fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.rooms.keys().cloned().collect();
        names.sort();
        names
    }
}

fn valid_name(name: Option<&str>) -> Result<&str, RoomError> {
    name.filter(|n| !n.is_empty())
        .ok_or(RoomError::InvalidRoomName)
}

/// Notify a room's members that it ended, then empty its group
fn teardown_plan(name: &str, exclude: Option<ConnectionId>) -> Vec<Relay> {
    vec![
        Relay::Multicast {
            group: name.to_string(),
            event: ServerEvent::EndConference,
            exclude,
        },
        Relay::Dissolve {
            group: name.to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::protocol::OutboundFrame;
    use crate::registry::OutboundReceiver;

    struct Peer {
        id: ConnectionId,
        rx: OutboundReceiver,
    }

    impl Peer {
        async fn connect(registry: &ConnectionRegistry) -> Self {
            let id = ConnectionId::new();
            let rx = registry.register(id).await;
            Self { id, rx }
        }

        fn events(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                if let OutboundFrame::Event(event) = frame {
                    events.push(event);
                }
            }
            events
        }
    }

    fn setup() -> (Arc<ConnectionRegistry>, RoomManager) {
        let registry = Arc::new(ConnectionRegistry::new());
        let manager = RoomManager::new(Arc::clone(&registry));
        (registry, manager)
    }

    #[tokio::test]
    async fn test_unused_room_is_available() {
        let (_registry, manager) = setup();

        assert!(manager.is_room_available(Some("room1")).await);
        assert!(manager.is_room_available(None).await);
        assert!(!manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_start_broadcast() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);

        assert!(!manager.is_room_available(Some("room1")).await);
        assert!(manager.conference_active().await);
        assert_eq!(
            a.events(),
            vec![ServerEvent::Broadcaster {
                room: "room1".into()
            }]
        );
        assert_eq!(registry.group_members("room1").await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_start_broadcast_invalid_name() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;

        assert_eq!(
            manager.start_broadcast(None, a.id).await,
            Err(RoomError::InvalidRoomName)
        );
        assert_eq!(
            manager.start_broadcast(Some(""), a.id).await,
            Err(RoomError::InvalidRoomName)
        );
        assert_eq!(manager.room_count().await, 0);
        assert!(!manager.conference_active().await);
        assert!(a.events().is_empty());
    }

    #[tokio::test]
    async fn test_second_broadcaster_is_ignored() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        a.events();

        assert_eq!(
            manager.start_broadcast(Some("room1"), b.id).await,
            Err(RoomError::RoomOccupied("room1".into()))
        );

        let stats = manager.room_stats("room1").await.unwrap();
        assert_eq!(stats.broadcaster, a.id);
        assert!(a.events().is_empty());
        assert!(b.events().is_empty());
        assert_eq!(registry.group_members("room1").await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_join_as_watcher() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        a.events();

        assert_ok!(manager.join_as_watcher(Some("room1"), b.id).await);

        assert_eq!(a.events(), vec![ServerEvent::Watcher { watcher: b.id }]);
        assert!(b.events().is_empty());

        let stats = manager.room_stats("room1").await.unwrap();
        assert_eq!(stats.watchers, vec![b.id]);
        assert_eq!(stats.watcher_count, 1);

        let mut members = registry.group_members("room1").await;
        members.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(members, expected);
    }

    #[tokio::test]
    async fn test_join_missing_room() {
        let (registry, manager) = setup();
        let mut b = Peer::connect(&registry).await;

        assert_eq!(
            manager.join_as_watcher(Some("nowhere"), b.id).await,
            Err(RoomError::RoomNotFound("nowhere".into()))
        );
        assert_err!(manager.join_as_watcher(None, b.id).await);
        assert!(b.events().is_empty());
        assert!(registry.group_members("nowhere").await.is_empty());
    }

    #[tokio::test]
    async fn test_relay_negotiation_reaches_only_target() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;
        let mut c = Peer::connect(&registry).await;
        let payload = json!({"type": "offer", "sdp": "v=0\r\n"});

        assert!(
            manager
                .relay_negotiation(NegotiationKind::Offer, Some(a.id), b.id, payload.clone())
                .await
        );

        assert_eq!(
            a.events(),
            vec![ServerEvent::Negotiation {
                kind: NegotiationKind::Offer,
                sender: b.id,
                payload,
            }]
        );
        assert!(b.events().is_empty());
        assert!(c.events().is_empty());
    }

    #[tokio::test]
    async fn test_relay_to_stale_target() {
        let (registry, manager) = setup();
        let a = Peer::connect(&registry).await;
        let gone = Peer::connect(&registry).await;
        registry.unregister(gone.id).await;

        assert!(
            !manager
                .relay_negotiation(NegotiationKind::Candidate, Some(gone.id), a.id, json!({}))
                .await
        );
        assert!(
            !manager
                .relay_negotiation(NegotiationKind::Answer, None, a.id, Value::Null)
                .await
        );
    }

    #[tokio::test]
    async fn test_end_broadcast_notifies_members() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.join_as_watcher(Some("room1"), b.id).await);
        a.events();

        assert_ok!(manager.end_broadcast(Some("room1")).await);

        assert_eq!(a.events(), vec![ServerEvent::EndConference]);
        assert_eq!(b.events(), vec![ServerEvent::EndConference]);
        assert!(manager.is_room_available(Some("room1")).await);
        assert!(!manager.conference_active().await);
        assert!(registry.group_members("room1").await.is_empty());
    }

    #[tokio::test]
    async fn test_end_missing_room_is_noop() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        a.events();

        assert_eq!(
            manager.end_broadcast(Some("room2")).await,
            Err(RoomError::RoomNotFound("room2".into()))
        );
        assert_eq!(
            manager.end_broadcast(None).await,
            Err(RoomError::InvalidRoomName)
        );

        assert!(a.events().is_empty());
        assert_eq!(manager.room_count().await, 1);
        assert!(manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_watcher_disconnect() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let w = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.join_as_watcher(Some("room1"), w.id).await);
        a.events();

        registry.unregister(w.id).await;
        manager.handle_disconnect(w.id).await;

        assert_eq!(a.events(), vec![ServerEvent::DisconnectPeer { peer: w.id }]);
        let stats = manager.room_stats("room1").await.unwrap();
        assert!(stats.watchers.is_empty());
        assert!(manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_broadcaster_disconnect_closes_room() {
        let (registry, manager) = setup();
        let a = Peer::connect(&registry).await;
        let mut w1 = Peer::connect(&registry).await;
        let mut w2 = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.join_as_watcher(Some("room1"), w1.id).await);
        assert_ok!(manager.join_as_watcher(Some("room1"), w2.id).await);

        registry.unregister(a.id).await;
        manager.handle_disconnect(a.id).await;

        assert!(manager.is_room_available(Some("room1")).await);
        assert!(!manager.conference_active().await);
        assert_eq!(w1.events(), vec![ServerEvent::EndConference]);
        assert_eq!(w2.events(), vec![ServerEvent::EndConference]);

        // Former watchers no longer count as members of anything
        manager.handle_disconnect(w1.id).await;
        assert_eq!(manager.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        a.events();

        manager.handle_disconnect(ConnectionId::new()).await;

        assert!(a.events().is_empty());
        assert_eq!(manager.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_room_name_reusable_after_end() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.join_as_watcher(Some("room1"), b.id).await);
        assert_ok!(manager.end_broadcast(Some("room1")).await);
        a.events();
        b.events();

        assert_ok!(manager.start_broadcast(Some("room1"), b.id).await);

        // The old group was dissolved, so only the new broadcaster hears it
        assert!(a.events().is_empty());
        assert_eq!(
            b.events(),
            vec![ServerEvent::Broadcaster {
                room: "room1".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_conference_flag_tracks_any_room() {
        let (registry, manager) = setup();
        let a = Peer::connect(&registry).await;
        let b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.start_broadcast(Some("room2"), b.id).await);
        assert_eq!(manager.room_names().await, vec!["room1", "room2"]);

        assert_ok!(manager.end_broadcast(Some("room1")).await);

        assert!(manager.conference_active().await);
        assert_eq!(manager.room_names().await, vec!["room2"]);

        assert_ok!(manager.end_broadcast(Some("room2")).await);
        assert!(!manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_conference_flag_last_transition() {
        let registry = Arc::new(ConnectionRegistry::new());
        let manager = RoomManager::with_config(
            Arc::clone(&registry),
            RoomConfig::default().conference_flag(ConferenceFlagPolicy::LastTransition),
        );
        let a = Peer::connect(&registry).await;
        let b = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert_ok!(manager.start_broadcast(Some("room2"), b.id).await);
        assert_ok!(manager.end_broadcast(Some("room1")).await);

        // room2 is still live but the flag follows the last teardown
        assert_eq!(manager.room_count().await, 1);
        assert!(!manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;
        let offer = json!({"sdp": "offer-sdp"});
        let answer = json!({"sdp": "answer-sdp"});

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        assert!(manager.conference_active().await);
        a.events();

        assert_ok!(manager.join_as_watcher(Some("room1"), b.id).await);
        assert_eq!(a.events(), vec![ServerEvent::Watcher { watcher: b.id }]);

        manager
            .relay_negotiation(NegotiationKind::Offer, Some(b.id), a.id, offer.clone())
            .await;
        assert_eq!(
            b.events(),
            vec![ServerEvent::Negotiation {
                kind: NegotiationKind::Offer,
                sender: a.id,
                payload: offer,
            }]
        );

        manager
            .relay_negotiation(NegotiationKind::Answer, Some(a.id), b.id, answer.clone())
            .await;
        assert_eq!(
            a.events(),
            vec![ServerEvent::Negotiation {
                kind: NegotiationKind::Answer,
                sender: b.id,
                payload: answer,
            }]
        );

        assert_ok!(manager.end_broadcast(Some("room1")).await);
        assert_eq!(a.events(), vec![ServerEvent::EndConference]);
        assert_eq!(b.events(), vec![ServerEvent::EndConference]);
        assert!(manager.is_room_available(Some("room1")).await);
        assert!(!manager.conference_active().await);
    }

    #[tokio::test]
    async fn test_closed_connection_cannot_join() {
        let (registry, manager) = setup();
        let mut a = Peer::connect(&registry).await;
        let b = Peer::connect(&registry).await;
        let c = Peer::connect(&registry).await;

        assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
        a.events();

        registry.unregister(b.id).await;
        registry.unregister(c.id).await;

        assert_eq!(
            manager.join_as_watcher(Some("room1"), b.id).await,
            Err(RoomError::ConnectionClosed)
        );
        assert_eq!(
            manager.start_broadcast(Some("room2"), c.id).await,
            Err(RoomError::ConnectionClosed)
        );

        assert!(a.events().is_empty());
        assert_eq!(registry.group_members("room1").await, vec![a.id]);
        assert_eq!(manager.room_names().await, vec!["room1".to_string()]);
        assert_eq!(manager.room_stats("room1").await.unwrap().watcher_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_and_end_leave_no_members() {
        let registry = Arc::new(ConnectionRegistry::new());
        let manager = Arc::new(RoomManager::new(Arc::clone(&registry)));
        let mut a = Peer::connect(&registry).await;
        let mut b = Peer::connect(&registry).await;

        for _ in 0..500 {
            assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
            a.events();

            let join = tokio::spawn({
                let manager = Arc::clone(&manager);
                let watcher = b.id;
                async move { manager.join_as_watcher(Some("room1"), watcher).await }
            });
            let end = tokio::spawn({
                let manager = Arc::clone(&manager);
                async move { manager.end_broadcast(Some("room1")).await }
            });

            let joined = join.await.unwrap();
            assert_ok!(end.await.unwrap());

            assert_eq!(manager.room_count().await, 0);
            assert!(registry.group_members("room1").await.is_empty());

            let events = b.events();
            if joined.is_ok() {
                assert_eq!(events, vec![ServerEvent::EndConference]);
            } else {
                assert_eq!(joined, Err(RoomError::RoomNotFound("room1".into())));
                assert!(events.is_empty());
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_start_and_end_keep_groups_in_sync() {
        let registry = Arc::new(ConnectionRegistry::new());
        let manager = Arc::new(RoomManager::new(Arc::clone(&registry)));
        let mut a = Peer::connect(&registry).await;
        let mut c = Peer::connect(&registry).await;

        for _ in 0..500 {
            assert_ok!(manager.start_broadcast(Some("room1"), a.id).await);
            a.events();

            let start = tokio::spawn({
                let manager = Arc::clone(&manager);
                let broadcaster = c.id;
                async move { manager.start_broadcast(Some("room1"), broadcaster).await }
            });
            let end = tokio::spawn({
                let manager = Arc::clone(&manager);
                async move { manager.end_broadcast(Some("room1")).await }
            });

            let started = start.await.unwrap();
            assert_ok!(end.await.unwrap());

            match manager.room_stats("room1").await {
                Some(stats) => {
                    assert!(started.is_ok());
                    assert_eq!(stats.broadcaster, c.id);
                    assert_eq!(registry.group_members("room1").await, vec![c.id]);
                    assert_eq!(
                        c.events(),
                        vec![ServerEvent::Broadcaster {
                            room: "room1".into()
                        }]
                    );

                    assert_ok!(manager.end_broadcast(Some("room1")).await);
                    assert_eq!(c.events(), vec![ServerEvent::EndConference]);
                }
                None => {
                    assert_eq!(started, Err(RoomError::RoomOccupied("room1".into())));
                    assert!(registry.group_members("room1").await.is_empty());
                    assert!(c.events().is_empty());
                }
            }
        }
    }
}
