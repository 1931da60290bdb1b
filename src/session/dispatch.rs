//! Client event dispatch
//!
//! Decodes client frames, calls the room manager, and builds the optional
//! acknowledgment reply. Query events (`checkConferenceStatus`,
//! `checkRoomAvailability`) answer with `[bool]`. Room commands
//! (`broadcaster`, `watcher`, `endConference`) stay silent unless the client
//! attached an ack id, in which case they answer `[true]` or
//! `[false, reason]`. Negotiation relays never answer.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::protocol::{ClientEvent, InboundFrame, OutboundFrame};
use crate::registry::OutboundReceiver;
use crate::room::{RoomError, RoomManager};

use super::context::SessionContext;

/// Routes client frames to the room manager
pub struct Dispatcher {
    rooms: Arc<RoomManager>,
}

impl Dispatcher {
    /// Create a dispatcher over a room manager
    pub fn new(rooms: Arc<RoomManager>) -> Self {
        Self { rooms }
    }

    /// Get the room manager
    pub fn rooms(&self) -> &Arc<RoomManager> {
        &self.rooms
    }

    /// Register a new connection
    ///
    /// Returns its context and the receiver the transport drains for
    /// outbound frames.
    pub async fn connect(&self, peer_addr: SocketAddr) -> (SessionContext, OutboundReceiver) {
        let ctx = SessionContext::new(peer_addr);
        let rx = self.rooms.connections().register(ctx.connection_id).await;

        tracing::info!(connection = %ctx.connection_id, peer = %peer_addr, "User connected");

        (ctx, rx)
    }

    /// Tear down a connection
    ///
    /// The connection leaves every group before room cleanup runs, so it
    /// never receives its own `endConference`.
    pub async fn disconnect(&self, ctx: &SessionContext) {
        self.rooms
            .connections()
            .unregister(ctx.connection_id)
            .await;
        self.rooms.handle_disconnect(ctx.connection_id).await;

        tracing::info!(
            connection = %ctx.connection_id,
            peer = %ctx.peer_addr,
            duration_secs = ctx.duration().as_secs(),
            "User disconnected"
        );
    }

    /// Handle one WebSocket text frame
    pub async fn handle_text(&self, ctx: &SessionContext, text: &str) -> Option<OutboundFrame> {
        match InboundFrame::parse(text) {
            Ok(frame) => self.dispatch(ctx, frame).await,
            Err(e) => {
                tracing::warn!(connection = %ctx.connection_id, error = %e, "Ignoring frame");
                None
            }
        }
    }

    /// Handle one decoded frame, returning the acknowledgment to send back
    pub async fn dispatch(&self, ctx: &SessionContext, frame: InboundFrame) -> Option<OutboundFrame> {
        let event = match frame.decode() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(connection = %ctx.connection_id, error = %e, "Ignoring frame");
                return None;
            }
        };
        let ack = frame.ack;
        let connection = ctx.connection_id;

        tracing::debug!(connection = %connection, event = event.name(), "Client event");

        match event {
            ClientEvent::CheckConferenceStatus => {
                let active = self.rooms.conference_active().await;
                ack.map(|id| OutboundFrame::ack_bool(id, active))
            }
            ClientEvent::CheckRoomAvailability { room } => {
                let available = self.rooms.is_room_available(room.as_deref()).await;
                ack.map(|id| OutboundFrame::ack_bool(id, available))
            }
            ClientEvent::Broadcaster { room } => {
                let result = self
                    .rooms
                    .start_broadcast(room.as_deref(), connection)
                    .await;
                ack.map(|id| command_ack(id, &result))
            }
            ClientEvent::Watcher { room } => {
                let result = self
                    .rooms
                    .join_as_watcher(room.as_deref(), connection)
                    .await;
                ack.map(|id| command_ack(id, &result))
            }
            ClientEvent::Negotiation {
                kind,
                target,
                payload,
            } => {
                self.rooms
                    .relay_negotiation(kind, target, connection, payload)
                    .await;
                None
            }
            ClientEvent::EndConference { room } => {
                let result = self.rooms.end_broadcast(room.as_deref()).await;
                ack.map(|id| command_ack(id, &result))
            }
        }
    }
}

fn command_ack(id: u64, result: &Result<(), RoomError>) -> OutboundFrame {
    match result {
        Ok(()) => OutboundFrame::ack_bool(id, true),
        Err(e) => OutboundFrame::ack_rejected(id, e.reason()),
    }
}
