//! Client and server event types

use serde_json::Value;

use crate::registry::ConnectionId;

/// Kind of negotiation message relayed between two peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationKind {
    /// Session description offer
    Offer,
    /// Session description answer
    Answer,
    /// ICE candidate
    Candidate,
}

impl NegotiationKind {
    /// Event name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationKind::Offer => "offer",
            NegotiationKind::Answer => "answer",
            NegotiationKind::Candidate => "candidate",
        }
    }

    /// Look up a kind by its wire event name
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "offer" => Some(NegotiationKind::Offer),
            "answer" => Some(NegotiationKind::Answer),
            "candidate" => Some(NegotiationKind::Candidate),
            _ => None,
        }
    }
}

impl std::fmt::Display for NegotiationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event received from a client
///
/// Room names are `None` when the argument was missing, empty or not a
/// string. The room manager rejects those without telling the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Ask whether any conference is running
    CheckConferenceStatus,

    /// Ask whether a room name is free
    CheckRoomAvailability { room: Option<String> },

    /// Announce the sender as broadcaster of a room
    Broadcaster { room: Option<String> },

    /// Join a room as watcher
    Watcher { room: Option<String> },

    /// Forward a negotiation message to another connection
    ///
    /// `target` is `None` when the id could not be parsed; such messages are
    /// dropped the same way as messages to a departed connection.
    Negotiation {
        kind: NegotiationKind,
        target: Option<ConnectionId>,
        payload: Value,
    },

    /// End a room's conference
    EndConference { room: Option<String> },
}

impl ClientEvent {
    /// Event name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CheckConferenceStatus => "checkConferenceStatus",
            ClientEvent::CheckRoomAvailability { .. } => "checkRoomAvailability",
            ClientEvent::Broadcaster { .. } => "broadcaster",
            ClientEvent::Watcher { .. } => "watcher",
            ClientEvent::Negotiation { kind, .. } => kind.as_str(),
            ClientEvent::EndConference { .. } => "endConference",
        }
    }
}

/// Event sent to a client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A room's broadcast has started
    Broadcaster { room: String },

    /// A watcher joined; sent to the broadcaster only
    Watcher { watcher: ConnectionId },

    /// Negotiation message forwarded from `sender`
    Negotiation {
        kind: NegotiationKind,
        sender: ConnectionId,
        payload: Value,
    },

    /// The room's conference is over
    EndConference,

    /// A watcher left; sent to the broadcaster only
    DisconnectPeer { peer: ConnectionId },
}

impl ServerEvent {
    /// Event name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Broadcaster { .. } => "broadcaster",
            ServerEvent::Watcher { .. } => "watcher",
            ServerEvent::Negotiation { kind, .. } => kind.as_str(),
            ServerEvent::EndConference => "endConference",
            ServerEvent::DisconnectPeer { .. } => "disconnectPeer",
        }
    }

    /// Positional arguments used on the wire
    pub fn args(&self) -> Vec<Value> {
        match self {
            ServerEvent::Broadcaster { room } => vec![Value::String(room.clone())],
            ServerEvent::Watcher { watcher } => vec![Value::String(watcher.to_string())],
            ServerEvent::Negotiation {
                sender, payload, ..
            } => vec![Value::String(sender.to_string()), payload.clone()],
            ServerEvent::EndConference => Vec::new(),
            ServerEvent::DisconnectPeer { peer } => vec![Value::String(peer.to_string())],
        }
    }
}
