//! Relay instructions produced by the room manager

use crate::protocol::ServerEvent;

use super::id::ConnectionId;

/// One step of a relay plan
///
/// The room manager builds a plan while holding its lock and hands it to
/// [`super::ConnectionRegistry::apply`] before releasing it. Steps are
/// applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Relay {
    /// Add a connection to a multicast group
    Join { connection: ConnectionId, group: String },

    /// Send to a single connection
    ///
    /// Never delivered back to `from` when the target is the sender itself.
    Direct {
        to: ConnectionId,
        from: Option<ConnectionId>,
        event: ServerEvent,
    },

    /// Send to every member of a group, optionally skipping one connection
    Multicast {
        group: String,
        event: ServerEvent,
        exclude: Option<ConnectionId>,
    },

    /// Remove every member from a group
    Dissolve { group: String },
}
