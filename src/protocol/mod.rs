//! Signaling wire protocol
//!
//! Every WebSocket text frame carries one JSON object. Clients send named
//! events with positional arguments and an optional acknowledgment id; the
//! server sends named events and acknowledgment replies.
//!
//! ```text
//! client → server   {"event": "watcher", "args": ["room1"]}
//!                   {"event": "checkRoomAvailability", "args": ["room1"], "ack": 3}
//! server → client   {"event": "watcher", "args": ["<connection-id>"]}
//!                   {"ack": 3, "args": [true]}
//! ```
//!
//! Negotiation payloads (`offer`, `answer`, `candidate`) are carried as
//! arbitrary JSON values and are never inspected.

pub mod error;
pub mod event;
pub mod frame;

pub use error::ProtocolError;
pub use event::{ClientEvent, NegotiationKind, ServerEvent};
pub use frame::{InboundFrame, OutboundFrame};
