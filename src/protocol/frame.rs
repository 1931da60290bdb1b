//! JSON frame encoding and decoding

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ProtocolError;
use super::event::{ClientEvent, NegotiationKind, ServerEvent};

/// A decoded client frame, before event classification
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    /// Event name
    pub event: String,

    /// Positional arguments
    #[serde(default)]
    pub args: Vec<Value>,

    /// Acknowledgment id; the server answers with an ack frame carrying it
    #[serde(default)]
    pub ack: Option<u64>,
}

impl InboundFrame {
    /// Parse a frame from WebSocket text
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classify the frame into a client event
    pub fn decode(&self) -> Result<ClientEvent, ProtocolError> {
        let event = match self.event.as_str() {
            "checkConferenceStatus" => ClientEvent::CheckConferenceStatus,
            "checkRoomAvailability" => ClientEvent::CheckRoomAvailability {
                room: self.room_arg(),
            },
            "broadcaster" => ClientEvent::Broadcaster {
                room: self.room_arg(),
            },
            "watcher" => ClientEvent::Watcher {
                room: self.room_arg(),
            },
            "endConference" => ClientEvent::EndConference {
                room: self.room_arg(),
            },
            name => match NegotiationKind::from_event_name(name) {
                Some(kind) => ClientEvent::Negotiation {
                    kind,
                    target: self
                        .args
                        .first()
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse().ok()),
                    payload: self.args.get(1).cloned().unwrap_or(Value::Null),
                },
                None => return Err(ProtocolError::UnknownEvent(name.to_string())),
            },
        };

        Ok(event)
    }

    fn room_arg(&self) -> Option<String> {
        self.args
            .first()
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// A frame queued for delivery to a client
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// Named event
    Event(ServerEvent),

    /// Reply to a client frame that carried an ack id
    Ack { id: u64, args: Vec<Value> },
}

#[derive(Serialize)]
struct WireFrame<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ack: Option<u64>,
    args: Vec<Value>,
}

impl OutboundFrame {
    /// Successful acknowledgment carrying a single boolean
    pub fn ack_bool(id: u64, value: bool) -> Self {
        OutboundFrame::Ack {
            id,
            args: vec![Value::Bool(value)],
        }
    }

    /// Negative acknowledgment carrying a rejection reason
    pub fn ack_rejected(id: u64, reason: &str) -> Self {
        OutboundFrame::Ack {
            id,
            args: vec![Value::Bool(false), Value::String(reason.to_string())],
        }
    }

    /// Encode as WebSocket text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let wire = match self {
            OutboundFrame::Event(event) => WireFrame {
                event: Some(event.name()),
                ack: None,
                args: event.args(),
            },
            OutboundFrame::Ack { id, args } => WireFrame {
                event: None,
                ack: Some(*id),
                args: args.clone(),
            },
        };

        serde_json::to_string(&wire)
    }
}

impl From<ServerEvent> for OutboundFrame {
    fn from(event: ServerEvent) -> Self {
        OutboundFrame::Event(event)
    }
}
