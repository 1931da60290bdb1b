//! Protocol decoding errors

use thiserror::Error;

/// Error raised while decoding a client frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not a JSON object with an `event` field
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Event name is not part of the protocol
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::MalformedFrame(err.to_string())
    }
}
