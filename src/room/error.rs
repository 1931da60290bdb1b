//! Room operation rejections
//!
//! None of these reach the client unless it asked for an acknowledgment.

use thiserror::Error;

/// Reason a room operation was not applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Room name missing, empty or not a string
    #[error("Room name is missing or invalid")]
    InvalidRoomName,

    /// Room already has a broadcaster
    #[error("Room already occupied: {0}")]
    RoomOccupied(String),

    /// No active room with that name
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// The requesting connection has already gone away
    #[error("Connection already closed")]
    ConnectionClosed,
}

impl RoomError {
    /// Short machine-readable reason sent in negative acknowledgments
    pub fn reason(&self) -> &'static str {
        match self {
            RoomError::InvalidRoomName => "invalid_room_name",
            RoomError::RoomOccupied(_) => "room_occupied",
            RoomError::RoomNotFound(_) => "room_not_found",
            RoomError::ConnectionClosed => "connection_closed",
        }
    }
}
