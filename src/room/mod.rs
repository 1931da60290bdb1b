//! Room manager
//!
//! Owns every active room, the reverse index from connection to rooms, and
//! the global conference flag. Each room has exactly one broadcaster and any
//! number of watchers:
//!
//! ```text
//!   absent ──start_broadcast──► active ──end_broadcast / broadcaster leaves──► absent
//!                                 │ ▲
//!                                 └─┘ watcher joins / leaves
//! ```
//!
//! Mutating operations compute a [`crate::registry::Relay`] plan and apply it
//! to the connection registry before releasing the manager lock, so a room's
//! multicast group always matches its broadcaster and watchers.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use config::{ConferenceFlagPolicy, RoomConfig};
pub use entry::{RoomEntry, RoomStats};
pub use error::RoomError;
pub use store::RoomManager;
