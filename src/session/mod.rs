//! Per-connection session handling
//!
//! A session is one client connection as seen by the protocol layer: its
//! identity and the dispatcher that turns its frames into room operations.

pub mod context;
pub mod dispatch;

pub use context::SessionContext;
pub use dispatch::Dispatcher;
