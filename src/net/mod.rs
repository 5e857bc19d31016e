//! Peer link, wire protocol and WebSocket transport

pub mod channel;
pub mod protocol;
pub mod transport;

pub use channel::{LinkEvent, PeerLink};
pub use protocol::PeerMsg;
