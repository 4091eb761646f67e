//! Packet transports.
//!
//! - **`websocket`** – the production transport: one JSON text frame per
//!   packet, automatic reconnection at a fixed interval.
//! - **`mock`** – records every call for unit tests.

pub mod mock;
pub mod websocket;

pub use websocket::{TransportError, WsTransport};
