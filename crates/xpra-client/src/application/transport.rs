//! Transport seam.
//!
//! The transport owns the socket: framing, (de)serialization, buffering and
//! the reconnection policy.  The client only tells it to open, close, send
//! and flush; everything the transport observes comes back to the client as a
//! [`TransportEvent`], delivered by whoever drives the session (see
//! `infrastructure::runner`).

use xpra_core::{ClientPacket, ServerPacket};

use super::config::ClientConfig;

/// Lifecycle and data events reported by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is established; the handshake can start.
    Open,
    /// The connection closed or failed.
    Close,
    /// The transport is about to retry a dropped connection.
    Reconnecting,
    /// One decoded inbound packet.
    Packet(ServerPacket),
}

/// A bidirectional packet connection to the server.
///
/// All methods are fire-and-forget: failures surface later as
/// [`TransportEvent::Close`].
pub trait Transport: Send {
    /// Starts connecting with `config` (URI, reconnect policy).
    fn open(&mut self, config: &ClientConfig);

    /// Closes the connection and stops reconnecting.
    fn close(&mut self);

    /// Queues one packet.  Packets sent before the connection opens are
    /// buffered until it does.
    fn send(&mut self, packet: ClientPacket);

    /// Discards buffered outbound packets.
    fn flush(&mut self);
}
