//! Mock transport for unit testing.
//!
//! # Why a mock transport?
//!
//! The real [`WsTransport`](super::WsTransport) needs a tokio runtime and a
//! live Xpra server.  `MockTransport` records every call in memory instead,
//! so a test can drive a [`Client`](crate::application::Client) with
//! hand-made [`TransportEvent`](crate::application::TransportEvent)s and then
//! inspect exactly which packets it sent, in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let transport = MockTransport::new();
//! let mut client = Client::new(defaults, Collaborators {
//!     transport: Box::new(transport.clone()),
//!     ..
//! });
//!
//! client.handle(TransportEvent::Packet(ServerPacket::Ping { echo: json!(1) }));
//!
//! assert_eq!(transport.sent_names(), vec!["ping_echo"]);
//! ```
//!
//! Clones share the same records, so keep one clone for assertions and give
//! the other to the client.

use std::sync::{Arc, Mutex};

use xpra_core::ClientPacket;

use crate::application::config::ClientConfig;
use crate::application::transport::Transport;

/// A transport that records calls without doing any I/O.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// URI passed to each `open` call.
    pub opened: Arc<Mutex<Vec<String>>>,
    /// Every packet passed to `send`, oldest first.
    pub sent: Arc<Mutex<Vec<ClientPacket>>>,
    pub closes: Arc<Mutex<usize>>,
    pub flushes: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_uris(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<ClientPacket> {
        self.sent.lock().unwrap().clone()
    }

    /// Wire names of the sent packets.
    pub fn sent_names(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().iter().map(ClientPacket::name).collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, config: &ClientConfig) {
        self.opened.lock().unwrap().push(config.uri.clone());
    }

    fn close(&mut self) {
        *self.closes.lock().unwrap() += 1;
    }

    fn send(&mut self, packet: ClientPacket) {
        self.sent.lock().unwrap().push(packet);
    }

    fn flush(&mut self) {
        *self.flushes.lock().unwrap() += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_records() {
        // Arrange
        let observer = MockTransport::new();
        let mut transport = observer.clone();

        // Act
        transport.send(ClientPacket::Focus { wid: 1 });
        transport.close();

        // Assert
        assert_eq!(observer.sent(), vec![ClientPacket::Focus { wid: 1 }]);
        assert_eq!(observer.close_count(), 1);
    }

    #[test]
    fn test_open_records_uri() {
        let mut transport = MockTransport::new();
        transport.open(&ClientConfig {
            uri: "ws://h:1".into(),
            ..Default::default()
        });
        assert_eq!(transport.opened_uris(), vec!["ws://h:1".to_string()]);
    }
}
