//! WebSocket transport to an Xpra server.
//!
//! Architecture:
//! - [`WsTransport`] is the synchronous handle the
//!   [`Client`](crate::application::Client) owns.  Every trait call becomes a
//!   [`Command`] on an unbounded channel, so none of them block.
//! - `open` spawns one tokio task per connection attempt chain.  The task
//!   connects with `tokio-tungstenite`, then `select!`s between outbound
//!   commands and inbound frames.
//! - Inbound text frames are decoded with
//!   [`decode_packet_text`](xpra_core::decode_packet_text) and forwarded as
//!   [`TransportEvent::Packet`] on the events channel returned by
//!   [`WsTransport::new`].
//!
//! # Framing
//!
//! One packet per text frame, encoded as a JSON array:
//!
//! ```text
//! ["focus", 7]
//! ```
//!
//! Binary frames are not used by this encoding and are ignored.
//!
//! # Buffering and reconnection
//!
//! Packets sent before the socket opens stay queued in the command channel
//! and are written, oldest first, as soon as it does.  A `flush` queued before
//! the open discards everything queued ahead of it, and a `close` queued
//! before the open drops the fresh socket without reporting
//! [`TransportEvent::Open`].  When the connection
//! drops and `reconnect` is enabled, the task reports
//! [`TransportEvent::Reconnecting`] and retries after a fixed interval.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
    time,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};
use xpra_core::{decode_packet_text, encode_packet_text, ClientPacket, ProtocolError};

use crate::application::config::ClientConfig;
use crate::application::transport::{Transport, TransportEvent};

/// Delay between reconnection attempts.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Errors that end one WebSocket connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URI is not a `ws://` or `wss://` URL.
    #[error("invalid WebSocket URI: {uri}")]
    InvalidUri { uri: String },
    /// Handshake or socket failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
    /// Nobody is listening for transport events any more.
    #[error("transport event channel closed")]
    ChannelClosed,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Instruction from the handle to the connection task.
#[derive(Debug)]
enum Command {
    Send(ClientPacket),
    Flush,
    Close,
}

/// How a connected session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// `close()` was called or the handle was dropped.
    Closed,
    /// The server or the network ended it.
    Dropped,
}

struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// WebSocket implementation of [`Transport`].
pub struct WsTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    connection: Option<Connection>,
    reconnect_interval: Duration,
}

impl WsTransport {
    /// Creates an idle transport and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let transport = Self {
            events,
            connection: None,
            reconnect_interval: RECONNECT_INTERVAL,
        };
        (transport, rx)
    }

    /// Overrides [`RECONNECT_INTERVAL`].
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    fn command(&self, command: Command) {
        match &self.connection {
            Some(conn) => {
                if conn.commands.send(command).is_err() {
                    debug!("connection task has exited; command dropped");
                }
            }
            None => debug!(?command, "transport not open; command dropped"),
        }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, config: &ClientConfig) {
        if let Some(old) = self.connection.take() {
            old.task.abort();
        }
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(
            config.uri.clone(),
            config.reconnect,
            self.reconnect_interval,
            commands_rx,
            self.events.clone(),
        ));
        self.connection = Some(Connection { commands, task });
    }

    fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            // The task exits on its own once it reads `Close`.
            let _ = conn.commands.send(Command::Close);
        }
    }

    fn send(&mut self, packet: ClientPacket) {
        self.command(Command::Send(packet));
    }

    fn flush(&mut self) {
        self.command(Command::Flush);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.task.abort();
        }
    }
}

// ── Connection task ───────────────────────────────────────────────────────────

fn validate_uri(uri: &str) -> Result<(), TransportError> {
    if uri.starts_with("ws://") || uri.starts_with("wss://") {
        Ok(())
    } else {
        Err(TransportError::InvalidUri {
            uri: uri.to_string(),
        })
    }
}

fn emit(
    events: &mpsc::UnboundedSender<TransportEvent>,
    event: TransportEvent,
) -> Result<(), TransportError> {
    events.send(event).map_err(|_| TransportError::ChannelClosed)
}

/// Connects, runs the session, and reconnects until closed.
async fn run_connection(
    uri: String,
    reconnect: bool,
    interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    if let Err(e) = validate_uri(&uri) {
        warn!("{e}");
        let _ = emit(&events, TransportEvent::Close);
        return;
    }

    let mut backlog = Vec::new();
    loop {
        match connect_and_drive(&uri, &mut backlog, &mut commands, &events).await {
            Ok(SessionEnd::Closed) => {
                debug!(%uri, "transport closed locally");
                return;
            }
            Ok(SessionEnd::Dropped) => info!(%uri, "connection lost"),
            Err(TransportError::ChannelClosed) => return,
            Err(e) => warn!(%uri, "connection failed: {e}"),
        }

        if emit(&events, TransportEvent::Close).is_err() || !reconnect {
            return;
        }
        if emit(&events, TransportEvent::Reconnecting).is_err() {
            return;
        }
        info!(%uri, "reconnecting in {interval:?}");
        if wait_before_retry(interval, &mut backlog, &mut commands).await == SessionEnd::Closed {
            return;
        }
    }
}

async fn connect_and_drive(
    uri: &str,
    backlog: &mut Vec<ClientPacket>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<TransportEvent>,
) -> Result<SessionEnd, TransportError> {
    let (mut ws, _response) = connect_async(uri).await?;
    info!(%uri, "WebSocket connected");

    // A `close()` issued during the handshake wins over the new socket.
    if drain_backlog(backlog, commands) == SessionEnd::Closed {
        let _ = ws.close(None).await;
        return Ok(SessionEnd::Closed);
    }
    emit(events, TransportEvent::Open)?;
    drive(ws, std::mem::take(backlog), commands, events).await
}

/// Moves commands queued while disconnected into `backlog`, applying `Flush`.
fn drain_backlog(
    backlog: &mut Vec<ClientPacket>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    while let Ok(command) = commands.try_recv() {
        if apply_offline(command, backlog) == SessionEnd::Closed {
            return SessionEnd::Closed;
        }
    }
    SessionEnd::Dropped
}

fn apply_offline(command: Command, backlog: &mut Vec<ClientPacket>) -> SessionEnd {
    match command {
        Command::Send(packet) => backlog.push(packet),
        Command::Flush => backlog.clear(),
        Command::Close => return SessionEnd::Closed,
    }
    SessionEnd::Dropped
}

/// Sleeps for `interval`, buffering sends and staying responsive to `close`.
async fn wait_before_retry(
    interval: Duration,
    backlog: &mut Vec<ClientPacket>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    let sleep = time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return SessionEnd::Dropped,
            command = commands.recv() => {
                let Some(command) = command else {
                    return SessionEnd::Closed;
                };
                if apply_offline(command, backlog) == SessionEnd::Closed {
                    return SessionEnd::Closed;
                }
            }
        }
    }
}

async fn drive(
    ws: WsStream,
    backlog: Vec<ClientPacket>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<TransportEvent>,
) -> Result<SessionEnd, TransportError> {
    let (mut sink, mut stream) = ws.split();

    for packet in backlog {
        sink.send(WsMessage::Text(encode_packet_text(&packet))).await?;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(packet)) => {
                    debug!(packet = packet.name(), "send");
                    sink.send(WsMessage::Text(encode_packet_text(&packet))).await?;
                }
                // Everything queued so far has already been written.
                Some(Command::Flush) => {}
                Some(Command::Close) | None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return Ok(SessionEnd::Closed);
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => forward(&text, events)?,
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "server sent close frame");
                    return Ok(SessionEnd::Dropped);
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    debug!(len = bytes.len(), "ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(SessionEnd::Dropped),
            },
        }
    }
}

/// Decodes one text frame and hands it to the client.
fn forward(text: &str, events: &mpsc::UnboundedSender<TransportEvent>) -> Result<(), TransportError> {
    match decode_packet_text(text) {
        Ok(packet) => {
            debug!(packet = packet.name(), "recv");
            emit(events, TransportEvent::Packet(packet))
        }
        Err(ProtocolError::UnknownPacket(name)) => {
            debug!(%name, "ignoring unhandled packet");
            Ok(())
        }
        Err(e) => {
            warn!("dropping undecodable frame: {e}");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
