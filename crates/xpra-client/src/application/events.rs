//! Outward-facing events and the bus that delivers them.
//!
//! The [`Client`](super::client::Client) never calls UI code directly.  Every
//! observable change (a window appeared, the connection dropped, the server
//! rang the bell) is published as one [`ClientEvent`] on the [`EventBus`], and
//! consumers subscribe either to one [`EventKind`] or to everything.
//!
//! Delivery is synchronous and single-threaded: `emit` returns after every
//! matching handler has run, in subscription order.

use serde::Serialize;
use xpra_core::protocol::packets::{FileTransferPacket, NotificationPacket};
use xpra_core::{SurfaceSnapshot, Wid};

use super::config::SessionState;
use super::input::{KeyInput, MouseInput};

/// Metadata of a file pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub mime: String,
    pub size: u64,
}

impl From<&FileTransferPacket> for FileInfo {
    fn from(packet: &FileTransferPacket) -> Self {
        Self {
            filename: packet.filename.clone(),
            mime: packet.mime.clone(),
            size: packet.size,
        }
    }
}

/// Every event the client publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Connection state changed (or was re-announced).
    State(SessionState),

    WindowCreate(SurfaceSnapshot),
    WindowDestroy(SurfaceSnapshot),
    WindowMetadata(SurfaceSnapshot),
    WindowResized(SurfaceSnapshot),
    /// Window icon as a `data:` URI.
    WindowIcon { wid: Wid, src: String, w: u32, h: u32 },
    WindowFocus { wid: Wid },
    WindowBlur { wid: Wid },

    OverlayCreate(SurfaceSnapshot),
    OverlayDestroy(SurfaceSnapshot),

    /// The server finished its startup sequence; the session is interactive.
    SystemStarted,
    SystemPrint { file: FileInfo, data: Vec<u8> },
    SystemUpload { file: FileInfo, data: Vec<u8> },
    SystemUrl { url: String, extra: Vec<serde_json::Value> },
    SystemBell,

    NotificationCreate(NotificationPacket),
    NotificationDestroy { nid: u64 },

    /// A keyboard event that was forwarded to the server.
    Key { input: KeyInput, wid: Wid },
    /// A mouse event that was forwarded to the server.
    Mouse { input: MouseInput, wid: Option<Wid> },
}

/// Discriminant of [`ClientEvent`], used to subscribe to one kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    State,
    WindowCreate,
    WindowDestroy,
    WindowMetadata,
    WindowResized,
    WindowIcon,
    WindowFocus,
    WindowBlur,
    OverlayCreate,
    OverlayDestroy,
    SystemStarted,
    SystemPrint,
    SystemUpload,
    SystemUrl,
    SystemBell,
    NotificationCreate,
    NotificationDestroy,
    Key,
    Mouse,
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::State(_) => EventKind::State,
            ClientEvent::WindowCreate(_) => EventKind::WindowCreate,
            ClientEvent::WindowDestroy(_) => EventKind::WindowDestroy,
            ClientEvent::WindowMetadata(_) => EventKind::WindowMetadata,
            ClientEvent::WindowResized(_) => EventKind::WindowResized,
            ClientEvent::WindowIcon { .. } => EventKind::WindowIcon,
            ClientEvent::WindowFocus { .. } => EventKind::WindowFocus,
            ClientEvent::WindowBlur { .. } => EventKind::WindowBlur,
            ClientEvent::OverlayCreate(_) => EventKind::OverlayCreate,
            ClientEvent::OverlayDestroy(_) => EventKind::OverlayDestroy,
            ClientEvent::SystemStarted => EventKind::SystemStarted,
            ClientEvent::SystemPrint { .. } => EventKind::SystemPrint,
            ClientEvent::SystemUpload { .. } => EventKind::SystemUpload,
            ClientEvent::SystemUrl { .. } => EventKind::SystemUrl,
            ClientEvent::SystemBell => EventKind::SystemBell,
            ClientEvent::NotificationCreate(_) => EventKind::NotificationCreate,
            ClientEvent::NotificationDestroy { .. } => EventKind::NotificationDestroy,
            ClientEvent::Key { .. } => EventKind::Key,
            ClientEvent::Mouse { .. } => EventKind::Mouse,
        }
    }
}

// ── Event bus ─────────────────────────────────────────────────────────────────

/// Boxed event handler.
pub type EventHandler = Box<dyn FnMut(&ClientEvent) + Send>;

/// Handle returned by [`EventBus::on`]; pass it to [`EventBus::off`] to
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` subscribes to every kind.
    kind: Option<EventKind>,
    handler: EventHandler,
}

/// Single-threaded publish/subscribe channel.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to events of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ClientEvent) + Send + 'static,
    {
        self.subscribe(Some(kind), Box::new(handler))
    }

    /// Subscribes `handler` to every event.
    pub fn on_any<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ClientEvent) + Send + 'static,
    {
        self.subscribe(None, Box::new(handler))
    }

    fn subscribe(&mut self, kind: Option<EventKind>, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, handler });
        id
    }

    /// Removes one subscription.  Returns `false` if it was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Delivers `event` to every matching handler, in subscription order.
    pub fn emit(&mut self, event: &ClientEvent) {
        let kind = event.kind();
        for sub in &mut self.subscriptions {
            if sub.kind.map_or(true, |k| k == kind) {
                (sub.handler)(event);
            }
        }
    }

    /// Removes every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
