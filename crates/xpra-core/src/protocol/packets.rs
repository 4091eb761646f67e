//! Every packet the session client sends or understands.
//!
//! Packets on the wire are ordered lists: the first element is the packet name
//! and the remaining elements are positional arguments.  The names and argument
//! positions below are the contract with an unmodified Xpra server; do not
//! reorder fields when encoding.
//!
//! ```text
//! ["new-window", 7, 0, 0, 100, 50, {"title": "xterm"}, {}]
//!   name          wid x  y  w    h   metadata           properties
//! ```
//!
//! # Why two enums?
//!
//! Inbound ([`ServerPacket`]) and outbound ([`ClientPacket`]) traffic carry
//! different vocabularies.  Keeping them apart makes it a compile-time error to
//! try to send something only the server emits, and lets the dispatcher in the
//! client match exhaustively over everything it can receive.

use serde_json::{Map, Value};

use crate::domain::surface::Wid;

/// Free-form key/value map used for window metadata, client properties,
/// capability dictionaries, and draw options.
pub type Metadata = Map<String, Value>;

// ── Packet names ──────────────────────────────────────────────────────────────

/// Packet name strings, exactly as they appear on the wire.
pub mod names {
    // Shared
    pub const HELLO: &str = "hello";
    pub const PING: &str = "ping";

    // Client → server
    pub const PING_ECHO: &str = "ping_echo";
    pub const MAP_WINDOW: &str = "map-window";
    pub const FOCUS: &str = "focus";
    pub const CLOSE_WINDOW: &str = "close-window";
    pub const DESKTOP_SIZE: &str = "desktop_size";
    pub const LOGGING: &str = "logging";
    pub const KEY_ACTION: &str = "key-action";
    pub const POINTER_POSITION: &str = "pointer-position";
    pub const BUTTON_ACTION: &str = "button-action";

    // Server → client
    pub const WINDOW_METADATA: &str = "window-metadata";
    pub const WINDOW_RESIZED: &str = "window-resized";
    pub const NEW_WINDOW: &str = "new-window";
    pub const NEW_OVERRIDE_REDIRECT: &str = "new-override-redirect";
    pub const LOST_WINDOW: &str = "lost-window";
    pub const WINDOW_ICON: &str = "window-icon";
    pub const WINDOW_MOVE_RESIZE: &str = "window-move-resize";
    pub const STARTUP_COMPLETE: &str = "startup-complete";
    pub const NOTIFY_SHOW: &str = "notify_show";
    pub const NOTIFY_CLOSE: &str = "notify_close";
    pub const SEND_FILE: &str = "send-file";
    pub const OPEN_URL: &str = "open-url";
    pub const BELL: &str = "bell";
    pub const DRAW: &str = "draw";
    pub const EOS: &str = "eos";
    pub const DISCONNECT: &str = "disconnect";
}

// ── Inbound payloads ──────────────────────────────────────────────────────────

/// Payload shared by `new-window` and `new-override-redirect`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWindowPacket {
    pub wid: Wid,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    /// Window metadata (title, window-type, `transient-for`, ...).
    pub metadata: Metadata,
    /// Client properties the server associates with the window.
    pub properties: Metadata,
}

impl NewWindowPacket {
    /// Returns the `transient-for` hint, if the server supplied a non-zero one.
    pub fn transient_for(&self) -> Option<Wid> {
        self.metadata
            .get("transient-for")
            .and_then(Value::as_u64)
            .filter(|wid| *wid != 0)
    }
}

/// Payload shared by `draw` and `eos`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPacket {
    pub wid: Wid,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    /// Picture encoding name (`"png"`, `"rgb32"`, ...).
    pub coding: String,
    pub data: Vec<u8>,
    /// Damage sequence number; the renderer acknowledges it once painted.
    pub sequence: u64,
    pub rowstride: u32,
    pub options: Metadata,
}

/// `window-icon` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowIconPacket {
    pub wid: Wid,
    pub w: u32,
    pub h: u32,
    pub coding: String,
    pub data: Vec<u8>,
}

/// `notify_show` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPacket {
    pub bus_id: u64,
    pub nid: u64,
    pub replaces_id: u64,
    pub summary: String,
    pub body: String,
    /// Expiry in milliseconds; negative values mean "server default".
    pub timeout: i64,
    pub icon: Value,
    pub actions: Vec<Value>,
    pub hints: Metadata,
}

/// `send-file` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransferPacket {
    pub filename: String,
    pub mime: String,
    /// `true` when the server wants the file printed rather than saved.
    pub print: bool,
    /// Size announced by the server; must equal `data.len()`.
    pub size: u64,
    pub data: Vec<u8>,
}

/// A decoded server → client packet.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    /// Server capabilities.
    Hello(Metadata),
    /// Liveness probe; `echo` is returned verbatim in `ping_echo`.
    Ping { echo: Value },
    WindowMetadata { wid: Wid, metadata: Metadata },
    WindowResized { wid: Wid, w: u32, h: u32 },
    NewWindow(NewWindowPacket),
    NewOverrideRedirect(NewWindowPacket),
    LostWindow { wid: Wid },
    WindowIcon(WindowIconPacket),
    WindowMoveResize { wid: Wid, x: i32, y: i32, w: u32, h: u32 },
    StartupComplete,
    NotifyShow(NotificationPacket),
    NotifyClose { nid: u64 },
    SendFile(FileTransferPacket),
    OpenUrl { url: String, extra: Vec<Value> },
    Bell,
    Draw(DrawPacket),
    Eos(DrawPacket),
    Disconnect { reason: String },
}

impl ServerPacket {
    /// Returns the wire name of this packet.
    pub fn name(&self) -> &'static str {
        match self {
            ServerPacket::Hello(_) => names::HELLO,
            ServerPacket::Ping { .. } => names::PING,
            ServerPacket::WindowMetadata { .. } => names::WINDOW_METADATA,
            ServerPacket::WindowResized { .. } => names::WINDOW_RESIZED,
            ServerPacket::NewWindow(_) => names::NEW_WINDOW,
            ServerPacket::NewOverrideRedirect(_) => names::NEW_OVERRIDE_REDIRECT,
            ServerPacket::LostWindow { .. } => names::LOST_WINDOW,
            ServerPacket::WindowIcon(_) => names::WINDOW_ICON,
            ServerPacket::WindowMoveResize { .. } => names::WINDOW_MOVE_RESIZE,
            ServerPacket::StartupComplete => names::STARTUP_COMPLETE,
            ServerPacket::NotifyShow(_) => names::NOTIFY_SHOW,
            ServerPacket::NotifyClose { .. } => names::NOTIFY_CLOSE,
            ServerPacket::SendFile(_) => names::SEND_FILE,
            ServerPacket::OpenUrl { .. } => names::OPEN_URL,
            ServerPacket::Bell => names::BELL,
            ServerPacket::Draw(_) => names::DRAW,
            ServerPacket::Eos(_) => names::EOS,
            ServerPacket::Disconnect { .. } => names::DISCONNECT,
        }
    }
}

// ── Outbound packets ──────────────────────────────────────────────────────────

/// A client → server packet.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    /// Client capabilities.
    Hello(Metadata),
    /// Liveness probe carrying a millisecond timestamp.
    Ping { time_ms: u64 },
    /// Reply to a server `ping`: the server's value followed by four zeroes.
    PingEcho { echo: Value },
    MapWindow {
        wid: Wid,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        properties: Metadata,
    },
    Focus { wid: Wid },
    CloseWindow { wid: Wid },
    /// New desktop size plus the screen layout list.
    DesktopSize { w: u32, h: u32, screens: Value },
    /// Remote log record: numeric level and the record's lines.
    Logging { level: u8, lines: Vec<String> },
    KeyAction {
        wid: Wid,
        keyname: String,
        pressed: bool,
        modifiers: Vec<String>,
        keyval: u32,
        string: String,
        keycode: u32,
        group: u32,
    },
    PointerPosition {
        wid: Wid,
        x: i32,
        y: i32,
        modifiers: Vec<String>,
        buttons: Vec<u32>,
    },
    ButtonAction {
        wid: Wid,
        button: u32,
        pressed: bool,
        x: i32,
        y: i32,
        modifiers: Vec<String>,
        buttons: Vec<u32>,
    },
}

impl ClientPacket {
    /// Returns the wire name of this packet.
    pub fn name(&self) -> &'static str {
        match self {
            ClientPacket::Hello(_) => names::HELLO,
            ClientPacket::Ping { .. } => names::PING,
            ClientPacket::PingEcho { .. } => names::PING_ECHO,
            ClientPacket::MapWindow { .. } => names::MAP_WINDOW,
            ClientPacket::Focus { .. } => names::FOCUS,
            ClientPacket::CloseWindow { .. } => names::CLOSE_WINDOW,
            ClientPacket::DesktopSize { .. } => names::DESKTOP_SIZE,
            ClientPacket::Logging { .. } => names::LOGGING,
            ClientPacket::KeyAction { .. } => names::KEY_ACTION,
            ClientPacket::PointerPosition { .. } => names::POINTER_POSITION,
            ClientPacket::ButtonAction { .. } => names::BUTTON_ACTION,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_window_with_metadata(metadata: Value) -> NewWindowPacket {
        NewWindowPacket {
            wid: 3,
            x: 0,
            y: 0,
            w: 10,
            h: 10,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            properties: Metadata::new(),
        }
    }

    #[test]
    fn test_transient_for_returns_parent_wid() {
        let packet = new_window_with_metadata(json!({"transient-for": 5}));
        assert_eq!(packet.transient_for(), Some(5));
    }

    #[test]
    fn test_transient_for_treats_zero_as_absent() {
        let packet = new_window_with_metadata(json!({"transient-for": 0}));
        assert_eq!(packet.transient_for(), None);
    }

    #[test]
    fn test_transient_for_absent_returns_none() {
        let packet = new_window_with_metadata(json!({"title": "menu"}));
        assert_eq!(packet.transient_for(), None);
    }

    #[test]
    fn test_client_packet_names_match_wire_vocabulary() {
        assert_eq!(ClientPacket::Ping { time_ms: 1 }.name(), "ping");
        assert_eq!(ClientPacket::PingEcho { echo: json!(1) }.name(), "ping_echo");
        assert_eq!(ClientPacket::Focus { wid: 1 }.name(), "focus");
        assert_eq!(ClientPacket::CloseWindow { wid: 1 }.name(), "close-window");
        assert_eq!(
            ClientPacket::DesktopSize { w: 1, h: 1, screens: json!([]) }.name(),
            "desktop_size"
        );
    }

    #[test]
    fn test_server_packet_names_match_wire_vocabulary() {
        assert_eq!(ServerPacket::StartupComplete.name(), "startup-complete");
        assert_eq!(ServerPacket::LostWindow { wid: 1 }.name(), "lost-window");
        assert_eq!(ServerPacket::Bell.name(), "bell");
    }
}
