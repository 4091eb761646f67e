//! The session client: connection lifecycle, window protocol, input gating.
//!
//! [`Client`] is a synchronous state machine.  It never blocks and never
//! spawns: the runtime loop (see `infrastructure::runner`) feeds it
//! [`TransportEvent`]s and calls [`Client::poll_timers`] when the deadline
//! from [`Client::next_deadline`] passes.  Everything the client observes is
//! published on its [`EventBus`].
//!
//! # Connection states
//!
//! ```text
//!            connect()                 startup-complete
//! disconnected ──────────► connecting ─────────────────► connected
//!      ▲                                                      │
//!      └───────────── disconnect() / transport Close ◄────────┘
//! ```
//!
//! `reconnecting` is an extra flag, set while the transport retries a
//! connection it lost by itself.  It takes precedence in [`Client::state`].
//!
//! # Focus
//!
//! `active_window` is the focused window id (`0` for none).
//! `last_active_window` remembers one earlier window so focus can fall back
//! to it when the active window closes.  It is a single slot, not a stack.

use std::collections::HashSet;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use xpra_core::protocol::packets::{
    DrawPacket, FileTransferPacket, NewWindowPacket, WindowIconPacket,
};
use xpra_core::{ClientPacket, Metadata, Renderer, ServerPacket, Surface, SurfaceRegistry, Wid};

use super::capabilities::{client_capabilities, screen_sizes, RGB_FORMATS, RGB_FORMATS_KEY};
use super::config::{ClientConfig, ConfigOverrides, SessionState};
use super::events::{ClientEvent, EventBus, EventKind, FileInfo, SubscriptionId};
use super::input::{KeyInput, KeyboardTranslator, MouseInput, MouseTranslator};
use super::transport::{Transport, TransportEvent};

/// Interval between liveness pings while connected.
pub const PING_FREQUENCY: Duration = Duration::from_secs(5);

/// Quiet period before a desktop resize is sent to the server.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Server capability that enables shipping log records to the server.
const REMOTE_LOGGING_CAP: &str = "remote-logging.multi-line";

/// Creates the renderer for each new surface.
pub trait RendererFactory: Send {
    fn create(&mut self, wid: Wid, w: u32, h: u32) -> Box<dyn Renderer>;
}

/// Everything the client talks to but does not own the logic of.
pub struct Collaborators {
    pub transport: Box<dyn Transport>,
    pub keyboard: Box<dyn KeyboardTranslator>,
    pub mouse: Box<dyn MouseTranslator>,
    pub renderers: Box<dyn RendererFactory>,
}

/// Severity of a diagnostic log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Log,
    Info,
    Debug,
}

impl LogLevel {
    /// Numeric level used by the `logging` packet.
    pub fn remote_level(self) -> u8 {
        match self {
            LogLevel::Error => 40,
            LogLevel::Warn => 30,
            LogLevel::Log | LogLevel::Info => 20,
            LogLevel::Debug => 10,
        }
    }
}

struct PendingResize {
    w: u32,
    h: u32,
    due: Instant,
}

/// Remote desktop session client.
pub struct Client {
    defaults: ConfigOverrides,
    config: ClientConfig,

    transport: Box<dyn Transport>,
    keyboard: Box<dyn KeyboardTranslator>,
    mouse: Box<dyn MouseTranslator>,
    renderers: Box<dyn RendererFactory>,

    registry: SurfaceRegistry,
    bus: EventBus,

    connected: bool,
    connecting: bool,
    reconnecting: bool,
    /// The last disconnect came from the transport, not from `disconnect()`.
    closed_by_transport: bool,
    /// An `open()` is outstanding.  Transport events arriving without one
    /// belong to a connection that was already closed locally.
    transport_active: bool,

    client_capabilities: Metadata,
    server_capabilities: Option<Metadata>,

    active_window: Wid,
    last_active_window: Wid,

    next_ping: Option<Instant>,
    pending_resize: Option<PendingResize>,
}

impl Client {
    /// Creates a disconnected client.
    ///
    /// `defaults` is the instance-level configuration layer; per-call options
    /// given to [`connect`](Self::connect) take precedence over it.
    pub fn new(defaults: ConfigOverrides, parts: Collaborators) -> Self {
        let config = ClientConfig::resolve(&defaults, &ConfigOverrides::default());
        Self {
            defaults,
            config,
            transport: parts.transport,
            keyboard: parts.keyboard,
            mouse: parts.mouse,
            renderers: parts.renderers,
            registry: SurfaceRegistry::new(),
            bus: EventBus::new(),
            connected: false,
            connecting: false,
            reconnecting: false,
            closed_by_transport: false,
            transport_active: false,
            client_capabilities: Metadata::new(),
            server_capabilities: None,
            active_window: 0,
            last_active_window: 0,
            next_ping: Some(Instant::now() + PING_FREQUENCY),
            pending_resize: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Configuration of the current (or last) connection attempt.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Externally visible state: `reconnecting` > `connecting` > `connected`.
    pub fn state(&self) -> SessionState {
        if self.reconnecting {
            SessionState::Reconnecting
        } else if self.connecting {
            SessionState::Connecting
        } else if self.connected {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn active_window(&self) -> Wid {
        self.active_window
    }

    pub fn last_active_window(&self) -> Wid {
        self.last_active_window
    }

    pub fn client_capabilities(&self) -> &Metadata {
        &self.client_capabilities
    }

    pub fn server_capabilities(&self) -> Option<&Metadata> {
        self.server_capabilities.as_ref()
    }

    /// Live window ids, ascending.
    pub fn window_ids(&self) -> Vec<Wid> {
        self.registry.wids()
    }

    pub fn find_surface(&self, wid: Wid) -> Option<&Surface> {
        self.registry.get(wid)
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.registry
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ClientEvent) + Send + 'static,
    {
        self.bus.on(kind, handler)
    }

    pub fn on_any<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ClientEvent) + Send + 'static,
    {
        self.bus.on_any(handler)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    // ── Connection lifecycle ──────────────────────────────────────────────────

    /// Opens a new connection, dropping any current one first.
    pub fn connect(&mut self, options: &ConfigOverrides) {
        self.config = ClientConfig::resolve(&self.defaults, options);
        self.disconnect(false);
        self.connecting = true;
        self.emit_state();
        info!(uri = %self.config.uri, "connecting");
        self.transport_active = true;
        self.transport.open(&self.config);
    }

    /// Tears the session down.
    ///
    /// `closing` is `true` when the transport already closed (or the server
    /// said goodbye), so there is nothing to close.  Surfaces are discarded
    /// in bulk without per-surface events.  Idempotent.
    pub fn disconnect(&mut self, closing: bool) {
        self.connected = false;
        self.connecting = false;

        if closing {
            self.closed_by_transport = true;
        } else {
            self.closed_by_transport = false;
            self.reconnecting = false;
            self.transport_active = false;
            self.transport.close();
        }

        self.emit_state();

        self.registry.clear();
        self.active_window = 0;
        self.last_active_window = 0;
        self.transport.flush();
    }

    /// Applies one transport event.  Never fails; problems are logged.
    ///
    /// Events that arrive after an explicit [`disconnect`](Self::disconnect)
    /// and before the next [`connect`](Self::connect) are dropped.
    pub fn handle(&mut self, event: TransportEvent) {
        if !self.transport_active {
            debug!(?event, "transport event after local close ignored");
            return;
        }
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Close => {
                debug!("transport closed");
                self.disconnect(true);
            }
            TransportEvent::Reconnecting => self.on_reconnecting(),
            TransportEvent::Packet(packet) => self.dispatch(packet),
        }
    }

    fn on_open(&mut self) {
        if !self.connected && (self.reconnecting || !self.connecting) {
            self.reconnecting = false;
            self.connecting = true;
            self.emit_state();
        }
        self.client_capabilities = client_capabilities(&self.config);
        self.server_capabilities = None;
        debug!("transport open, sending hello");
        self.send(ClientPacket::Hello(self.client_capabilities.clone()));
    }

    fn on_reconnecting(&mut self) {
        if self.closed_by_transport && !self.connected && !self.reconnecting {
            self.reconnecting = true;
            self.emit_state();
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    /// Earliest instant at which [`poll_timers`](Self::poll_timers) has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        let resize = self.pending_resize.as_ref().map(|r| r.due);
        match (self.next_ping, resize) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every timer due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(due) = self.next_ping {
            if now >= due {
                self.ping();
                self.next_ping = Some(now + PING_FREQUENCY);
            }
        }
        if self.pending_resize.as_ref().is_some_and(|r| now >= r.due) {
            if let Some(PendingResize { w, h, .. }) = self.pending_resize.take() {
                self.send_desktop_size(w, h);
            }
        }
    }

    /// Sends a liveness ping, only while connected.
    pub fn ping(&mut self) {
        if self.connected {
            self.send(ClientPacket::Ping {
                time_ms: unix_millis(),
            });
        }
    }

    /// Requests a new desktop size.  Calls within [`RESIZE_DEBOUNCE`] of each
    /// other collapse into one `desktop_size` carrying the last size.
    pub fn resize(&mut self, w: u32, h: u32) {
        self.pending_resize = Some(PendingResize {
            w,
            h,
            due: Instant::now() + RESIZE_DEBOUNCE,
        });
    }

    fn send_desktop_size(&mut self, w: u32, h: u32) {
        let screens = screen_sizes(w, h, self.config.dpi);
        self.send(ClientPacket::DesktopSize { w, h, screens });
    }

    /// Cancels both timers and drops every subscription.
    pub fn destroy(&mut self) {
        self.next_ping = None;
        self.pending_resize = None;
        self.bus.clear();
    }

    // ── Window operations ─────────────────────────────────────────────────────

    /// Focuses `wid`, telling the server only when focus actually changes.
    /// An unknown `wid` clears focus.
    pub fn focus(&mut self, wid: Wid) {
        if !self.registry.contains(wid) {
            self.active_window = 0;
            return;
        }
        if self.active_window != wid {
            self.send(ClientPacket::Focus { wid });
            if self.active_window != 0 {
                self.last_active_window = self.active_window;
            }
        }
        self.active_window = wid;
        self.emit(ClientEvent::WindowFocus { wid });
    }

    /// Asks the server to close `wid`.
    pub fn kill(&mut self, wid: Wid) {
        if self.registry.contains(wid) {
            self.send(ClientPacket::CloseWindow { wid });
        }
    }

    /// Forwards a draw to the surface, if it exists.
    pub fn render(&mut self, packet: &DrawPacket) {
        if let Some(surface) = self.registry.get_mut(packet.wid) {
            surface.draw(packet);
        }
    }

    /// Rescales every descendant of `parent`, depth-first.
    pub fn rescale_children(&mut self, parent: Wid, scale: f64) {
        let mut visited = HashSet::from([parent]);
        self.rescale_descendants(parent, scale, &mut visited);
    }

    fn rescale_descendants(&mut self, parent: Wid, scale: f64, visited: &mut HashSet<Wid>) {
        for child in self.registry.children_of(parent) {
            if !visited.insert(child) {
                continue;
            }
            if let Some(surface) = self.registry.get_mut(child) {
                surface.rescale(scale);
            }
            self.rescale_descendants(child, scale, visited);
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Forwards a keyboard event to `wid` (or the active window).
    ///
    /// Returns `false` when refused: not connected, or no target surface.
    pub fn key_inject(&mut self, input: &KeyInput, wid: Option<Wid>) -> bool {
        if !self.connected {
            return false;
        }
        let wid = wid.unwrap_or(self.active_window);
        let Some(surface) = self.registry.get(wid) else {
            return false;
        };
        let packets = self.keyboard.translate(input, surface);
        for packet in packets {
            self.transport.send(packet);
        }
        self.emit(ClientEvent::Key {
            input: input.clone(),
            wid,
        });
        true
    }

    /// Forwards a mouse event.  Returns `false` when not connected.
    pub fn mouse_inject(&mut self, input: &MouseInput) -> bool {
        if !self.connected {
            return false;
        }
        let surface = input.wid.and_then(|wid| self.registry.get(wid));
        let target = surface.map(|s| s.wid);
        let packets = self.mouse.translate(input, surface);
        for packet in packets {
            self.transport.send(packet);
        }
        self.emit(ClientEvent::Mouse {
            input: input.clone(),
            wid: target,
        });
        true
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    /// Logs a record, remotely when the server supports it, locally otherwise.
    pub fn log<I, S>(&mut self, level: LogLevel, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = args.into_iter().map(Into::into).collect();
        if self.connected && self.server_supports(REMOTE_LOGGING_CAP) {
            let lines = lines.iter().map(|l| to_latin1_safe(l)).collect();
            self.send(ClientPacket::Logging {
                level: level.remote_level(),
                lines,
            });
            return;
        }
        let message = lines.join(" ");
        match level {
            LogLevel::Error => error!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Log | LogLevel::Info => info!("{message}"),
            LogLevel::Debug => debug!("{message}"),
        }
    }

    fn server_supports(&self, cap: &str) -> bool {
        match self.server_capabilities.as_ref().and_then(|caps| caps.get(cap)) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }

    // ── Packet dispatch ───────────────────────────────────────────────────────

    fn dispatch(&mut self, packet: ServerPacket) {
        match packet {
            ServerPacket::Hello(caps) => {
                debug!(count = caps.len(), "server capabilities received");
                self.server_capabilities = Some(caps);
            }
            ServerPacket::Ping { echo } => self.send(ClientPacket::PingEcho { echo }),
            ServerPacket::Disconnect { reason } => {
                info!(%reason, "server requested disconnect");
                self.disconnect(true);
            }
            ServerPacket::StartupComplete => self.on_startup_complete(),
            ServerPacket::NewWindow(packet) => self.on_new_window(packet),
            ServerPacket::NewOverrideRedirect(packet) => self.on_new_override_redirect(packet),
            ServerPacket::WindowMetadata { wid, metadata } => {
                if let Some(surface) = self.registry.get_mut(wid) {
                    surface.update_metadata(metadata);
                    let snapshot = surface.snapshot();
                    self.emit(ClientEvent::WindowMetadata(snapshot));
                }
            }
            ServerPacket::WindowResized { wid, w, h } => {
                if let Some(surface) = self.registry.get_mut(wid) {
                    surface.resize(w, h);
                    let snapshot = surface.snapshot();
                    self.emit(ClientEvent::WindowResized(snapshot));
                }
            }
            ServerPacket::WindowMoveResize { wid, x, y, w, h } => {
                let line = format!("x11: window-move-resize not handled {wid} {x} {y} {w} {h}");
                self.log(LogLevel::Log, [line]);
            }
            ServerPacket::LostWindow { wid } => self.on_lost_window(wid),
            ServerPacket::WindowIcon(icon) => self.on_window_icon(icon),
            ServerPacket::NotifyShow(notification) => {
                self.emit(ClientEvent::NotificationCreate(notification));
            }
            ServerPacket::NotifyClose { nid } => {
                self.emit(ClientEvent::NotificationDestroy { nid });
            }
            ServerPacket::SendFile(file) => self.on_send_file(file),
            ServerPacket::OpenUrl { url, extra } => {
                self.emit(ClientEvent::SystemUrl { url, extra });
            }
            ServerPacket::Bell => self.emit(ClientEvent::SystemBell),
            ServerPacket::Draw(draw) | ServerPacket::Eos(draw) => self.render(&draw),
        }
    }

    fn on_startup_complete(&mut self) {
        self.emit(ClientEvent::SystemStarted);
        self.connected = true;
        self.connecting = false;
        self.reconnecting = false;
        self.closed_by_transport = false;
        self.log(LogLevel::Info, ["Xpra Client connected"]);
        self.emit_state();
    }

    fn on_new_window(&mut self, packet: NewWindowPacket) {
        self.last_active_window = 0;

        let NewWindowPacket {
            wid,
            x,
            y,
            w,
            h,
            metadata,
            properties,
        } = packet;

        let mut map_properties = properties.clone();
        let rgb_formats = self
            .client_capabilities
            .get(RGB_FORMATS_KEY)
            .cloned()
            .unwrap_or_else(|| json!(RGB_FORMATS));
        map_properties.insert(RGB_FORMATS_KEY.to_string(), rgb_formats);

        self.send(ClientPacket::MapWindow {
            wid,
            x,
            y,
            w,
            h,
            properties: map_properties,
        });
        self.send(ClientPacket::Focus { wid });

        let renderer = self.renderers.create(wid, w, h);
        let surface = Surface::new(wid, (x, y, w, h), metadata, properties, renderer);
        let snapshot = surface.snapshot();
        if let Some(replaced) = self.registry.insert(surface) {
            debug!(wid, "new-window replaced an existing surface");
            self.retire(replaced);
        }

        self.emit(ClientEvent::WindowCreate(snapshot));

        // `focus` was already sent above.
        self.active_window = wid;
        self.emit(ClientEvent::WindowFocus { wid });
    }

    fn on_new_override_redirect(&mut self, packet: NewWindowPacket) {
        let parent = packet.transient_for().unwrap_or(self.active_window);
        let Some(root) = self.registry.root_of(parent) else {
            debug!(wid = packet.wid, parent, "overlay parent gone, dropping overlay");
            return;
        };

        let NewWindowPacket {
            wid,
            x,
            y,
            w,
            h,
            metadata,
            properties,
        } = packet;
        let renderer = self.renderers.create(wid, w, h);
        let surface = Surface::new_overlay(wid, (x, y, w, h), metadata, properties, root, renderer);
        let snapshot = surface.snapshot();
        if let Some(replaced) = self.registry.insert(surface) {
            debug!(wid, "override-redirect replaced an existing surface");
            self.retire(replaced);
        }

        self.emit(ClientEvent::OverlayCreate(snapshot));
        self.last_active_window = root;
    }

    fn on_lost_window(&mut self, wid: Wid) {
        if let Some(surface) = self.registry.get(wid) {
            let snapshot = surface.snapshot();
            if snapshot.overlay {
                self.emit(ClientEvent::OverlayDestroy(snapshot));
            } else {
                if self.active_window == wid {
                    self.emit(ClientEvent::WindowBlur { wid });
                }
                self.emit(ClientEvent::WindowDestroy(snapshot));
            }
            if let Some(mut surface) = self.registry.remove(wid) {
                surface.destroy();
            }
        }

        if self.last_active_window == wid {
            self.last_active_window = 0;
        }
        if self.active_window == wid {
            let fallback = self.last_active_window;
            self.active_window = if self.registry.contains(fallback) {
                fallback
            } else {
                0
            };
        }
    }

    fn on_window_icon(&mut self, icon: WindowIconPacket) {
        if icon.coding != "png" {
            info!(wid = icon.wid, coding = %icon.coding, "x11: only png icons currently supported");
            return;
        }
        let src = format!("data:image/png;base64,{}", STANDARD.encode(&icon.data));
        self.emit(ClientEvent::WindowIcon {
            wid: icon.wid,
            src,
            w: icon.w,
            h: icon.h,
        });
    }

    fn on_send_file(&mut self, file: FileTransferPacket) {
        if file.data.len() as u64 != file.size {
            warn!(
                filename = %file.filename,
                mime = %file.mime,
                size = file.size,
                received = file.data.len(),
                "invalid file, size mismatch"
            );
            return;
        }
        let info = FileInfo::from(&file);
        let event = if file.print {
            ClientEvent::SystemPrint {
                file: info,
                data: file.data,
            }
        } else {
            ClientEvent::SystemUpload {
                file: info,
                data: file.data,
            }
        };
        self.emit(event);
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Announces and releases a surface displaced by a reused wid.
    fn retire(&mut self, mut surface: Surface) {
        let snapshot = surface.snapshot();
        if snapshot.overlay {
            self.emit(ClientEvent::OverlayDestroy(snapshot));
        } else {
            self.emit(ClientEvent::WindowDestroy(snapshot));
        }
        surface.destroy();
    }

    fn send(&mut self, packet: ClientPacket) {
        self.transport.send(packet);
    }

    fn emit(&mut self, event: ClientEvent) {
        self.bus.emit(&event);
    }

    fn emit_state(&mut self) {
        let state = self.state();
        debug!(%state, "session state");
        self.emit(ClientEvent::State(state));
    }
}

/// Re-encodes `s` so every UTF-8 byte becomes one Latin-1 character.
fn to_latin1_safe(s: &str) -> String {
    s.bytes().map(char::from).collect()
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
