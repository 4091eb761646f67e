//! End-to-end session scenarios against the public client API.
//!
//! Frames are fed in as JSON text, exactly as the WebSocket transport would
//! decode them, and outbound traffic is checked in its encoded wire form.

use std::sync::{Arc, Mutex};

use mockall::mock;
use proptest::prelude::*;
use serde_json::{json, Value};
use xpra_core::protocol::packets::DrawPacket;
use xpra_core::{decode_packet_text, encode_packet, CanvasRect, Renderer, Wid};

use xpra_client::application::{
    Client, ClientEvent, Collaborators, ConfigOverrides, EventKind, RendererFactory,
    SessionState, TransportEvent,
};
use xpra_client::infrastructure::input_translation::{XpraKeyboard, XpraMouse};
use xpra_client::infrastructure::renderer::mock::RecordingRendererFactory;
use xpra_client::infrastructure::transport::mock::MockTransport;

mock! {
    pub Canvas {}
    impl Renderer for Canvas {
        fn draw(&mut self, packet: &DrawPacket);
        fn clear_rect(&mut self, rect: CanvasRect);
        fn canvas_size(&self) -> (u32, u32);
        fn rescale(&mut self, scale: f64);
        fn release(&mut self);
    }
}

/// Hands out canvases that must be released exactly `releases` times.
struct StrictCanvasFactory {
    releases: usize,
}

impl RendererFactory for StrictCanvasFactory {
    fn create(&mut self, _wid: Wid, w: u32, h: u32) -> Box<dyn Renderer> {
        let mut canvas = MockCanvas::new();
        canvas.expect_canvas_size().return_const((w, h));
        canvas.expect_clear_rect().return_const(());
        canvas.expect_draw().return_const(());
        canvas.expect_rescale().return_const(());
        canvas.expect_release().times(self.releases).return_const(());
        Box::new(canvas)
    }
}

fn client_with(transport: &MockTransport, renderers: Box<dyn RendererFactory>) -> Client {
    Client::new(
        ConfigOverrides {
            uuid: Some("scenario".into()),
            ..Default::default()
        },
        Collaborators {
            transport: Box::new(transport.clone()),
            keyboard: Box::new(XpraKeyboard::new()),
            mouse: Box::new(XpraMouse::new()),
            renderers,
        },
    )
}

fn feed(client: &mut Client, frame: &str) {
    let packet = decode_packet_text(frame).expect("frame must decode");
    client.handle(TransportEvent::Packet(packet));
}

fn record(client: &mut Client) -> Arc<Mutex<Vec<ClientEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    client.on_any(move |e| sink.lock().unwrap().push(e.clone()));
    events
}

fn handshake(client: &mut Client) {
    client.connect(&ConfigOverrides::default());
    client.handle(TransportEvent::Open);
    feed(client, r#"["hello", {"version": "4.0"}]"#);
    feed(client, r#"["startup-complete"]"#);
}

fn wire(transport: &MockTransport) -> Vec<Value> {
    transport.sent().iter().map(encode_packet).collect()
}

#[test]
fn test_window_lifecycle_over_the_wire() {
    // Arrange
    let transport = MockTransport::new();
    let mut client = client_with(&transport, Box::new(StrictCanvasFactory { releases: 1 }));
    let events = record(&mut client);
    handshake(&mut client);
    assert_eq!(client.state(), SessionState::Connected);
    transport.clear_sent();

    // Act
    feed(&mut client, r#"["new-window", 7, 0, 0, 100, 50, {"title": "xterm"}, {}]"#);
    feed(&mut client, r#"["window-resized", 7, 200, 80]"#);
    feed(&mut client, r#"["lost-window", 7]"#);

    // Assert
    let sent = wire(&transport);
    assert_eq!(
        sent[0],
        json!(["map-window", 7, 0, 0, 100, 50, {"encodings.rgb_formats": ["RGBX", "RGBA"]}])
    );
    assert_eq!(sent[1], json!(["focus", 7]));
    assert!(client.window_ids().is_empty());
    assert_eq!(client.active_window(), 0);

    let kinds: Vec<EventKind> = events.lock().unwrap().iter().map(ClientEvent::kind).collect();
    let tail = &kinds[kinds.len() - 5..];
    assert_eq!(
        tail,
        [
            EventKind::WindowCreate,
            EventKind::WindowFocus,
            EventKind::WindowResized,
            EventKind::WindowBlur,
            EventKind::WindowDestroy,
        ]
    );
}

#[test]
fn test_disconnect_drops_surfaces_without_release() {
    let transport = MockTransport::new();
    let mut client = client_with(&transport, Box::new(StrictCanvasFactory { releases: 0 }));
    handshake(&mut client);
    feed(&mut client, r#"["new-window", 1, 0, 0, 10, 10, {}, {}]"#);
    feed(&mut client, r#"["new-override-redirect", 2, 0, 0, 5, 5, {"transient-for": 1}, {}]"#);

    client.disconnect(false);

    assert!(client.window_ids().is_empty());
    assert_eq!(client.state(), SessionState::Disconnected);
}

#[test]
fn test_server_ping_is_echoed_on_the_wire() {
    let transport = MockTransport::new();
    let mut client = client_with(&transport, Box::new(RecordingRendererFactory::new()));
    handshake(&mut client);
    transport.clear_sent();

    feed(&mut client, r#"["ping", 1700000000000]"#);

    assert_eq!(wire(&transport), vec![json!(["ping_echo", 1700000000000u64, 0, 0, 0, 0])]);
}

#[test]
fn test_nested_overlay_attaches_to_top_level_window() {
    let transport = MockTransport::new();
    let mut client = client_with(&transport, Box::new(RecordingRendererFactory::new()));
    handshake(&mut client);

    feed(&mut client, r#"["new-window", 1, 0, 0, 300, 300, {}, {}]"#);
    feed(&mut client, r#"["new-override-redirect", 2, 10, 10, 50, 50, {"transient-for": 1}, {}]"#);
    feed(&mut client, r#"["new-override-redirect", 3, 20, 20, 50, 50, {"transient-for": 2}, {}]"#);

    assert_eq!(client.surfaces().parent_of(3), Some(1));
    assert_eq!(client.last_active_window(), 1);
}

#[test]
fn test_input_is_refused_until_startup_complete() {
    let transport = MockTransport::new();
    let mut client = client_with(&transport, Box::new(RecordingRendererFactory::new()));
    client.connect(&ConfigOverrides::default());
    client.handle(TransportEvent::Open);
    feed(&mut client, r#"["new-window", 1, 0, 0, 10, 10, {}, {}]"#);
    let key = xpra_client::application::input::KeyInput {
        key: "a".into(),
        code: "KeyA".into(),
        pressed: true,
        modifiers: Default::default(),
    };

    assert!(!client.key_inject(&key, Some(1)));

    feed(&mut client, r#"["startup-complete"]"#);
    assert!(client.key_inject(&key, Some(1)));
}

// ── Property tests ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    NewWindow(Wid),
    Overlay(Wid, Option<Wid>),
    Lost(Wid),
    Focus(Wid),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..8).prop_map(Step::NewWindow),
        (1u64..8, proptest::option::of(1u64..8)).prop_map(|(w, p)| Step::Overlay(w, p)),
        (1u64..8).prop_map(Step::Lost),
        (1u64..8).prop_map(Step::Focus),
    ]
}

proptest! {
    /// Focus only ever points at a live surface (or nothing), and every
    /// parent link resolves to a live surface.
    #[test]
    fn prop_focus_and_parents_stay_valid(steps in proptest::collection::vec(step(), 0..40)) {
        let transport = MockTransport::new();
        let mut client = client_with(&transport, Box::new(RecordingRendererFactory::new()));
        handshake(&mut client);

        for s in steps {
            match s {
                Step::NewWindow(wid) => feed(
                    &mut client,
                    &format!(r#"["new-window", {wid}, 0, 0, 10, 10, {{}}, {{}}]"#),
                ),
                Step::Overlay(wid, parent) => {
                    let meta = parent
                        .map(|p| format!(r#"{{"transient-for": {p}}}"#))
                        .unwrap_or_else(|| "{}".to_string());
                    feed(
                        &mut client,
                        &format!(r#"["new-override-redirect", {wid}, 0, 0, 5, 5, {meta}, {{}}]"#),
                    );
                }
                Step::Lost(wid) => feed(&mut client, &format!(r#"["lost-window", {wid}]"#)),
                Step::Focus(wid) => client.focus(wid),
            }

            let active = client.active_window();
            prop_assert!(active == 0 || client.find_surface(active).is_some());
            for wid in client.window_ids() {
                if let Some(parent) = client.surfaces().parent_of(wid) {
                    prop_assert!(client.find_surface(parent).is_some());
                }
            }
        }
    }
}
