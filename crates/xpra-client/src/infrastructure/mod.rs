//! Infrastructure layer for the session client.
//!
//! Contains the adapters behind the application traits: the WebSocket
//! transport, DOM-to-X11 input translation, renderers, TOML config storage
//! and the tokio loop that drives a [`Client`](crate::application::Client).
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `xpra_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – `WsTransport` over `tokio-tungstenite`, plus a
//!   recording `MockTransport` for tests.
//!
//! - **`input_translation`** – `XpraKeyboard` and `XpraMouse`, which turn
//!   browser-style input events into `key-action`, `pointer-position` and
//!   `button-action` packets.
//!
//! - **`renderer`** – `HeadlessRenderer` (used by the binary, paints nothing)
//!   and `RecordingRenderer` for tests.
//!
//! - **`storage`** – loads and saves the TOML config file.
//!
//! - **`runner`** – the async session loop.

pub mod input_translation;
pub mod renderer;
pub mod runner;
pub mod storage;
pub mod transport;
