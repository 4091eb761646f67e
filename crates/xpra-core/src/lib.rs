//! # xpra-core
//!
//! Shared library for the xpra-web session client containing the wire packet
//! vocabulary and codec, the Surface and registry domain entities, and the
//! DOM key → X11 keysym translation table.
//!
//! It has zero dependencies on sockets, async runtimes, or rendering backends.
//!
//! # Architecture overview (for beginners)
//!
//! An Xpra server runs X11 applications on a remote machine and streams each
//! of their windows to a client.  The client shows every remote window as a
//! local "surface", paints the pixels the server sends, and forwards local
//! keyboard and mouse input back to the server.
//!
//! This crate (`xpra-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The named packets exchanged with the server and the JSON
//!   codec that turns `["name", arg0, arg1, ...]` frames into typed Rust enums
//!   and back.
//!
//! - **`domain`** – The `Surface` entity (one remote window or overlay) and the
//!   `SurfaceRegistry` that owns all live surfaces and their parent links.
//!
//! - **`keymap`** – Translation from browser-style key names (`"Enter"`,
//!   `"ArrowLeft"`, `"a"`) to X11 keysym names and values, which is what the
//!   server's `key-action` packet expects.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `xpra_core::SurfaceRegistry` instead of `xpra_core::domain::registry::SurfaceRegistry`.
pub use domain::registry::SurfaceRegistry;
pub use domain::surface::{CanvasRect, Renderer, Surface, SurfaceSnapshot, Wid};
pub use keymap::x11::{dom_key_to_keysym, Keysym};
pub use protocol::codec::{
    decode_packet, decode_packet_text, encode_packet, encode_packet_text, ProtocolError,
};
pub use protocol::packets::{ClientPacket, Metadata, ServerPacket};
