//! xpra-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does xpra-client do? (for beginners)
//!
//! An Xpra server runs X11 applications on a remote machine and streams each
//! of their windows separately.  This crate is the *client* half of that
//! session:
//!
//! 1. Connects to the server over a WebSocket and exchanges `hello`
//!    capability dictionaries.
//! 2. Keeps one [`Surface`](xpra_core::Surface) per remote window, including
//!    popup menus and tooltips ("overlays") attached to their parent window.
//! 3. Forwards local keyboard and mouse input to the focused surface, but
//!    only while the session is fully connected.
//! 4. Answers liveness pings, sends its own, and reports desktop resizes.
//! 5. Publishes everything it observes as typed events so a UI can react.

/// Application layer: the session client, its events and collaborator seams.
pub mod application;

/// Infrastructure layer: WebSocket transport, input translators, renderers,
/// config storage and the async session runner.
pub mod infrastructure;
