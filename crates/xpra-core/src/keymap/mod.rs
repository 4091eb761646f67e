//! Key translation tables for keyboard input injection.
//!
//! The server expects X11 KeySyms and keycodes; local input arrives as
//! browser-style DOM `key`/`code` strings.  Translation happens here, at the
//! boundary, so the rest of the client never sees platform key codes.

pub mod x11;

pub use x11::{dom_code_to_keycode, dom_key_to_keysym, Keysym};
