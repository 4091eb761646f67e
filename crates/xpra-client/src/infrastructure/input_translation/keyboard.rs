//! Keyboard translator producing Xpra `key-action` packets.
//!
//! ```text
//! ["key-action", wid, keyname, pressed, modifiers, keyval, string, keycode, group]
//! ```
//!
//! `keyname`/`keyval` come from the DOM `key` (what the key means), `keycode`
//! from the DOM `code` (which physical key).  `string` is the printable text
//! the key produces, empty for non-printing keys.

use tracing::debug;
use xpra_core::keymap::{dom_code_to_keycode, dom_key_to_keysym};
use xpra_core::{ClientPacket, Surface};

use crate::application::input::{KeyInput, KeyboardTranslator};

/// Default keyboard translator.
#[derive(Debug, Default)]
pub struct XpraKeyboard {
    /// XKB group reported with every key; the client never switches layouts.
    group: u32,
}

impl XpraKeyboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyboardTranslator for XpraKeyboard {
    fn translate(&mut self, input: &KeyInput, surface: &Surface) -> Vec<ClientPacket> {
        let Some(keysym) = dom_key_to_keysym(&input.key) else {
            debug!(key = %input.key, code = %input.code, "no keysym for key, not forwarded");
            return Vec::new();
        };
        let keycode = dom_code_to_keycode(&input.code).unwrap_or(0);
        let string = if input.key.chars().count() == 1 {
            input.key.clone()
        } else {
            String::new()
        };

        vec![ClientPacket::KeyAction {
            wid: surface.wid,
            keyname: keysym.name,
            pressed: input.pressed,
            modifiers: input.modifiers.to_x11_names(),
            keyval: keysym.keyval,
            string,
            keycode,
            group: self.group,
        }]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
