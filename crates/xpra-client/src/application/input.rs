//! Local input events and the translator seams that turn them into packets.
//!
//! Input arrives in browser terms (DOM key names, DOM mouse button numbers,
//! wheel deltas).  A [`KeyboardTranslator`] or [`MouseTranslator`] converts one
//! event into zero or more outbound packets for the target surface; the
//! client sends them and republishes the event.

use serde::{Deserialize, Serialize};
use xpra_core::{ClientPacket, Surface};

/// Modifier keys held during an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
    pub altgr: bool,
    pub caps_lock: bool,
    pub num_lock: bool,
}

impl Modifiers {
    /// X11 modifier names in the order the server reports them.
    pub fn to_x11_names(self) -> Vec<String> {
        [
            (self.shift, "shift"),
            (self.caps_lock, "lock"),
            (self.control, "control"),
            (self.alt, "mod1"),
            (self.num_lock, "mod2"),
            (self.meta, "mod4"),
            (self.altgr, "mod5"),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, name)| name.to_string())
        .collect()
    }
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInput {
    /// DOM `KeyboardEvent.key`, e.g. `"a"` or `"Enter"`.
    pub key: String,
    /// DOM `KeyboardEvent.code`, e.g. `"KeyA"`.
    pub code: String,
    pub pressed: bool,
    pub modifiers: Modifiers,
}

/// DOM mouse button number: 0 primary, 1 auxiliary, 2 secondary, 3 back, 4 forward.
pub type DomButton = u8;

/// What happened in a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MouseAction {
    Move,
    Button { button: DomButton, pressed: bool },
    /// Wheel deltas; positive `dy` scrolls down, positive `dx` scrolls right.
    Wheel { dx: f64, dy: f64 },
}

/// A mouse event, in coordinates local to the target surface's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseInput {
    /// Surface under the pointer, if any.
    pub wid: Option<xpra_core::Wid>,
    pub x: f64,
    pub y: f64,
    pub action: MouseAction,
    /// DOM buttons currently held (numbered as [`DomButton`]).
    pub buttons: Vec<DomButton>,
    pub modifiers: Modifiers,
}

/// Converts keyboard events into `key-action` packets.
pub trait KeyboardTranslator: Send {
    fn translate(&mut self, input: &KeyInput, surface: &Surface) -> Vec<ClientPacket>;
}

/// Converts mouse events into pointer packets.
///
/// `surface` is `None` when the pointer is not over a known surface; the
/// translator then reports root-window coordinates.
pub trait MouseTranslator: Send {
    fn translate(&mut self, input: &MouseInput, surface: Option<&Surface>) -> Vec<ClientPacket>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
