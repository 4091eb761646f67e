//! DOM key names to X11 KeySym translation for the `key-action` packet.
//!
//! X11 KeySym values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # What is an X11 KeySym? (for beginners)
//!
//! X11 identifies keys by **KeySym** (Key Symbol).  A KeySym has a name and a
//! numeric value, and can stand for a *character* as well as a physical key:
//!
//! | KeySym name | Value  | Meaning        |
//! |-------------|--------|----------------|
//! | `a`         | 0x0061 | lowercase 'a'  |
//! | `A`         | 0x0041 | uppercase 'A'  |
//! | `Return`    | 0xFF0D | Enter key      |
//! | `Escape`    | 0xFF1B | Escape key     |
//!
//! Latin-1 characters use their code point as the value.  Any other Unicode
//! character `c` maps to `0x0100_0000 + c` with the name `U<hex>`.
//!
//! The Xpra server's `key-action` packet carries both the KeySym name and its
//! value, plus an X11 keycode.  Browsers report two strings per key event:
//! `KeyboardEvent.key` (what the key *means*, e.g. `"Enter"` or `"é"`) and
//! `KeyboardEvent.code` (which physical key, e.g. `"KeyA"`).  This module
//! translates the first into a KeySym and the second into an X11 keycode.

/// An X11 KeySym: name as understood by the server plus numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keysym {
    pub name: String,
    pub keyval: u32,
}

impl Keysym {
    fn named(name: &str, keyval: u32) -> Self {
        Self {
            name: name.to_string(),
            keyval,
        }
    }
}

/// Translates a DOM `KeyboardEvent.key` value to an X11 KeySym.
///
/// Returns `None` for keys with no KeySym equivalent (`"Unidentified"`,
/// `"Dead"`, empty strings).
pub fn dom_key_to_keysym(key: &str) -> Option<Keysym> {
    if let Some(keysym) = named_key(key) {
        return Some(keysym);
    }
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(char_to_keysym(c))
}

/// Translates a DOM `KeyboardEvent.code` value to an X11 keycode for a
/// standard PC-105 layout (Linux evdev code + 8).
///
/// Returns `None` if the physical key is unknown.
pub fn dom_code_to_keycode(code: &str) -> Option<u32> {
    let evdev = match code {
        "Escape" => 1,
        "Digit1" => 2,
        "Digit2" => 3,
        "Digit3" => 4,
        "Digit4" => 5,
        "Digit5" => 6,
        "Digit6" => 7,
        "Digit7" => 8,
        "Digit8" => 9,
        "Digit9" => 10,
        "Digit0" => 11,
        "Minus" => 12,
        "Equal" => 13,
        "Backspace" => 14,
        "Tab" => 15,
        "KeyQ" => 16,
        "KeyW" => 17,
        "KeyE" => 18,
        "KeyR" => 19,
        "KeyT" => 20,
        "KeyY" => 21,
        "KeyU" => 22,
        "KeyI" => 23,
        "KeyO" => 24,
        "KeyP" => 25,
        "BracketLeft" => 26,
        "BracketRight" => 27,
        "Enter" => 28,
        "ControlLeft" => 29,
        "KeyA" => 30,
        "KeyS" => 31,
        "KeyD" => 32,
        "KeyF" => 33,
        "KeyG" => 34,
        "KeyH" => 35,
        "KeyJ" => 36,
        "KeyK" => 37,
        "KeyL" => 38,
        "Semicolon" => 39,
        "Quote" => 40,
        "Backquote" => 41,
        "ShiftLeft" => 42,
        "Backslash" => 43,
        "KeyZ" => 44,
        "KeyX" => 45,
        "KeyC" => 46,
        "KeyV" => 47,
        "KeyB" => 48,
        "KeyN" => 49,
        "KeyM" => 50,
        "Comma" => 51,
        "Period" => 52,
        "Slash" => 53,
        "ShiftRight" => 54,
        "NumpadMultiply" => 55,
        "AltLeft" => 56,
        "Space" => 57,
        "CapsLock" => 58,
        "F1" => 59,
        "F2" => 60,
        "F3" => 61,
        "F4" => 62,
        "F5" => 63,
        "F6" => 64,
        "F7" => 65,
        "F8" => 66,
        "F9" => 67,
        "F10" => 68,
        "NumLock" => 69,
        "ScrollLock" => 70,
        "Numpad7" => 71,
        "Numpad8" => 72,
        "Numpad9" => 73,
        "NumpadSubtract" => 74,
        "Numpad4" => 75,
        "Numpad5" => 76,
        "Numpad6" => 77,
        "NumpadAdd" => 78,
        "Numpad1" => 79,
        "Numpad2" => 80,
        "Numpad3" => 81,
        "Numpad0" => 82,
        "NumpadDecimal" => 83,
        "IntlBackslash" => 86,
        "F11" => 87,
        "F12" => 88,
        "NumpadEnter" => 96,
        "ControlRight" => 97,
        "NumpadDivide" => 98,
        "PrintScreen" => 99,
        "AltRight" => 100,
        "Home" => 102,
        "ArrowUp" => 103,
        "PageUp" => 104,
        "ArrowLeft" => 105,
        "ArrowRight" => 106,
        "End" => 107,
        "ArrowDown" => 108,
        "PageDown" => 109,
        "Insert" => 110,
        "Delete" => 111,
        "Pause" => 119,
        "MetaLeft" => 125,
        "MetaRight" => 126,
        "ContextMenu" => 127,
        _ => return None,
    };
    Some(evdev + 8)
}

/// Non-printable keys, by their DOM `key` name.
fn named_key(key: &str) -> Option<Keysym> {
    let (name, keyval) = match key {
        // Control keys
        "Enter" => ("Return", 0xFF0D),
        "Escape" => ("Escape", 0xFF1B),
        "Backspace" => ("BackSpace", 0xFF08),
        "Tab" => ("Tab", 0xFF09),
        "CapsLock" => ("Caps_Lock", 0xFFE5),
        "ScrollLock" => ("Scroll_Lock", 0xFF14),
        "NumLock" => ("Num_Lock", 0xFF7F),
        "Pause" => ("Pause", 0xFF13),
        "Insert" => ("Insert", 0xFF63),
        "Home" => ("Home", 0xFF50),
        "PageUp" => ("Page_Up", 0xFF55),
        "Delete" => ("Delete", 0xFFFF),
        "End" => ("End", 0xFF57),
        "PageDown" => ("Page_Down", 0xFF56),
        "PrintScreen" => ("Print", 0xFF61),
        "ContextMenu" => ("Menu", 0xFF67),

        // Arrow keys
        "ArrowLeft" => ("Left", 0xFF51),
        "ArrowUp" => ("Up", 0xFF52),
        "ArrowRight" => ("Right", 0xFF53),
        "ArrowDown" => ("Down", 0xFF54),

        // Modifiers (DOM `key` does not distinguish sides; report the left one)
        "Shift" => ("Shift_L", 0xFFE1),
        "Control" => ("Control_L", 0xFFE3),
        "Alt" => ("Alt_L", 0xFFE9),
        "AltGraph" => ("ISO_Level3_Shift", 0xFE03),
        "Meta" | "OS" => ("Super_L", 0xFFEB),

        // Function keys
        "F1" => ("F1", 0xFFBE),
        "F2" => ("F2", 0xFFBF),
        "F3" => ("F3", 0xFFC0),
        "F4" => ("F4", 0xFFC1),
        "F5" => ("F5", 0xFFC2),
        "F6" => ("F6", 0xFFC3),
        "F7" => ("F7", 0xFFC4),
        "F8" => ("F8", 0xFFC5),
        "F9" => ("F9", 0xFFC6),
        "F10" => ("F10", 0xFFC7),
        "F11" => ("F11", 0xFFC8),
        "F12" => ("F12", 0xFFC9),
        _ => return None,
    };
    Some(Keysym::named(name, keyval))
}

/// Printable characters.
fn char_to_keysym(c: char) -> Keysym {
    let code = u32::from(c);
    let name = match c {
        ' ' => "space",
        '!' => "exclam",
        '"' => "quotedbl",
        '#' => "numbersign",
        '$' => "dollar",
        '%' => "percent",
        '&' => "ampersand",
        '\'' => "apostrophe",
        '(' => "parenleft",
        ')' => "parenright",
        '*' => "asterisk",
        '+' => "plus",
        ',' => "comma",
        '-' => "minus",
        '.' => "period",
        '/' => "slash",
        ':' => "colon",
        ';' => "semicolon",
        '<' => "less",
        '=' => "equal",
        '>' => "greater",
        '?' => "question",
        '@' => "at",
        '[' => "bracketleft",
        '\\' => "backslash",
        ']' => "bracketright",
        '^' => "asciicircum",
        '_' => "underscore",
        '`' => "grave",
        '{' => "braceleft",
        '|' => "bar",
        '}' => "braceright",
        '~' => "asciitilde",
        c if c.is_ascii_alphanumeric() => return Keysym::named(c.encode_utf8(&mut [0; 4]), code),
        // Latin-1 supplement keysyms share the code point as value; the
        // server resolves them by value when the name is the character.
        c if (0xA0..=0xFF).contains(&code) => return Keysym::named(c.encode_utf8(&mut [0; 4]), code),
        _ => {
            return Keysym {
                name: format!("U{code:04X}"),
                keyval: 0x0100_0000 + code,
            }
        }
    };
    Keysym::named(name, code)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
