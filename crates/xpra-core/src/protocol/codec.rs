//! JSON codec for session packets.
//!
//! Wire format (one WebSocket text frame per packet):
//! ```text
//! ["<name>", arg0, arg1, ...]
//! ```
//! Binary payloads (pixel data, icons, transferred files) are carried as
//! standard base64 strings.  Arrays of small integers are also accepted for
//! binary arguments, which is how some test harnesses emit them.
//!
//! Decoding is strict about argument *types* for the fields the client acts
//! on and lenient about trailing optional arguments, which newer servers append
//! without notice.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::surface::Wid;
use crate::protocol::packets::{
    names, ClientPacket, DrawPacket, FileTransferPacket, Metadata, NewWindowPacket,
    NotificationPacket, ServerPacket, WindowIconPacket,
};

/// Errors that can occur while decoding or encoding a packet.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    #[error("malformed JSON frame: {0}")]
    MalformedJson(String),

    /// The frame is valid JSON but not a non-empty array.
    #[error("packet must be a non-empty JSON array")]
    NotAPacket,

    /// The first element of the packet is not a string.
    #[error("packet name must be a string")]
    InvalidName,

    /// The packet name is not one this client understands.
    #[error("unknown packet: {0}")]
    UnknownPacket(String),

    /// A required positional argument is missing.
    #[error("{packet}: missing argument {index}")]
    MissingArgument { packet: &'static str, index: usize },

    /// A positional argument has the wrong type.
    #[error("{packet}: argument {index} must be {expected}")]
    InvalidArgument {
        packet: &'static str,
        index: usize,
        expected: &'static str,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one packet from a text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame is not a well-formed packet.
///
/// # Examples
///
/// ```rust
/// use xpra_core::protocol::{decode_packet_text, ServerPacket};
///
/// let packet = decode_packet_text(r#"["lost-window", 7]"#).unwrap();
/// assert_eq!(packet, ServerPacket::LostWindow { wid: 7 });
/// ```
pub fn decode_packet_text(text: &str) -> Result<ServerPacket, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
    decode_packet(&value)
}

/// Decodes one packet from an already-parsed JSON value.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the value is not a well-formed packet.
pub fn decode_packet(value: &Value) -> Result<ServerPacket, ProtocolError> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or(ProtocolError::NotAPacket)?;
    let name = items[0].as_str().ok_or(ProtocolError::InvalidName)?;
    let rest = &items[1..];

    let packet = match name {
        names::HELLO => ServerPacket::Hello(Args::new(names::HELLO, rest).map(0)?),
        names::PING => ServerPacket::Ping {
            echo: rest.first().cloned().unwrap_or(Value::Null),
        },
        names::WINDOW_METADATA => {
            let args = Args::new(names::WINDOW_METADATA, rest);
            ServerPacket::WindowMetadata {
                wid: args.wid(0)?,
                metadata: args.map(1)?,
            }
        }
        names::WINDOW_RESIZED => {
            let args = Args::new(names::WINDOW_RESIZED, rest);
            ServerPacket::WindowResized {
                wid: args.wid(0)?,
                w: args.u32(1)?,
                h: args.u32(2)?,
            }
        }
        names::NEW_WINDOW => {
            ServerPacket::NewWindow(decode_new_window(Args::new(names::NEW_WINDOW, rest))?)
        }
        names::NEW_OVERRIDE_REDIRECT => ServerPacket::NewOverrideRedirect(decode_new_window(
            Args::new(names::NEW_OVERRIDE_REDIRECT, rest),
        )?),
        names::LOST_WINDOW => ServerPacket::LostWindow {
            wid: Args::new(names::LOST_WINDOW, rest).wid(0)?,
        },
        names::WINDOW_ICON => {
            let args = Args::new(names::WINDOW_ICON, rest);
            ServerPacket::WindowIcon(WindowIconPacket {
                wid: args.wid(0)?,
                w: args.u32(1)?,
                h: args.u32(2)?,
                coding: args.string(3)?,
                data: args.bytes(4)?,
            })
        }
        names::WINDOW_MOVE_RESIZE => {
            let args = Args::new(names::WINDOW_MOVE_RESIZE, rest);
            ServerPacket::WindowMoveResize {
                wid: args.wid(0)?,
                x: args.i32(1)?,
                y: args.i32(2)?,
                w: args.u32(3)?,
                h: args.u32(4)?,
            }
        }
        names::STARTUP_COMPLETE => ServerPacket::StartupComplete,
        names::NOTIFY_SHOW => {
            let args = Args::new(names::NOTIFY_SHOW, rest);
            ServerPacket::NotifyShow(NotificationPacket {
                bus_id: args.u64(0)?,
                nid: args.u64(1)?,
                replaces_id: args.u64_or(2, 0)?,
                summary: args.string_or(3, "")?,
                body: args.string_or(4, "")?,
                timeout: args.i64_or(5, -1)?,
                icon: args.raw(6),
                actions: args.list(7)?,
                hints: args.map(8)?,
            })
        }
        names::NOTIFY_CLOSE => ServerPacket::NotifyClose {
            nid: Args::new(names::NOTIFY_CLOSE, rest).u64(0)?,
        },
        names::SEND_FILE => {
            let args = Args::new(names::SEND_FILE, rest);
            ServerPacket::SendFile(FileTransferPacket {
                filename: args.string(0)?,
                mime: args.string(1)?,
                print: args.bool(2)?,
                size: args.u64(3)?,
                data: args.bytes(4)?,
            })
        }
        names::OPEN_URL => {
            let args = Args::new(names::OPEN_URL, rest);
            ServerPacket::OpenUrl {
                url: args.string(0)?,
                extra: rest.iter().skip(1).cloned().collect(),
            }
        }
        names::BELL => ServerPacket::Bell,
        names::DRAW => ServerPacket::Draw(decode_draw(Args::new(names::DRAW, rest))?),
        names::EOS => ServerPacket::Eos(decode_eos(Args::new(names::EOS, rest))?),
        names::DISCONNECT => ServerPacket::Disconnect {
            reason: Args::new(names::DISCONNECT, rest).string_or(0, "")?,
        },
        other => return Err(ProtocolError::UnknownPacket(other.to_string())),
    };
    Ok(packet)
}

/// Encodes a client packet into its JSON array form.
pub fn encode_packet(packet: &ClientPacket) -> Value {
    match packet {
        ClientPacket::Hello(caps) => json!([names::HELLO, caps]),
        ClientPacket::Ping { time_ms } => json!([names::PING, time_ms]),
        ClientPacket::PingEcho { echo } => json!([names::PING_ECHO, echo, 0, 0, 0, 0]),
        ClientPacket::MapWindow {
            wid,
            x,
            y,
            w,
            h,
            properties,
        } => json!([names::MAP_WINDOW, wid, x, y, w, h, properties]),
        ClientPacket::Focus { wid } => json!([names::FOCUS, wid]),
        ClientPacket::CloseWindow { wid } => json!([names::CLOSE_WINDOW, wid]),
        ClientPacket::DesktopSize { w, h, screens } => {
            json!([names::DESKTOP_SIZE, w, h, screens])
        }
        ClientPacket::Logging { level, lines } => json!([names::LOGGING, level, lines]),
        ClientPacket::KeyAction {
            wid,
            keyname,
            pressed,
            modifiers,
            keyval,
            string,
            keycode,
            group,
        } => json!([
            names::KEY_ACTION,
            wid,
            keyname,
            pressed,
            modifiers,
            keyval,
            string,
            keycode,
            group
        ]),
        ClientPacket::PointerPosition {
            wid,
            x,
            y,
            modifiers,
            buttons,
        } => json!([names::POINTER_POSITION, wid, [x, y], modifiers, buttons]),
        ClientPacket::ButtonAction {
            wid,
            button,
            pressed,
            x,
            y,
            modifiers,
            buttons,
        } => json!([
            names::BUTTON_ACTION,
            wid,
            button,
            pressed,
            [x, y],
            modifiers,
            buttons
        ]),
    }
}

/// Encodes a client packet into a text frame.
pub fn encode_packet_text(packet: &ClientPacket) -> String {
    encode_packet(packet).to_string()
}

// ── Per-packet helpers ────────────────────────────────────────────────────────

fn decode_new_window(args: Args<'_>) -> Result<NewWindowPacket, ProtocolError> {
    Ok(NewWindowPacket {
        wid: args.wid(0)?,
        x: args.i32(1)?,
        y: args.i32(2)?,
        w: args.u32(3)?,
        h: args.u32(4)?,
        metadata: args.map(5)?,
        properties: args.map(6)?,
    })
}

fn decode_draw(args: Args<'_>) -> Result<DrawPacket, ProtocolError> {
    Ok(DrawPacket {
        wid: args.wid(0)?,
        x: args.i32(1)?,
        y: args.i32(2)?,
        w: args.u32(3)?,
        h: args.u32(4)?,
        coding: args.string(5)?,
        data: args.bytes(6)?,
        sequence: args.u64(7)?,
        rowstride: args.u32_or(8, 0)?,
        options: args.map(9)?,
    })
}

/// `eos` only guarantees the window id; the rest defaults when absent.
fn decode_eos(args: Args<'_>) -> Result<DrawPacket, ProtocolError> {
    Ok(DrawPacket {
        wid: args.wid(0)?,
        x: args.i32_or(1, 0)?,
        y: args.i32_or(2, 0)?,
        w: args.u32_or(3, 0)?,
        h: args.u32_or(4, 0)?,
        coding: args.string_or(5, "")?,
        data: if args.is_present(6) { args.bytes(6)? } else { Vec::new() },
        sequence: args.u64_or(7, 0)?,
        rowstride: args.u32_or(8, 0)?,
        options: args.map(9)?,
    })
}

// ── Positional argument reader ────────────────────────────────────────────────

/// Typed access to the positional arguments of one packet.
///
/// Every accessor reports failures against the packet name and index so that
/// a warning in the log points straight at the offending field.
struct Args<'a> {
    packet: &'static str,
    items: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(packet: &'static str, items: &'a [Value]) -> Self {
        Self { packet, items }
    }

    fn is_present(&self, index: usize) -> bool {
        !matches!(self.items.get(index), None | Some(Value::Null))
    }

    fn get(&self, index: usize) -> Result<&'a Value, ProtocolError> {
        self.items.get(index).ok_or(ProtocolError::MissingArgument {
            packet: self.packet,
            index,
        })
    }

    fn invalid(&self, index: usize, expected: &'static str) -> ProtocolError {
        ProtocolError::InvalidArgument {
            packet: self.packet,
            index,
            expected,
        }
    }

    fn raw(&self, index: usize) -> Value {
        self.items.get(index).cloned().unwrap_or(Value::Null)
    }

    fn wid(&self, index: usize) -> Result<Wid, ProtocolError> {
        self.u64(index)
    }

    fn u64(&self, index: usize) -> Result<u64, ProtocolError> {
        self.get(index)?
            .as_u64()
            .ok_or_else(|| self.invalid(index, "a non-negative integer"))
    }

    fn u64_or(&self, index: usize, default: u64) -> Result<u64, ProtocolError> {
        if self.is_present(index) {
            self.u64(index)
        } else {
            Ok(default)
        }
    }

    fn i64_or(&self, index: usize, default: i64) -> Result<i64, ProtocolError> {
        if !self.is_present(index) {
            return Ok(default);
        }
        self.get(index)?
            .as_i64()
            .ok_or_else(|| self.invalid(index, "an integer"))
    }

    fn u32(&self, index: usize) -> Result<u32, ProtocolError> {
        self.u64(index)?
            .try_into()
            .map_err(|_| self.invalid(index, "a 32-bit unsigned integer"))
    }

    fn u32_or(&self, index: usize, default: u32) -> Result<u32, ProtocolError> {
        if self.is_present(index) {
            self.u32(index)
        } else {
            Ok(default)
        }
    }

    fn i32(&self, index: usize) -> Result<i32, ProtocolError> {
        self.get(index)?
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| self.invalid(index, "a 32-bit integer"))
    }

    fn i32_or(&self, index: usize, default: i32) -> Result<i32, ProtocolError> {
        if self.is_present(index) {
            self.i32(index)
        } else {
            Ok(default)
        }
    }

    /// Booleans arrive either as JSON booleans or as 0/1 integers.
    fn bool(&self, index: usize) -> Result<bool, ProtocolError> {
        match self.get(index)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
            _ => Err(self.invalid(index, "a boolean")),
        }
    }

    fn string(&self, index: usize) -> Result<String, ProtocolError> {
        self.get(index)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(index, "a string"))
    }

    fn string_or(&self, index: usize, default: &str) -> Result<String, ProtocolError> {
        if self.is_present(index) {
            self.string(index)
        } else {
            Ok(default.to_string())
        }
    }

    /// Missing or `null` maps decode as empty.
    fn map(&self, index: usize) -> Result<Metadata, ProtocolError> {
        match self.items.get(index) {
            None | Some(Value::Null) => Ok(Metadata::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(self.invalid(index, "an object")),
        }
    }

    fn list(&self, index: usize) -> Result<Vec<Value>, ProtocolError> {
        match self.items.get(index) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(self.invalid(index, "an array")),
        }
    }

    fn bytes(&self, index: usize) -> Result<Vec<u8>, ProtocolError> {
        match self.get(index)? {
            Value::String(encoded) => STANDARD
                .decode(encoded)
                .map_err(|_| self.invalid(index, "base64 data")),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| self.invalid(index, "an array of bytes")),
            _ => Err(self.invalid(index, "binary data")),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
