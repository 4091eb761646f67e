//! Client capability dictionary sent in `hello`.
//!
//! Capabilities are computed once per connection attempt, when the transport
//! opens, from the resolved [`ClientConfig`].  The server answers with its own
//! dictionary; the client keeps both for the lifetime of the connection.

use serde_json::{json, Value};
use xpra_core::Metadata;

use super::config::ClientConfig;

/// Protocol version advertised to the server.
pub const PROTOCOL_VERSION: &str = "2.4";

/// Picture encodings advertised when none are configured.
pub const DEFAULT_ENCODINGS: &[&str] = &["rgb24", "rgb32", "png", "jpeg"];

/// Pixel layouts the client accepts for `rgb` draws.
pub const RGB_FORMATS: &[&str] = &["RGBX", "RGBA"];

/// Capability key carrying [`RGB_FORMATS`]; echoed in every `map-window`.
pub const RGB_FORMATS_KEY: &str = "encodings.rgb_formats";

/// Builds the `hello` capability map for `config`.
pub fn client_capabilities(config: &ClientConfig) -> Metadata {
    let (w, h) = config.screen;
    let encodings: Vec<&str> = if config.image_codecs.is_empty() {
        DEFAULT_ENCODINGS.to_vec()
    } else {
        config.image_codecs.iter().map(String::as_str).collect()
    };
    let sound_decoders: Vec<&str> = config
        .audio_codecs
        .iter()
        .filter(|codec| !config.audio_codec_blacklist.contains(codec))
        .map(String::as_str)
        .collect();

    let caps = json!({
        "version": PROTOCOL_VERSION,
        "client_type": "xpra-web",
        "platform": std::env::consts::OS,
        "uuid": config.uuid,
        "username": config.username,
        "desktop_size": [w, h],
        "screen_sizes": screen_sizes(w, h, config.dpi),
        "dpi": config.dpi,
        "compression_level": config.compression_level,
        "zlib": config.zlib,
        "lz4": config.lz4,
        "encodings": encodings,
        "encodings.core": encodings,
        RGB_FORMATS_KEY: RGB_FORMATS,
        "sound.receive": config.sound,
        "sound.decoders": sound_decoders,
        "sound.framework": config.audio_framework,
        "notifications": config.notifications,
        "clipboard": config.clipboard,
        "bell": config.bell,
        "printing": config.printing,
        "file-transfer": config.transfer,
        "keyboard": config.keyboard,
        "share": config.share,
        "steal": config.steal,
        "xkbmap_layout": config.language.as_deref().unwrap_or(""),
        "windows": true,
    });

    match caps {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

/// Screen layout list for `desktop_size` and `hello`.
///
/// One virtual screen holding one monitor that covers the whole desktop.
/// Physical sizes are in millimetres, derived from `dpi`.
pub fn screen_sizes(w: u32, h: u32, dpi: u32) -> Value {
    let wmm = pixels_to_mm(w, dpi);
    let hmm = pixels_to_mm(h, dpi);
    let monitor = json!(["Canvas", 0, 0, w, h, wmm, hmm]);
    json!([["HTML", w, h, wmm, hmm, [monitor], 0, 0, w, h]])
}

fn pixels_to_mm(px: u32, dpi: u32) -> u32 {
    if dpi == 0 {
        return 0;
    }
    (f64::from(px) * 25.4 / f64::from(dpi)).round() as u32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
