//! Session configuration and connection state.
//!
//! Configuration is resolved in three layers, highest precedence first:
//!
//! 1. **Per-call** overrides passed to [`Client::connect`](super::client::Client::connect).
//! 2. **Instance defaults** given when the client is constructed (usually
//!    loaded from the TOML config file).
//! 3. **Built-in defaults** ([`ClientConfig::default`]).
//!
//! Both override layers use [`ConfigOverrides`], where every field is
//! optional; `None` means "inherit from the layer below".

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fully resolved configuration for one connection attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client identity sent in `hello`; a fresh hex UUID when not configured.
    pub uuid: String,
    /// WebSocket URI of the Xpra server.
    pub uri: String,
    pub audio_framework: Option<String>,
    pub audio_codec_blacklist: Vec<String>,
    pub audio_codecs: Vec<String>,
    /// Picture encodings to advertise; empty means the built-in list.
    pub image_codecs: Vec<String>,
    /// Desktop size in pixels, `[width, height]`.
    pub screen: (u32, u32),
    pub dpi: u32,
    pub compression_level: u8,
    pub reconnect: bool,
    pub notifications: bool,
    pub clipboard: bool,
    pub sound: bool,
    pub bell: bool,
    pub printing: bool,
    pub transfer: bool,
    pub keyboard: bool,
    pub share: bool,
    pub steal: bool,
    /// Keyboard layout; `None` lets the server pick.
    pub language: Option<String>,
    pub username: String,
    pub password: String,
    pub zlib: bool,
    pub lz4: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uuid: new_hex_uuid(),
            uri: "ws://localhost:10000".to_string(),
            audio_framework: None,
            audio_codec_blacklist: Vec::new(),
            audio_codecs: Vec::new(),
            image_codecs: Vec::new(),
            screen: (1920, 1080),
            dpi: 96,
            compression_level: 1,
            reconnect: true,
            notifications: true,
            clipboard: false,
            sound: false,
            bell: false,
            printing: false,
            transfer: false,
            keyboard: true,
            share: true,
            steal: true,
            language: None,
            username: String::new(),
            password: String::new(),
            zlib: true,
            lz4: false,
        }
    }
}

/// A 32-character lowercase hex UUID.
pub fn new_hex_uuid() -> String {
    Uuid::new_v4().simple().to_string()
}

/// One layer of optional configuration values.
///
/// Deserializes from TOML with every key optional:
///
/// ```toml
/// uri = "ws://xpra.example:14500"
/// screen = [1280, 800]
/// sound = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub uuid: Option<String>,
    pub uri: Option<String>,
    pub audio_framework: Option<String>,
    pub audio_codec_blacklist: Option<Vec<String>>,
    pub audio_codecs: Option<Vec<String>>,
    pub image_codecs: Option<Vec<String>>,
    pub screen: Option<(u32, u32)>,
    pub dpi: Option<u32>,
    pub compression_level: Option<u8>,
    pub reconnect: Option<bool>,
    pub notifications: Option<bool>,
    pub clipboard: Option<bool>,
    pub sound: Option<bool>,
    pub bell: Option<bool>,
    pub printing: Option<bool>,
    pub transfer: Option<bool>,
    pub keyboard: Option<bool>,
    pub share: Option<bool>,
    pub steal: Option<bool>,
    pub language: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub zlib: Option<bool>,
    pub lz4: Option<bool>,
}

macro_rules! apply_overrides {
    ($config:expr, $layer:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$layer.$field {
                $config.$field = value.clone();
            }
        )+
    };
}

impl ClientConfig {
    /// Resolves `per_call` over `instance` over the built-in defaults.
    pub fn resolve(instance: &ConfigOverrides, per_call: &ConfigOverrides) -> Self {
        let mut config = Self::default();
        for layer in [instance, per_call] {
            config.apply(layer);
        }
        config
    }

    fn apply(&mut self, layer: &ConfigOverrides) {
        apply_overrides!(self, layer;
            uuid, uri, audio_codec_blacklist, audio_codecs, image_codecs, screen,
            dpi, compression_level, reconnect, notifications, clipboard, sound,
            bell, printing, transfer, keyboard, share, steal, username, password,
            zlib, lz4,
        );
        // Optional in the resolved config too: a set layer wins, an unset one inherits.
        if layer.audio_framework.is_some() {
            self.audio_framework = layer.audio_framework.clone();
        }
        if layer.language.is_some() {
            self.language = layer.language.clone();
        }
    }
}

// ── Session state ─────────────────────────────────────────────────────────────

/// Externally visible connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.uri, "ws://localhost:10000");
        assert_eq!(cfg.compression_level, 1);
        assert!(cfg.reconnect && cfg.notifications && cfg.keyboard);
        assert!(cfg.share && cfg.steal && cfg.zlib);
        assert!(!cfg.clipboard && !cfg.sound && !cfg.bell);
        assert!(!cfg.printing && !cfg.transfer && !cfg.lz4);
        assert_eq!(cfg.language, None);
        assert_eq!(cfg.audio_framework, None);
        assert!(cfg.username.is_empty() && cfg.password.is_empty());
    }

    #[test]
    fn test_generated_uuid_is_32_hex_chars() {
        let uuid = ClientConfig::default().uuid;
        assert_eq!(uuid.len(), 32);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_each_default_config_gets_a_fresh_uuid() {
        assert_ne!(ClientConfig::default().uuid, ClientConfig::default().uuid);
    }

    #[test]
    fn test_resolve_per_call_beats_instance_beats_builtin() {
        // Arrange
        let instance = ConfigOverrides {
            uri: Some("ws://instance:1".into()),
            dpi: Some(120),
            sound: Some(true),
            ..Default::default()
        };
        let per_call = ConfigOverrides {
            uri: Some("ws://call:2".into()),
            ..Default::default()
        };

        // Act
        let cfg = ClientConfig::resolve(&instance, &per_call);

        // Assert
        assert_eq!(cfg.uri, "ws://call:2");
        assert_eq!(cfg.dpi, 120);
        assert!(cfg.sound);
        assert_eq!(cfg.compression_level, 1);
    }

    #[test]
    fn test_resolve_keeps_configured_uuid() {
        let instance = ConfigOverrides {
            uuid: Some("abc".into()),
            ..Default::default()
        };
        let cfg = ClientConfig::resolve(&instance, &ConfigOverrides::default());
        assert_eq!(cfg.uuid, "abc");
    }

    #[test]
    fn test_overrides_deserialize_from_partial_toml() {
        let layer: ConfigOverrides =
            toml::from_str("uri = \"ws://h:1\"\nscreen = [800, 600]\nlanguage = \"de\"\n").unwrap();
        assert_eq!(layer.uri.as_deref(), Some("ws://h:1"));
        assert_eq!(layer.screen, Some((800, 600)));
        assert_eq!(layer.language.as_deref(), Some("de"));
        assert_eq!(layer.dpi, None);
    }

    #[test]
    fn test_overrides_reject_unknown_keys() {
        assert!(toml::from_str::<ConfigOverrides>("colour = \"red\"\n").is_err());
    }

    #[test]
    fn test_session_state_display_is_lowercase() {
        assert_eq!(SessionState::Reconnecting.to_string(), "reconnecting");
        assert_eq!(SessionState::Disconnected.to_string(), "disconnected");
    }
}
