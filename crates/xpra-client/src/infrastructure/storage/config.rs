//! TOML persistence for the client's instance defaults.
//!
//! Reads and writes a [`ConfigOverrides`] layer from the platform config file:
//! - Windows:  `%APPDATA%\XpraWeb\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/xpra-web/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/XpraWeb/config.toml`
//!
//! Every key is optional.  Anything not in the file falls back to the
//! built-in defaults when the configuration is resolved:
//!
//! ```toml
//! uri = "wss://desktop.example.org/xpra"
//! screen = [2560, 1440]
//! dpi = 144
//! sound = true
//! audio_codecs = ["opus", "mp3"]
//! ```
//!
//! The file is also where the client keeps its identity: the first run
//! writes a generated `uuid` back so the server sees the same client on every
//! later connection.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::application::config::{new_hex_uuid, ConfigOverrides};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the instance defaults from `path`, or an empty layer if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed or has unknown keys.
pub fn load_config_from(path: &Path) -> Result<ConfigOverrides, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let layer: ConfigOverrides = toml::from_str(&content)?;
            debug!(path = %path.display(), "loaded config");
            Ok(layer)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(ConfigOverrides::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &ConfigOverrides) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Loads the config at `path` and, if it has no `uuid`, generates one and
/// saves it back.
pub fn load_or_init_identity(path: &Path) -> Result<ConfigOverrides, ConfigError> {
    let mut config = load_config_from(path)?;
    if config.uuid.is_none() {
        let uuid = new_hex_uuid();
        info!(%uuid, path = %path.display(), "generated client identity");
        config.uuid = Some(uuid);
        save_config_to(path, &config)?;
    }
    Ok(config)
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("XpraWeb"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("xpra-web"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("XpraWeb")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
