//! TOML configuration file.
//!
//! Looked up at:
//! - Linux / macOS: `$XDG_CONFIG_HOME/lemonade.toml`, else `~/.config/lemonade.toml`
//! - Windows:       `%APPDATA%\lemonade.toml`
//!
//! Every key is optional and mirrors a command-line flag:
//!
//! ```toml
//! host = "192.168.1.10"
//! port = 2489
//! allow = "192.168.0.0/16,10.0.0.0/8"
//! line_ending = "lf"
//! trans_loopback = true
//! trans_localfile = true
//! no_fallback_messages = false
//! log_level = 1
//! file_timeout = 30
//! ```
//!
//! Flags given on the command line win over the file; the file wins over the
//! built-in defaults.  A missing file is the same as an empty one.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "lemonade.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// The file exists but could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of `lemonade.toml`.  `None` means "not set in the file".
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allow: Option<String>,
    pub line_ending: Option<String>,
    pub trans_loopback: Option<bool>,
    pub trans_localfile: Option<bool>,
    pub no_fallback_messages: Option<bool>,
    /// 0 debug, 1 info, 2 warn, 3 error, 4 critical.
    pub log_level: Option<u8>,
    /// Seconds to wait for an exposed file to be fetched.
    pub file_timeout: Option<u64>,
}

/// Returns the path of the config file for the current platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither the XDG, home
/// nor `APPDATA` variables are set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config file from its platform location.
///
/// Returns an empty [`FileConfig`] if the file or the config directory does
/// not exist.
pub fn load_config() -> Result<FileConfig, ConfigError> {
    match config_file_path() {
        Ok(path) => load_config_from(&path),
        Err(ConfigError::NoPlatformConfigDir) => Ok(FileConfig::default()),
        Err(e) => Err(e),
    }
}

/// Loads the config file at `path`; a missing file yields the default.
pub fn load_config_from(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
