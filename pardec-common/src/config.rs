//! Settings file loading and value resolution
//!
//! Every tunable resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML settings file (`--config`, then the platform config directory)
//! 4. Compiled default (fallback)
//!
//! Example settings file:
//!
//! ```toml
//! [decode]
//! channels = 2
//! frames_per_thread = 500
//! codec = "ima-adpcm"
//!
//! [logging]
//! file = "/var/log/pardec.log"
//! verbose = false
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Directory name used under the platform config directory
pub const APP_DIR: &str = "pardec";

/// Settings file name looked up in the platform config directory
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// Settings loaded from a TOML file
///
/// Every field is optional; anything missing falls through to the
/// compiled default of the consuming binary.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Decode tunables
    pub decode: DecodeSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// `[decode]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecodeSettings {
    /// Interleaved output channels (1 or 2)
    pub channels: Option<u16>,

    /// Encoder frames assigned to each worker thread
    pub frames_per_thread: Option<u32>,

    /// Codec name (e.g. "ima-adpcm")
    pub codec: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,

    /// Per-frame debug output
    pub verbose: Option<bool>,
}

/// Load settings from an explicit file, or from the platform default
/// location when no file is given.
///
/// An explicit file that is missing or malformed is an error. A missing
/// platform default is not: built-in defaults apply.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => read_settings(path),
        None => match default_settings_path() {
            Some(path) => {
                debug!("Using settings file {}", path.display());
                read_settings(&path)
            }
            None => Ok(Settings::default()),
        },
    }
}

/// Read and parse one settings file
pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|error| Error::SettingsRead {
        path: path.to_path_buf(),
        error,
    })?;

    toml::from_str(&content).map_err(|error| Error::SettingsParse {
        path: path.to_path_buf(),
        error,
    })
}

/// Locate the platform settings file, if one exists
///
/// Tries `<config_dir>/pardec/config.toml` first, then
/// `/etc/pardec/config.toml` on unix.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE_NAME)) {
        if path.is_file() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system = Path::new("/etc").join(APP_DIR).join(SETTINGS_FILE_NAME);
        if system.is_file() {
            return Some(system);
        }
    }

    None
}

/// Resolve an optional value: CLI, then environment variable, then file.
///
/// An environment variable that is set but empty is ignored. One that fails
/// to parse is a configuration error rather than a silent fallback.
pub fn resolve_optional<T>(cli: Option<T>, env_var: &str, file_value: Option<T>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    if cli.is_some() {
        return Ok(cli);
    }

    if let Ok(raw) = std::env::var(env_var) {
        let raw = raw.trim();
        if !raw.is_empty() {
            return raw.parse::<T>().map(Some).map_err(|e| {
                Error::Config(format!("Invalid value '{}' in {}: {}", raw, env_var, e))
            });
        }
    }

    Ok(file_value)
}

/// Resolve a value with a compiled default as the last resort
pub fn resolve_setting<T>(cli: Option<T>, env_var: &str, file_value: Option<T>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(resolve_optional(cli, env_var, file_value)?.unwrap_or(default))
}
