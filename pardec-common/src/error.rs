//! Common error types for pardec

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for pardec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the pardec crates
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file could not be read
    #[error("Failed to read settings file {path}: {error}")]
    SettingsRead { path: PathBuf, error: std::io::Error },

    /// Settings file is not valid TOML or does not match the schema
    #[error("Failed to parse settings file {path}: {error}")]
    SettingsParse { path: PathBuf, error: toml::de::Error },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
