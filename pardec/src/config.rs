//! pardec decode configuration
//!
//! [`DecodeConfig`] is built once from the command line and settings file
//! and then passed by reference to the dispatcher and every worker. Nothing
//! reads configuration from global state.

use crate::cli::{CommonArgs, ParallelArgs};
use crate::codec::{CodecError, CodecKind};
use crate::error::{Error, Result};
use pardec_common::config::{load_settings, resolve_optional, resolve_setting};
use pardec_common::logging::LoggingOptions;
use std::path::{Path, PathBuf};

/// Default output channel count
pub const DEFAULT_CHANNELS: u16 = 2;

/// Default encoder frames per worker (10 s of 20 ms frames)
pub const DEFAULT_FRAMES_PER_THREAD: u32 = 500;

/// Longest accepted input/output/log path, in bytes
pub const MAX_PATH_LEN: usize = 1024;

/// Immutable decode configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Encoded input file
    pub input: PathBuf,

    /// PCM output file
    pub output: PathBuf,

    /// Interleaved output channels (1 or 2)
    pub channels: u16,

    /// Encoder frames assigned to each worker (parallel profile only)
    pub frames_per_thread: u32,

    /// Frame codec
    pub codec: CodecKind,
}

impl DecodeConfig {
    /// Configuration with defaults for everything but the paths
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            channels: DEFAULT_CHANNELS,
            frames_per_thread: DEFAULT_FRAMES_PER_THREAD,
            codec: CodecKind::default(),
        }
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_frames_per_thread(mut self, frames_per_thread: u32) -> Self {
        self.frames_per_thread = frames_per_thread;
        self
    }

    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    /// Check values the type system does not
    pub fn validate(&self) -> Result<()> {
        check_path_len("input", &self.input)?;
        check_path_len("output", &self.output)?;

        if !matches!(self.channels, 1 | 2) {
            return Err(Error::Codec(CodecError::UnsupportedChannels(self.channels)));
        }
        if self.frames_per_thread == 0 {
            return Err(Error::Config("frames per thread must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Resolve decode and logging configuration from parsed arguments.
///
/// Priority per value: CLI flag, `PARDEC_*` environment variable, settings
/// file, compiled default. `parallel` is `None` for the serial profile.
pub fn resolve(common: &CommonArgs, parallel: Option<&ParallelArgs>) -> Result<(DecodeConfig, LoggingOptions)> {
    if let Some(path) = &common.config {
        check_path_len("config", path)?;
    }
    let settings = load_settings(common.config.as_deref())?;

    let channels = resolve_setting(
        common.channels,
        "PARDEC_CHANNELS",
        settings.decode.channels,
        DEFAULT_CHANNELS,
    )?;

    let frames_per_thread = resolve_setting(
        parallel.and_then(|p| p.frames_per_thread),
        "PARDEC_FRAMES_PER_THREAD",
        settings.decode.frames_per_thread,
        DEFAULT_FRAMES_PER_THREAD,
    )?;

    let cli_codec = common.codec.as_deref().map(str::parse::<CodecKind>).transpose()?;
    let file_codec = settings
        .decode
        .codec
        .as_deref()
        .map(str::parse::<CodecKind>)
        .transpose()?;
    let codec = resolve_setting(cli_codec, "PARDEC_CODEC", file_codec, CodecKind::default())?;

    let log_file = resolve_optional(common.log_file.clone(), "PARDEC_LOG_FILE", settings.logging.file)?;
    if let Some(path) = &log_file {
        check_path_len("log file", path)?;
    }
    let verbose = common.verbose || settings.logging.verbose.unwrap_or(false);

    let config = DecodeConfig {
        input: common.input.clone(),
        output: common.output.clone(),
        channels,
        frames_per_thread,
        codec,
    };
    config.validate()?;

    Ok((config, LoggingOptions { log_file, verbose }))
}

fn check_path_len(what: &str, path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len == 0 {
        return Err(Error::InvalidInput(format!("{} path is empty", what)));
    }
    if len > MAX_PATH_LEN {
        return Err(Error::InvalidInput(format!(
            "{} path is {} bytes, limit is {}",
            what, len, MAX_PATH_LEN
        )));
    }
    Ok(())
}
