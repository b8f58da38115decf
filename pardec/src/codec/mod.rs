//! Frame codec interface
//!
//! The frame decoder is an external collaborator with a fixed contract:
//! every call consumes exactly one input frame of a fixed byte size and
//! produces a fixed number of 16-bit samples per channel. Parallel decoding
//! depends on that contract, since each worker computes its output offset
//! from the input offset alone.
//!
//! - [`FrameCodec`] is the factory (`init`) and describes the frame layout
//! - [`FrameDecoder`] is one decoder handle (`process`); dropping it is `uninit`
//! - [`FrameCodecSession`] is the per-worker wrapper that enforces the contract

mod adpcm;
#[cfg(feature = "avccelt")]
mod avccelt;
mod session;

pub use adpcm::ImaAdpcmCodec;
#[cfg(feature = "avccelt")]
pub use avccelt::AvcCeltCodec;
pub use session::{FrameCodecSession, SampleCount};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bytes per output sample (signed 16-bit PCM)
pub const SAMPLE_BYTES: usize = 2;

/// Errors raised by codecs and codec sessions
#[derive(Debug, Error)]
pub enum CodecError {
    /// Channel count not supported by the codec
    #[error("Invalid channel count: {0} (must be 1 or 2)")]
    UnsupportedChannels(u16),

    /// Codec name not recognised (or not compiled in)
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    /// Decoder handle could not be created
    #[error("Decoder init failed: {0}")]
    InitFailed(String),

    /// Input slice does not hold exactly one frame
    #[error("Input frame is {actual} bytes, decoder expects {expected}")]
    FrameSize { expected: usize, actual: usize },

    /// Decoder output differs from the fixed per-frame sample count
    #[error("Decoder produced {produced} samples per channel, layout requires {expected}")]
    SampleCount { expected: usize, produced: usize },

    /// Decoder reported a failure for this frame
    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),
}

/// Fixed input/output sizes of one frame for one channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Encoded bytes consumed per decode call
    pub input_frame_bytes: usize,

    /// Samples produced per channel per decode call
    pub samples_per_channel: usize,

    /// Interleaved output channels
    pub channels: u16,
}

impl FrameLayout {
    pub fn new(input_frame_bytes: usize, samples_per_channel: usize, channels: u16) -> Self {
        Self {
            input_frame_bytes,
            samples_per_channel,
            channels,
        }
    }

    /// Interleaved samples per frame (all channels)
    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_channel * self.channels as usize
    }

    /// PCM bytes produced per frame
    pub fn output_frame_bytes(&self) -> usize {
        self.samples_per_frame() * SAMPLE_BYTES
    }

    /// Output bytes per input byte
    pub fn expansion_ratio(&self) -> f64 {
        self.output_frame_bytes() as f64 / self.input_frame_bytes as f64
    }

    /// Output offset of the frame starting at `input_offset`.
    ///
    /// `input_offset` must be frame-aligned; computing through the frame
    /// index keeps the result exact when the ratio is not an integer.
    pub fn output_offset(&self, input_offset: u64) -> u64 {
        (input_offset / self.input_frame_bytes as u64) * self.output_frame_bytes() as u64
    }
}

/// One decoder handle. Not shared between threads.
pub trait FrameDecoder {
    /// Decode one input frame into interleaved samples.
    ///
    /// `pcm` holds at least `samples_per_frame()` samples. Returns the number
    /// of samples written per channel.
    fn decode(&mut self, frame: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError>;
}

/// Decoder factory shared by all workers
pub trait FrameCodec: Send + Sync {
    /// Short name used in logs and on the command line
    fn name(&self) -> &'static str;

    /// Frame sizes for the given channel count
    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError>;

    /// Create an independent decoder handle
    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError>;
}

/// Codecs selectable from the command line
///
/// The default is the vendor CELT codec when the `avccelt` feature is
/// enabled, and built-in ADPCM otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// Built-in IMA/DVI ADPCM
    #[cfg_attr(not(feature = "avccelt"), default)]
    ImaAdpcm,

    /// Vendor CELT library
    #[cfg(feature = "avccelt")]
    #[default]
    AvcCelt,
}

impl CodecKind {
    /// Instantiate the codec
    pub fn codec(self) -> Box<dyn FrameCodec> {
        match self {
            CodecKind::ImaAdpcm => Box::new(ImaAdpcmCodec),
            #[cfg(feature = "avccelt")]
            CodecKind::AvcCelt => Box::new(AvcCeltCodec),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CodecKind::ImaAdpcm => "ima-adpcm",
            #[cfg(feature = "avccelt")]
            CodecKind::AvcCelt => "avccelt",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ima-adpcm" | "adpcm" => Ok(CodecKind::ImaAdpcm),
            #[cfg(feature = "avccelt")]
            "avccelt" | "celt" => Ok(CodecKind::AvcCelt),
            #[cfg(not(feature = "avccelt"))]
            "avccelt" | "celt" => Err(CodecError::UnknownCodec(format!(
                "{} (built without the `avccelt` feature)",
                s
            ))),
            _ => Err(CodecError::UnknownCodec(s.to_string())),
        }
    }
}

/// Reject channel counts other than mono and stereo
pub(crate) fn check_channels(channels: u16) -> Result<(), CodecError> {
    match channels {
        1 | 2 => Ok(()),
        other => Err(CodecError::UnsupportedChannels(other)),
    }
}
