//! Test helpers for pardec integration tests
//!
//! - `Workspace`: temporary directory with input/output path helpers
//! - `PatternCodec`: deterministic codec with the 160-byte / 320-sample
//!   frame contract of the vendor CELT decoder
//! - `FailingCodec`: wraps another codec and fails chosen `open()` calls
//! - `PanickingCodec`: decoder that panics on its first frame
//! - `ShortCodec`: decoder that fills only half of each frame

#![allow(dead_code)]

use pardec::codec::{CodecError, FrameCodec, FrameDecoder, FrameLayout};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Input bytes per frame for `PatternCodec`
pub const FRAME_BYTES: usize = 160;

/// Samples per channel per frame for `PatternCodec`
pub const SAMPLES_PER_CHANNEL: usize = 320;

/// Temporary directory holding one test's files
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.temp_dir.path().join(filename)
    }

    /// Write `frames` frames of distinct, deterministic content
    pub fn write_frames(&self, filename: &str, frames: usize) -> PathBuf {
        self.write_bytes(filename, &frame_data(frames, FRAME_BYTES))
    }

    pub fn write_bytes(&self, filename: &str, data: &[u8]) -> PathBuf {
        let path = self.path(filename);
        let mut file = fs::File::create(&path).expect("Failed to create input file");
        file.write_all(data).expect("Failed to write input file");
        path
    }
}

/// Remove every permission bit from `path`.
///
/// Returns false when the file can still be opened afterwards (running as
/// root), in which case callers skip their checks.
#[cfg(unix)]
pub fn make_unreadable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).expect("Failed to chmod input");
    fs::File::open(path).is_err()
}

/// `frames` frames of `frame_bytes` bytes; every frame differs from its neighbours
pub fn frame_data(frames: usize, frame_bytes: usize) -> Vec<u8> {
    (0..frames * frame_bytes)
        .map(|i| {
            let frame = i / frame_bytes;
            let offset = i % frame_bytes;
            (frame.wrapping_mul(31) ^ offset.wrapping_mul(7)) as u8
        })
        .collect()
}

/// Read a PCM file back as 16-bit little-endian samples
pub fn read_pcm(path: &Path) -> Vec<i16> {
    fs::read(path)
        .expect("Failed to read output")
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Deterministic stateless codec: sample `j` of channel `c` is derived from
/// input byte `j % 160` and the channel index. Frames decode independently.
#[derive(Debug, Default)]
pub struct PatternCodec;

impl PatternCodec {
    /// Samples expected for one input frame
    pub fn expected_samples(frame: &[u8], channels: u16) -> Vec<i16> {
        let mut pcm = Vec::with_capacity(SAMPLES_PER_CHANNEL * channels as usize);
        for j in 0..SAMPLES_PER_CHANNEL {
            for c in 0..channels as usize {
                pcm.push(pattern_sample(frame[j % FRAME_BYTES], j, c));
            }
        }
        pcm
    }
}

fn pattern_sample(byte: u8, j: usize, channel: usize) -> i16 {
    ((byte as i16) << 6) ^ ((j as i16) * (channel as i16 + 1))
}

struct PatternDecoder {
    channels: usize,
}

impl FrameDecoder for PatternDecoder {
    fn decode(&mut self, frame: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError> {
        for j in 0..SAMPLES_PER_CHANNEL {
            for c in 0..self.channels {
                pcm[j * self.channels + c] = pattern_sample(frame[j % FRAME_BYTES], j, c);
            }
        }
        Ok(SAMPLES_PER_CHANNEL)
    }
}

impl FrameCodec for PatternCodec {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        match channels {
            1 | 2 => Ok(FrameLayout::new(FRAME_BYTES, SAMPLES_PER_CHANNEL, channels)),
            other => Err(CodecError::UnsupportedChannels(other)),
        }
    }

    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        self.layout(channels)?;
        Ok(Box::new(PatternDecoder {
            channels: channels as usize,
        }))
    }
}

/// Fails the `open()` calls whose 0-based call index is in `fail_calls`
pub struct FailingCodec<C> {
    inner: C,
    fail_calls: HashSet<usize>,
    calls: AtomicUsize,
}

impl<C: FrameCodec> FailingCodec<C> {
    pub fn new(inner: C, fail_calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner,
            fail_calls: fail_calls.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C: FrameCodec> FrameCodec for FailingCodec<C> {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        self.inner.layout(channels)
    }

    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.contains(&call) {
            return Err(CodecError::InitFailed(format!("injected failure on call {}", call)));
        }
        self.inner.open(channels)
    }
}

/// Decoder that panics on the first frame
#[derive(Debug, Default)]
pub struct PanickingCodec;

struct PanickingDecoder;

impl FrameDecoder for PanickingDecoder {
    fn decode(&mut self, _frame: &[u8], _pcm: &mut [i16]) -> Result<usize, CodecError> {
        panic!("decoder exploded");
    }
}

impl FrameCodec for PanickingCodec {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        Ok(FrameLayout::new(FRAME_BYTES, SAMPLES_PER_CHANNEL, channels))
    }

    fn open(&self, _channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        Ok(Box::new(PanickingDecoder))
    }
}

/// Pattern decoder that reports half the layout's samples per channel
#[derive(Debug, Default)]
pub struct ShortCodec;

/// Samples per channel produced by `ShortCodec`
pub const SHORT_SAMPLES_PER_CHANNEL: usize = SAMPLES_PER_CHANNEL / 2;

struct ShortDecoder {
    inner: PatternDecoder,
}

impl FrameDecoder for ShortDecoder {
    fn decode(&mut self, frame: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError> {
        self.inner.decode(frame, pcm)?;
        Ok(SHORT_SAMPLES_PER_CHANNEL)
    }
}

impl FrameCodec for ShortCodec {
    fn name(&self) -> &'static str {
        "short"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        PatternCodec.layout(channels)
    }

    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        PatternCodec.layout(channels)?;
        Ok(Box::new(ShortDecoder {
            inner: PatternDecoder {
                channels: channels as usize,
            },
        }))
    }
}
