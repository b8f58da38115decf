//! Per-worker codec session
//!
//! Owns one decoder handle plus the buffers sized from its frame layout.
//! The handle is released when the session drops, on every exit path.

use super::{CodecError, FrameCodec, FrameDecoder, FrameLayout, SAMPLE_BYTES};

/// How many samples per channel a decode call must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    /// Exactly the layout's count. Output offsets are computed from it.
    #[default]
    Exact,

    /// Up to the layout's count; shorter frames are written as produced
    AtMost,
}

/// One worker's decoder handle and buffers
pub struct FrameCodecSession {
    decoder: Box<dyn FrameDecoder>,
    layout: FrameLayout,
    sample_count: SampleCount,
    pcm: Vec<i16>,
    bytes: Vec<u8>,
}

impl FrameCodecSession {
    /// Initialise a decoder for `channels` output channels
    pub fn open(codec: &dyn FrameCodec, channels: u16) -> Result<Self, CodecError> {
        let layout = codec.layout(channels)?;
        let decoder = codec.open(channels)?;

        Ok(Self {
            decoder,
            layout,
            sample_count: SampleCount::Exact,
            pcm: vec![0; layout.samples_per_frame()],
            bytes: Vec::with_capacity(layout.output_frame_bytes()),
        })
    }

    pub fn with_sample_count(mut self, sample_count: SampleCount) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Decode one frame into little-endian PCM bytes.
    ///
    /// With [`SampleCount::Exact`] the returned slice is always exactly
    /// `output_frame_bytes()` long. More samples than the layout declares
    /// always fail the frame; fewer fail it only under `Exact`.
    pub fn decode_frame(&mut self, frame: &[u8]) -> Result<&[u8], CodecError> {
        if frame.len() != self.layout.input_frame_bytes {
            return Err(CodecError::FrameSize {
                expected: self.layout.input_frame_bytes,
                actual: frame.len(),
            });
        }

        let produced = self.decoder.decode(frame, &mut self.pcm)?;
        let expected = self.layout.samples_per_channel;
        let acceptable = match self.sample_count {
            SampleCount::Exact => produced == expected,
            SampleCount::AtMost => produced <= expected,
        };
        if !acceptable {
            return Err(CodecError::SampleCount { expected, produced });
        }

        let samples = produced * self.layout.channels as usize;
        self.bytes.clear();
        for sample in &self.pcm[..samples] {
            self.bytes.extend_from_slice(&sample.to_le_bytes());
        }
        debug_assert_eq!(self.bytes.len(), samples * SAMPLE_BYTES);

        Ok(&self.bytes)
    }
}
