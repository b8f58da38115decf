//! Built-in IMA/DVI ADPCM frame codec
//!
//! Frame format: 160 bytes holding 320 4-bit codes, low nibble first. Codes
//! are interleaved by channel (code `i` belongs to channel `i % channels`),
//! so a frame yields 320 samples in total: 320 per channel for mono, 160 per
//! channel for stereo. Predictor and step index reset to zero at the start
//! of every frame, which makes each frame decodable on its own and the
//! output independent of how the file is partitioned.

use super::{check_channels, CodecError, FrameCodec, FrameDecoder, FrameLayout};

/// Encoded bytes per frame
pub const ADPCM_FRAME_BYTES: usize = 160;

/// Codes (samples, all channels) per frame
const CODES_PER_FRAME: usize = ADPCM_FRAME_BYTES * 2;

const INDEX_TABLE: [i32; 8] = [-1, -1, -1, -1, 2, 4, 6, 8];

const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

/// IMA ADPCM codec (160-byte frames)
#[derive(Debug, Clone, Copy, Default)]
pub struct ImaAdpcmCodec;

impl FrameCodec for ImaAdpcmCodec {
    fn name(&self) -> &'static str {
        "ima-adpcm"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        check_channels(channels)?;
        Ok(FrameLayout::new(
            ADPCM_FRAME_BYTES,
            CODES_PER_FRAME / channels as usize,
            channels,
        ))
    }

    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        check_channels(channels)?;
        Ok(Box::new(ImaAdpcmDecoder {
            channels: channels as usize,
        }))
    }
}

/// Predictor state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    predictor: i32,
    step_index: usize,
}

impl ChannelState {
    fn expand(&mut self, code: u8) -> i16 {
        let step = STEP_TABLE[self.step_index];

        let mut diff = step >> 3;
        if code & 1 != 0 {
            diff += step >> 2;
        }
        if code & 2 != 0 {
            diff += step >> 1;
        }
        if code & 4 != 0 {
            diff += step;
        }
        if code & 8 != 0 {
            diff = -diff;
        }

        self.predictor = (self.predictor + diff).clamp(i16::MIN as i32, i16::MAX as i32);
        let next = self.step_index as i32 + INDEX_TABLE[(code & 7) as usize];
        self.step_index = next.clamp(0, STEP_TABLE.len() as i32 - 1) as usize;

        self.predictor as i16
    }
}

struct ImaAdpcmDecoder {
    channels: usize,
}

impl FrameDecoder for ImaAdpcmDecoder {
    fn decode(&mut self, frame: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError> {
        if frame.len() != ADPCM_FRAME_BYTES {
            return Err(CodecError::FrameSize {
                expected: ADPCM_FRAME_BYTES,
                actual: frame.len(),
            });
        }
        if pcm.len() < CODES_PER_FRAME {
            return Err(CodecError::DecodeFailed(format!(
                "output buffer holds {} samples, frame needs {}",
                pcm.len(),
                CODES_PER_FRAME
            )));
        }

        let mut states = [ChannelState::default(); 2];
        let codes = frame.iter().flat_map(|byte| [byte & 0x0f, byte >> 4]);
        for (i, code) in codes.enumerate() {
            pcm[i] = states[i % self.channels].expand(code);
        }

        Ok(CODES_PER_FRAME / self.channels)
    }
}
