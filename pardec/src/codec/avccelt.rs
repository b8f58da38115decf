//! Vendor CELT decoder (libavccelt) FFI wrapper
//!
//! Safe wrapper around the vendor C decoder:
//! 16 kHz, 20 ms frames (320 samples per channel), 160 encoded bytes per
//! frame. Each handle is released through `Drop`.
//!
//! # Safety
//! The library is thread-safe as long as each thread uses its own handle;
//! handles are never shared or sent between threads here.

use super::{check_channels, CodecError, FrameCodec, FrameDecoder, FrameLayout};
use std::os::raw::{c_int, c_short, c_uchar, c_void};

/// Encoded bytes per 20 ms frame
pub const CELT_FRAME_BYTES: usize = 160;

/// Samples per channel per 20 ms frame at 16 kHz
pub const CELT_SAMPLES_PER_FRAME: usize = 320;

#[allow(non_snake_case)]
mod ffi {
    use super::*;

    pub type DecoderPtr = *mut c_void;

    #[link(name = "avccelt")]
    extern "C" {
        pub fn AVC_DEC_CM4_16K_C1_F320_init(channels: c_int, decoder: *mut DecoderPtr) -> c_int;

        pub fn AVC_DEC_CM4_16K_C1_F320_proc(
            input: *const c_uchar,
            output: *mut c_short,
            input_len: c_int,
            decoder: DecoderPtr,
        ) -> c_int;

        pub fn AVC_DEC_CM4_uninit(decoder: DecoderPtr);
    }
}

/// Vendor CELT codec
#[derive(Debug, Clone, Copy, Default)]
pub struct AvcCeltCodec;

impl FrameCodec for AvcCeltCodec {
    fn name(&self) -> &'static str {
        "avccelt"
    }

    fn layout(&self, channels: u16) -> Result<FrameLayout, CodecError> {
        check_channels(channels)?;
        Ok(FrameLayout::new(CELT_FRAME_BYTES, CELT_SAMPLES_PER_FRAME, channels))
    }

    fn open(&self, channels: u16) -> Result<Box<dyn FrameDecoder>, CodecError> {
        check_channels(channels)?;

        let mut handle: ffi::DecoderPtr = std::ptr::null_mut();
        let status = unsafe { ffi::AVC_DEC_CM4_16K_C1_F320_init(channels as c_int, &mut handle) };
        if status != 0 || handle.is_null() {
            return Err(CodecError::InitFailed(format!(
                "AVC_DEC_CM4_16K_C1_F320_init returned {}",
                status
            )));
        }

        Ok(Box::new(AvcCeltDecoder {
            handle,
            channels: channels as usize,
        }))
    }
}

/// RAII wrapper around one decoder handle
struct AvcCeltDecoder {
    handle: ffi::DecoderPtr,
    channels: usize,
}

impl FrameDecoder for AvcCeltDecoder {
    fn decode(&mut self, frame: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError> {
        if frame.len() != CELT_FRAME_BYTES {
            return Err(CodecError::FrameSize {
                expected: CELT_FRAME_BYTES,
                actual: frame.len(),
            });
        }
        // The library writes up to one full frame unconditionally
        let required = CELT_SAMPLES_PER_FRAME * self.channels;
        if pcm.len() < required {
            return Err(CodecError::DecodeFailed(format!(
                "output buffer holds {} samples, frame needs {}",
                pcm.len(),
                required
            )));
        }

        let produced = unsafe {
            ffi::AVC_DEC_CM4_16K_C1_F320_proc(
                frame.as_ptr(),
                pcm.as_mut_ptr(),
                frame.len() as c_int,
                self.handle,
            )
        };

        if produced < 0 {
            return Err(CodecError::DecodeFailed(format!(
                "AVC_DEC_CM4_16K_C1_F320_proc returned {}",
                produced
            )));
        }

        Ok(produced as usize)
    }
}

impl Drop for AvcCeltDecoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::AVC_DEC_CM4_uninit(self.handle) };
            self.handle = std::ptr::null_mut();
        }
    }
}
