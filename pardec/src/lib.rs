//! # pardec: Parallel Fixed-Frame Audio Decoder
//!
//! Splits a file of fixed-size encoder frames into contiguous byte ranges,
//! decodes each range on its own worker thread, and writes the PCM output of
//! every range into its own disjoint region of one shared output file.
//!
//! **Architecture:**
//! - [`job::PartitionPlan`] derives per-worker input ranges and output offsets
//! - [`worker::run_job`] decodes one range through a [`codec::FrameCodecSession`]
//! - [`dispatcher::decode_parallel`] launches one worker per job and waits on a
//!   [`latch::CountDownLatch`]
//! - [`dispatcher::decode_serial`] decodes the whole file on the calling thread
//!
//! The frame decoder itself sits behind the [`codec::FrameCodec`] trait.

pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod latch;
pub mod worker;

pub use config::DecodeConfig;
pub use dispatcher::{decode_parallel, decode_serial, DecodeReport};
pub use error::{Error, Result};
