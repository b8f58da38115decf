//! Chunk decode worker
//!
//! Decodes one job's input range into its output region:
//! open both files, seek to the job's offsets, then read one frame, decode
//! it, write the PCM, and advance until the range is exhausted or the input
//! ends. Any failure abandons the rest of the range.
//!
//! Every exit path drops the codec session and both file handles before the
//! job's latch is signalled, and signals it exactly once.

use crate::codec::{CodecError, FrameCodec, FrameCodecSession, SampleCount};
use crate::job::JobDescriptor;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// What to do when the input ends part-way through a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingFrame {
    /// Fail the job
    Reject,

    /// Log a warning and finish the job normally
    Tolerate,
}

/// Per-run settings shared by every worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Interleaved output channels
    pub channels: u16,

    /// Handling of a partial final frame
    pub trailing_frame: TrailingFrame,

    /// Samples per channel each decode call must produce
    pub sample_count: SampleCount,
}

/// Why a job stopped before finishing its range
#[derive(Debug, Error)]
pub enum JobFailure {
    /// Input file could not be opened
    #[error("Could not open input file {path}: {error}")]
    OpenInput {
        path: PathBuf,
        error: io::Error,
    },

    /// Output file could not be opened
    #[error("Could not open output file {path}: {error}")]
    OpenOutput {
        path: PathBuf,
        error: io::Error,
    },

    /// Seek to the job's start offset failed
    #[error("Seek to offset {offset} failed: {error}")]
    Seek {
        offset: u64,
        error: io::Error,
    },

    /// Decoder could not be initialised
    #[error("Decoder init failed: {0}")]
    CodecInit(CodecError),

    /// Non-retryable read error
    #[error("Read failed at input offset {offset}: {error}")]
    Read {
        offset: u64,
        error: io::Error,
    },

    /// Input ended part-way through a frame
    #[error("Input ended mid-frame at offset {offset} ({read} of {expected} bytes)")]
    TruncatedFrame {
        offset: u64,
        read: usize,
        expected: usize,
    },

    /// Decoder rejected a frame
    #[error("Decode failed at input offset {offset}: {error}")]
    Decode {
        offset: u64,
        error: CodecError,
    },

    /// PCM write failed
    #[error("Write failed at output offset {offset}: {error}")]
    Write {
        offset: u64,
        error: io::Error,
    },

    /// Worker thread could not be started
    #[error("Worker thread could not be spawned: {0}")]
    Spawn(io::Error),

    /// Worker thread panicked
    #[error("Worker panicked: {0}")]
    Panicked(String),
}

/// Result of one job
#[derive(Debug)]
pub struct JobOutcome {
    /// 0-based job index
    pub job_id: usize,

    /// Frames decoded and written
    pub frames_decoded: u64,

    /// PCM bytes written to the output
    pub bytes_written: u64,

    /// Set when the job stopped early
    pub failure: Option<JobFailure>,
}

impl JobOutcome {
    /// Outcome for a job that never produced any output
    pub fn failed(job_id: usize, failure: JobFailure) -> Self {
        Self {
            job_id,
            frames_decoded: 0,
            bytes_written: 0,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Default)]
struct Progress {
    frames: u64,
    bytes_written: u64,
}

/// Run one job to completion or to its first failure.
///
/// Signals `job.latch` exactly once, after all resources are released,
/// whether the job succeeds, fails, or panics.
pub fn run_job(job: &JobDescriptor<'_>, codec: &dyn FrameCodec, options: &WorkerOptions) -> JobOutcome {
    // Declared first so it drops last
    let _signal = job.latch.guard();
    let mut progress = Progress::default();

    debug!(
        job = job.job_id,
        r_pos = job.r_pos,
        r_len = job.r_len,
        w_pos = job.w_pos,
        "job started"
    );

    let result = decode_range(job, codec, options, &mut progress);

    match &result {
        Ok(()) => debug!(
            job = job.job_id,
            frames = progress.frames,
            bytes = progress.bytes_written,
            "job finished"
        ),
        Err(failure) => error!(
            job = job.job_id,
            frames = progress.frames,
            bytes = progress.bytes_written,
            "job failed: {}",
            failure
        ),
    }

    JobOutcome {
        job_id: job.job_id,
        frames_decoded: progress.frames,
        bytes_written: progress.bytes_written,
        failure: result.err(),
    }
}

fn decode_range(
    job: &JobDescriptor<'_>,
    codec: &dyn FrameCodec,
    options: &WorkerOptions,
    progress: &mut Progress,
) -> Result<(), JobFailure> {
    let mut input = File::open(job.input).map_err(|error| JobFailure::OpenInput {
        path: job.input.to_path_buf(),
        error,
    })?;
    let mut output = OpenOptions::new()
        .write(true)
        .open(job.output)
        .map_err(|error| JobFailure::OpenOutput {
            path: job.output.to_path_buf(),
            error,
        })?;

    input
        .seek(SeekFrom::Start(job.r_pos))
        .map_err(|error| JobFailure::Seek { offset: job.r_pos, error })?;
    output
        .seek(SeekFrom::Start(job.w_pos))
        .map_err(|error| JobFailure::Seek { offset: job.w_pos, error })?;

    let mut session = FrameCodecSession::open(codec, options.channels)
        .map_err(JobFailure::CodecInit)?
        .with_sample_count(options.sample_count);
    let frame_bytes = session.layout().input_frame_bytes;
    let mut frame = vec![0u8; frame_bytes];

    let mut remaining = job.r_len;
    let mut read_pos = job.r_pos;
    let mut write_pos = job.w_pos;

    while remaining > 0 {
        match read_frame(&mut input, &mut frame, read_pos)? {
            FrameRead::End => break,
            FrameRead::Partial(read) => match options.trailing_frame {
                TrailingFrame::Tolerate => {
                    warn!(
                        job = job.job_id,
                        "input length is not a whole number of frames, ignoring last {} bytes",
                        read
                    );
                    break;
                }
                TrailingFrame::Reject => {
                    return Err(JobFailure::TruncatedFrame {
                        offset: read_pos,
                        read,
                        expected: frame_bytes,
                    });
                }
            },
            FrameRead::Full => {}
        }

        let pcm = session
            .decode_frame(&frame)
            .map_err(|error| JobFailure::Decode { offset: read_pos, error })?;
        output
            .write_all(pcm)
            .map_err(|error| JobFailure::Write { offset: write_pos, error })?;

        progress.frames += 1;
        progress.bytes_written += pcm.len() as u64;
        trace!(
            job = job.job_id,
            frame = progress.frames,
            read = frame_bytes,
            samples = pcm.len() / 2,
            "decoded frame"
        );

        read_pos += frame_bytes as u64;
        write_pos += pcm.len() as u64;
        remaining = remaining.saturating_sub(frame_bytes as u64);
    }

    Ok(())
}

/// Result of reading one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameRead {
    /// The buffer holds a whole frame
    Full,

    /// Input ended after this many bytes of the frame
    Partial(usize),

    /// Input ended at a frame boundary
    End,
}

/// Read exactly one frame from the current position.
///
/// An interrupted read rewinds past whatever part of the frame was already
/// read and retries the whole frame, with no retry limit.
pub(crate) fn read_frame<R: Read + Seek>(
    input: &mut R,
    frame: &mut [u8],
    offset: u64,
) -> Result<FrameRead, JobFailure> {
    let mut filled = 0;

    while filled < frame.len() {
        match input.read(&mut frame[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                warn!("blocking read interrupted after {} bytes, retrying frame", filled);
                if filled > 0 {
                    input
                        .seek(SeekFrom::Current(-(filled as i64)))
                        .map_err(|error| JobFailure::Seek { offset, error })?;
                    filled = 0;
                }
            }
            Err(error) => return Err(JobFailure::Read { offset, error }),
        }
    }

    Ok(match filled {
        0 => FrameRead::End,
        n if n == frame.len() => FrameRead::Full,
        n => FrameRead::Partial(n),
    })
}
