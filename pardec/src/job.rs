//! Job partitioning
//!
//! Splits an input of whole encoder frames into contiguous per-worker byte
//! ranges and derives each range's output offset. Input ranges are
//! contiguous and non-overlapping by construction, and so are the output
//! ranges, because every input frame expands to the same number of output
//! bytes. That is what lets workers write one shared output file without
//! coordinating.

use crate::codec::FrameLayout;
use crate::error::{Error, Result};
use crate::latch::CountDownLatch;
use std::path::Path;

/// One worker's byte assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRange {
    /// 0-based job index
    pub job_id: usize,

    /// Input start offset
    pub r_pos: u64,

    /// Input bytes assigned
    pub r_len: u64,

    /// Output start offset
    pub w_pos: u64,

    /// Output bytes this job produces when it completes
    pub w_len: u64,
}

impl JobRange {
    /// End of the input range (exclusive)
    pub fn r_end(&self) -> u64 {
        self.r_pos + self.r_len
    }

    /// End of the output range (exclusive)
    pub fn w_end(&self) -> u64 {
        self.w_pos + self.w_len
    }
}

/// Partition of one input file into worker jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    total_bytes: u64,
    layout: FrameLayout,
    frames_per_thread: u32,
    chunk_bytes: u64,
    ranges: Vec<JobRange>,
}

impl PartitionPlan {
    /// Partition `total_bytes` of input into chunks of `frames_per_thread`
    /// frames; the last chunk may be shorter.
    ///
    /// # Errors
    /// - `frames_per_thread` is zero
    /// - `total_bytes` is not a multiple of the input frame size
    pub fn new(total_bytes: u64, layout: FrameLayout, frames_per_thread: u32) -> Result<Self> {
        if frames_per_thread == 0 {
            return Err(Error::Config("frames per thread must be at least 1".to_string()));
        }
        if layout.input_frame_bytes == 0 {
            return Err(Error::Config("codec reports a zero-byte input frame".to_string()));
        }

        let frame_bytes = layout.input_frame_bytes as u64;
        if total_bytes % frame_bytes != 0 {
            return Err(Error::Misaligned {
                len: total_bytes,
                frame_bytes: layout.input_frame_bytes,
            });
        }

        let chunk_bytes = frames_per_thread as u64 * frame_bytes;
        let worker_count = total_bytes.div_ceil(chunk_bytes) as usize;

        let mut ranges = Vec::with_capacity(worker_count);
        let mut remaining = total_bytes;
        for job_id in 0..worker_count {
            let r_pos = job_id as u64 * chunk_bytes;
            let r_len = remaining.min(chunk_bytes);
            let w_pos = layout.output_offset(r_pos);
            let w_len = layout.output_offset(r_len);
            ranges.push(JobRange {
                job_id,
                r_pos,
                r_len,
                w_pos,
                w_len,
            });
            remaining -= r_len;
        }

        Ok(Self {
            total_bytes,
            layout,
            frames_per_thread,
            chunk_bytes,
            ranges,
        })
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn total_frames(&self) -> u64 {
        self.total_bytes / self.layout.input_frame_bytes as u64
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn frames_per_thread(&self) -> u32 {
        self.frames_per_thread
    }

    /// Input bytes per full job
    pub fn chunk_bytes(&self) -> u64 {
        self.chunk_bytes
    }

    pub fn worker_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[JobRange] {
        &self.ranges
    }

    /// Output length once every job has completed
    pub fn expected_output_len(&self) -> u64 {
        self.layout.output_offset(self.total_bytes)
    }

    /// Build one descriptor per job, all sharing `latch`.
    ///
    /// The descriptors borrow the paths and the latch, so none of them can
    /// outlive the orchestration that owns those.
    pub fn descriptors<'a>(
        &self,
        input: &'a Path,
        output: &'a Path,
        latch: &'a CountDownLatch,
    ) -> Vec<JobDescriptor<'a>> {
        self.ranges
            .iter()
            .map(|range| JobDescriptor {
                job_id: range.job_id,
                input,
                r_pos: range.r_pos,
                r_len: range.r_len,
                output,
                w_pos: range.w_pos,
                latch,
            })
            .collect()
    }
}

/// Immutable plan for one worker
#[derive(Debug, Clone, Copy)]
pub struct JobDescriptor<'a> {
    /// 0-based job index
    pub job_id: usize,

    /// Encoded input file
    pub input: &'a Path,

    /// Input start offset
    pub r_pos: u64,

    /// Input bytes to decode
    pub r_len: u64,

    /// Shared PCM output file
    pub output: &'a Path,

    /// Output start offset
    pub w_pos: u64,

    /// Completion barrier shared by all jobs
    pub latch: &'a CountDownLatch,
}
