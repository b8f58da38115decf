//! Job dispatcher
//!
//! Parallel profile: partition the input, pre-size the output, launch one
//! worker thread per job, wait for the latch, then collect every worker's
//! outcome into a [`DecodeReport`].
//!
//! Serial profile: decode the whole input as one job on the calling thread.
//!
//! Workers run as scoped threads. The job descriptors and the latch live on
//! the dispatcher's stack and the scope cannot end before every worker has
//! returned, so no descriptor can be released while a worker still holds it.

use crate::codec::{FrameCodec, SampleCount};
use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use crate::job::{JobDescriptor, PartitionPlan};
use crate::latch::CountDownLatch;
use crate::worker::{self, JobFailure, JobOutcome, TrailingFrame, WorkerOptions};
use std::any::Any;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Summary of one decode run
#[derive(Debug)]
pub struct DecodeReport {
    outcomes: Vec<JobOutcome>,
    elapsed: Duration,
    expected_output_bytes: u64,
}

impl DecodeReport {
    /// Per-job outcomes, ordered by job id
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    pub fn worker_count(&self) -> usize {
        self.outcomes.len()
    }

    /// True when every job decoded its whole range
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn frames_decoded(&self) -> u64 {
        self.outcomes.iter().map(|outcome| outcome.frames_decoded).sum()
    }

    pub fn bytes_written(&self) -> u64 {
        self.outcomes.iter().map(|outcome| outcome.bytes_written).sum()
    }

    /// Output length if every job completes
    pub fn expected_output_bytes(&self) -> u64 {
        self.expected_output_bytes
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Decode `config.input` with one worker thread per job.
///
/// # Errors
/// Process-level failures only, all raised before any worker starts:
/// unreadable metadata, an input that cannot be opened, misaligned input
/// length, invalid configuration, or an output file that cannot be prepared. Job failures are reported in the
/// returned [`DecodeReport`].
pub fn decode_parallel(config: &DecodeConfig, codec: &dyn FrameCodec) -> Result<DecodeReport> {
    config.validate()?;
    let layout = codec.layout(config.channels)?;
    let total_bytes = check_input(&config.input)?;

    let plan = PartitionPlan::new(total_bytes, layout, config.frames_per_thread).map_err(|e| {
        error!("{}: {}", config.input.display(), e);
        e
    })?;

    info!(
        "Decoding {} ({} bytes, {} frames) with {} into {} using {} worker(s) of up to {} frames",
        config.input.display(),
        plan.total_bytes(),
        plan.total_frames(),
        codec.name(),
        config.output.display(),
        plan.worker_count(),
        plan.frames_per_thread()
    );
    debug!(
        "Frame layout: {} input bytes -> {} output bytes (ratio {})",
        layout.input_frame_bytes,
        layout.output_frame_bytes(),
        layout.expansion_ratio()
    );

    prepare_output(&config.output, plan.expected_output_len())?;

    let options = WorkerOptions {
        channels: config.channels,
        trailing_frame: TrailingFrame::Reject,
        // Output offsets assume every frame expands by the same amount
        sample_count: SampleCount::Exact,
    };
    let started = Instant::now();

    let latch = CountDownLatch::new(plan.worker_count());
    let jobs = plan.descriptors(&config.input, &config.output, &latch);
    let outcomes = run_workers(&jobs, &latch, codec, &options);

    let report = DecodeReport {
        outcomes,
        elapsed: started.elapsed(),
        expected_output_bytes: plan.expected_output_len(),
    };
    log_report(&report, &config.output);
    Ok(report)
}

/// Decode `config.input` as a single job on the calling thread.
///
/// The input need not be frame-aligned: a partial final frame is skipped
/// with a warning. A decoder may return fewer samples than its layout
/// declares; they are written as produced. Any other failure of the job is
/// returned as an error.
pub fn decode_serial(config: &DecodeConfig, codec: &dyn FrameCodec) -> Result<DecodeReport> {
    config.validate()?;
    let layout = codec.layout(config.channels)?;
    let total_bytes = check_input(&config.input)?;
    let frame_bytes = layout.input_frame_bytes as u64;
    if frame_bytes == 0 {
        return Err(Error::Config("codec reports a zero-byte input frame".to_string()));
    }
    let expected_output_bytes = layout.output_offset(total_bytes - total_bytes % frame_bytes);

    info!(
        "Decoding {} ({} bytes) with {} into {}",
        config.input.display(),
        total_bytes,
        codec.name(),
        config.output.display()
    );

    prepare_output(&config.output, 0)?;

    let options = WorkerOptions {
        channels: config.channels,
        trailing_frame: TrailingFrame::Tolerate,
        sample_count: SampleCount::AtMost,
    };
    let started = Instant::now();

    let latch = CountDownLatch::new(1);
    let job = JobDescriptor {
        job_id: 0,
        input: &config.input,
        r_pos: 0,
        r_len: total_bytes,
        output: &config.output,
        w_pos: 0,
        latch: &latch,
    };
    let mut outcome = worker::run_job(&job, codec, &options);
    latch.wait();

    if let Some(failure) = outcome.failure.take() {
        return Err(Error::Job { job_id: 0, failure });
    }

    let report = DecodeReport {
        outcomes: vec![outcome],
        elapsed: started.elapsed(),
        expected_output_bytes,
    };
    log_report(&report, &config.output);
    Ok(report)
}

/// Launch one scoped worker per job, wait for the latch, collect outcomes.
fn run_workers(
    jobs: &[JobDescriptor<'_>],
    latch: &CountDownLatch,
    codec: &dyn FrameCodec,
    options: &WorkerOptions,
) -> Vec<JobOutcome> {
    thread::scope(|scope| {
        let mut launched = Vec::with_capacity(jobs.len());

        for job in jobs {
            let spawned = thread::Builder::new()
                .name(format!("pardec-worker-{}", job.job_id))
                .spawn_scoped(scope, move || worker::run_job(job, codec, options));

            match spawned {
                Ok(handle) => launched.push(Ok(handle)),
                Err(e) => {
                    error!(job = job.job_id, "failed to spawn worker: {}", e);
                    // This job will never run, so signal on its behalf
                    job.latch.count_down();
                    launched.push(Err(JobOutcome::failed(job.job_id, JobFailure::Spawn(e))));
                }
            }
        }

        latch.wait();
        debug!("All {} worker(s) signalled completion", jobs.len());

        launched
            .into_iter()
            .zip(jobs)
            .map(|(launch, job)| match launch {
                Ok(handle) => handle.join().unwrap_or_else(|panic| {
                    JobOutcome::failed(job.job_id, JobFailure::Panicked(panic_message(panic.as_ref())))
                }),
                Err(outcome) => outcome,
            })
            .collect()
    })
}

/// Length of the input, once it is known to be a readable regular file.
///
/// Runs before the output is touched, so an unusable input never creates
/// or truncates the output.
fn check_input(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|error| Error::Metadata {
        path: path.to_path_buf(),
        error,
    })?;

    if !metadata.is_file() {
        return Err(Error::InvalidInput(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    // Workers open their own handles; this one only proves read access
    File::open(path).map_err(|error| Error::OpenInput {
        path: path.to_path_buf(),
        error,
    })?;

    Ok(metadata.len())
}

/// Create (or truncate) the output and size it to `len` bytes.
///
/// Pre-sizing means regions of failed jobs read back as zeros rather than
/// stale data, and the file length never depends on which job finishes last.
fn prepare_output(path: &Path, len: u64) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|error| Error::PrepareOutput {
            path: path.to_path_buf(),
            error,
        })?;

    file.set_len(len).map_err(|error| Error::PrepareOutput {
        path: path.to_path_buf(),
        error,
    })
}

fn log_report(report: &DecodeReport, output: &Path) {
    info!(
        "end decode: {} frame(s), {} of {} bytes written to {}",
        report.frames_decoded(),
        report.bytes_written(),
        report.expected_output_bytes(),
        output.display()
    );
    info!("cost time: {:.6} seconds", report.elapsed().as_secs_f64());

    for outcome in report.failed_jobs() {
        if let Some(failure) = &outcome.failure {
            warn!(
                job = outcome.job_id,
                "job incomplete after {} frame(s): {}",
                outcome.frames_decoded,
                failure
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
