//! pardec - parallel decoder entry point
//!
//! Splits the input into jobs of `--frames-per-thread` frames and decodes
//! every job on its own thread into one shared output file.
//!
//! Exit status:
//! - 0: every job decoded its whole range
//! - 1: bad arguments or a precondition failed; no worker was started
//! - 2: decoding ran but at least one job failed (its output region is zero-filled)

use anyhow::{Context, Result};
use clap::Parser;
use pardec::cli::{self, CommonArgs, ParallelArgs};
use pardec::{config, decode_parallel, DecodeReport};
use pardec_common::logging::{init_logging, LogTarget};
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments for pardec
#[derive(Parser, Debug)]
#[command(name = "pardec")]
#[command(about = "Decode a fixed-frame encoded audio file to raw PCM on parallel worker threads")]
#[command(version)]
#[command(after_help = "Example:\n  pardec -I ~/1.avc -O ~/1.pcm\nWith debug log:\n  pardec -I ~/1.avc -O ~/1.pcm -D ~/1.log -X\n\n-XD is accepted as a synonym for -X.\nThe default codec is avccelt when built with the `avccelt` feature, else ima-adpcm.")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    parallel: ParallelArgs,
}

fn main() -> ExitCode {
    let args = match Args::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    match run(&args) {
        Ok(report) if report.is_complete() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                "{} of {} job(s) failed, output is incomplete",
                report.failed_jobs().count(),
                report.worker_count()
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("pardec: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<DecodeReport> {
    let (config, logging) =
        config::resolve(&args.common, Some(&args.parallel)).context("Invalid configuration")?;
    let target = init_logging(&logging);

    info!(
        "pardec {} (git {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );
    info!(
        "InputFilePath: {}, OutputFilePath: {}, LogFile: {}, Channels: {}, FramesPerThread: {}",
        config.input.display(),
        config.output.display(),
        logging
            .log_file
            .as_deref()
            .map_or_else(|| "stderr".to_string(), |p| p.display().to_string()),
        config.channels,
        config.frames_per_thread
    );

    let codec = config.codec.codec();
    let result = decode_parallel(&config, codec.as_ref());

    // stderr already gets the error from main()
    if let (Err(e), LogTarget::File(_)) = (&result, &target) {
        error!("{}", e);
    }

    result.context("Decode failed")
}
