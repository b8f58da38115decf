//! pardec-serial - single-threaded decoder entry point
//!
//! Decodes the whole input on one thread. Unlike the parallel decoder it
//! accepts an input whose length is not a whole number of frames: the
//! partial last frame is skipped with a warning.
//!
//! Exit status: 0 on success, 1 on any failure.

use anyhow::{Context, Result};
use clap::Parser;
use pardec::cli::{self, CommonArgs};
use pardec::{config, decode_serial, DecodeReport};
use pardec_common::logging::{init_logging, LogTarget};
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments for pardec-serial
#[derive(Parser, Debug)]
#[command(name = "pardec-serial")]
#[command(about = "Decode a fixed-frame encoded audio file to raw PCM on a single thread")]
#[command(version)]
#[command(after_help = "Example:\n  pardec-serial -I ~/1.avc -O ~/1.pcm\nWith debug log:\n  pardec-serial -I ~/1.avc -O ~/1.pcm -D ~/1.log -X\n\n-XD is accepted as a synonym for -X.\nThe default codec is avccelt when built with the `avccelt` feature, else ima-adpcm.")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = match Args::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pardec-serial: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<DecodeReport> {
    let (config, logging) = config::resolve(&args.common, None).context("Invalid configuration")?;
    let target = init_logging(&logging);

    info!(
        "pardec-serial {} (git {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );
    info!(
        "InputFilePath: {}, OutputFilePath: {}, Channels: {}",
        config.input.display(),
        config.output.display(),
        config.channels
    );

    let codec = config.codec.codec();
    let result = decode_serial(&config, codec.as_ref());

    if let (Err(e), LogTarget::File(_)) = (&result, &target) {
        error!("{}", e);
    }

    result.context("Decode failed")
}
