//! Error types for pardec
//!
//! These are process-level failures: they stop a decode before any worker is
//! launched (or, for the serial profile, fail the single job). Failures local
//! to one parallel job are [`crate::worker::JobFailure`] values instead.

use crate::codec::CodecError;
use crate::worker::JobFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pardec
#[derive(Error, Debug)]
pub enum Error {
    /// Settings resolution errors from the common crate
    #[error(transparent)]
    Common(#[from] pardec_common::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user-supplied argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input file metadata unavailable
    #[error("Failed to read metadata for {path}: {error}")]
    Metadata { path: PathBuf, error: std::io::Error },

    /// Input file exists but cannot be opened for reading
    #[error("Could not open input file {path}: {error}")]
    OpenInput { path: PathBuf, error: std::io::Error },

    /// Input length is not a whole number of encoder frames
    #[error("Input length {len} is not a multiple of the {frame_bytes}-byte frame size")]
    Misaligned { len: u64, frame_bytes: usize },

    /// Output file could not be created or sized
    #[error("Failed to prepare output file {path}: {error}")]
    PrepareOutput { path: PathBuf, error: std::io::Error },

    /// Codec selection or layout errors
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The single job of a serial decode failed
    #[error("Job {job_id} failed: {failure}")]
    Job { job_id: usize, failure: JobFailure },
}

/// Convenience Result type using pardec Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_cause_printed_once_in_chain() {
        let err = Error::Job {
            job_id: 0,
            failure: JobFailure::OpenInput {
                path: PathBuf::from("in.avc"),
                error: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
            },
        };

        assert_eq!(
            err.to_string(),
            "Job 0 failed: Could not open input file in.avc: access denied"
        );
        assert!(err.source().is_none());

        let chained = format!("{:#}", anyhow::Error::new(err).context("Decode failed"));
        assert_eq!(chained.matches("access denied").count(), 1);
    }
}
