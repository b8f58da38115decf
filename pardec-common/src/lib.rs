//! # pardec Common Library
//!
//! Shared code for the pardec binaries:
//! - Error and Result types
//! - TOML settings file loading and per-field resolution
//! - Tracing subscriber initialisation (stderr or append-only log file)

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
