//! Tracing initialisation
//!
//! Logs go to stderr unless a log file is configured, in which case they are
//! appended to that file without ANSI colours. A log file that cannot be
//! opened is reported on stderr and logging falls back to stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events are enabled by the default filter
const LOG_TARGETS: &[&str] = &["pardec", "pardec_serial", "pardec_common"];

/// Logging options resolved from CLI/settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,

    /// Enable per-frame trace output
    pub verbose: bool,
}

/// Where log output ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Default filter directive when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "trace" } else { "info" };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is
/// harmless: later calls keep the first subscriber.
pub fn init_logging(options: &LoggingOptions) -> LogTarget {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbose)))
    };

    if let Some(path) = &options.log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = tracing_subscriber::registry()
                    .with(filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_ansi(false)
                            .with_thread_names(true)
                            .with_writer(Mutex::new(file)),
                    )
                    .try_init();
                return LogTarget::File(path.clone());
            }
            Err(e) => {
                eprintln!("log file open failed {}: {}", path.display(), e);
            }
        }
    }

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
    LogTarget::Stderr
}
