//! Merkledrop Logging
//!
//! Logging setup shared by the `merkledrop` binary and the test suites.
//!
//! ## Usage
//!
//! ```no_run
//! use merkledrop_logging::{init, LogLevel};
//!
//! // From the CLI's -v count
//! init(LogLevel::from_verbosity(1));
//! ```
//!
//! `RUST_LOG` overrides the level when set.

use tracing_subscriber::EnvFilter;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors (default)
    #[default]
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    /// `false` → `Info`, `true` → `Debug`
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Self::Debug
        } else {
            Self::Info
        }
    }

    /// `0` → `Info`, `1` → `Debug`, `2+` → `Trace`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Quiet mode keeps only errors, so JSON on stdout stays clean
    pub fn quiet() -> Self {
        Self::Error
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Initialize logging with the specified level.
///
/// Output goes to stderr so that descriptors written to stdout are not
/// interleaved with log lines.
///
/// # Panics
///
/// Panics if a global subscriber is already set. Use `try_init` to
/// handle that case.
pub fn init(level: LogLevel) {
    try_init(level).expect("Failed to initialize logging");
}

/// Try to initialize logging, returning an error if already initialized
pub fn try_init(level: LogLevel) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Initialize logging, optionally showing the module target of each event
pub fn init_with_target(level: LogLevel, show_target: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(show_target)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize logging for tests (captures output for the test harness).
/// Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
