//! Logging configuration for pdf12step.
//!
//! This module provides initialization and configuration for the tracing-based
//! logging system used throughout pdf12step.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

use crate::error::Result;

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// A file, appended to.
    File(PathBuf),
}

impl LogTarget {
    /// Target for a `--logfile` argument: `-` is stdout, anything else a file.
    #[must_use]
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            None => Self::Stderr,
            Some(path) if path == Path::new("-") => Self::Stdout,
            Some(path) => Self::File(path.to_path_buf()),
        }
    }

    fn make_writer(&self) -> Result<BoxMakeWriter> {
        Ok(match self {
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }
}

/// Initialize the logging system.
///
/// This should be called once at application startup. The logging level can be
/// controlled via:
/// 1. The `verbosity` parameter
/// 2. The `RUST_LOG` environment variable (takes precedence)
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
///
/// # Examples
///
/// ```no_run
/// use pdf12step::logging::{init_logging, LogTarget, Verbosity};
///
/// init_logging(Verbosity::Verbose, &LogTarget::Stderr).unwrap();
/// ```
pub fn init_logging(verbosity: Verbosity, target: &LogTarget) -> Result<()> {
    let default_filter = format!("pdf12step={}", verbosity.to_level_filter());

    // Allow RUST_LOG to override
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let to_file = matches!(target, LogTarget::File(_));
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(target.make_writer()?)
            .with_ansi(!to_file)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Install the subscriber (ignore error if already set)
    let _ = subscriber.try_init();
    Ok(())
}

/// Initialize logging for tests.
///
/// This sets up a minimal logging configuration suitable for tests.
/// It only logs warnings and errors by default to keep test output clean.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_log_target_from_arg() {
        assert_eq!(LogTarget::from_arg(None), LogTarget::Stderr);
        assert_eq!(LogTarget::from_arg(Some(Path::new("-"))), LogTarget::Stdout);
        assert_eq!(
            LogTarget::from_arg(Some(Path::new("run.log"))),
            LogTarget::File(PathBuf::from("run.log"))
        );
    }

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdf12step.log");
        let target = LogTarget::File(path.clone());
        assert!(target.make_writer().is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_in_missing_dir_fails() {
        let target = LogTarget::File(PathBuf::from("/nonexistent/dir/pdf12step.log"));
        assert!(target.make_writer().is_err());
    }

    #[test]
    fn test_init_logging_with_all_verbosity_levels() {
        // Only the first call actually installs the subscriber
        init_logging(Verbosity::Quiet, &LogTarget::Stderr).unwrap();
        init_logging(Verbosity::Normal, &LogTarget::Stderr).unwrap();
        init_logging(Verbosity::Verbose, &LogTarget::Stdout).unwrap();
        init_logging(Verbosity::Trace, &LogTarget::Stderr).unwrap();
    }

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
    }
}
