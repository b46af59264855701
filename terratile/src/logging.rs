//! Logging setup for applications embedding terratile.
//!
//! The library only emits `tracing` events. Binaries and integration
//! harnesses call [`init_logging`] once to route them to a log file that is
//! cleared on start, optionally mirrored on stdout. Filtering goes through
//! `RUST_LOG` and defaults to `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info";

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub directory: PathBuf,
    pub file_name: String,
    /// Mirror events on stdout.
    pub stdout: bool,
}

impl Default for LogTarget {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "terratile.log".to_string(),
            stdout: true,
        }
    }
}

impl LogTarget {
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn without_stdout(mut self) -> Self {
        self.stdout = false;
        self
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Keeps the background file writer alive; dropping it flushes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// The log file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn prepare_log_file(target: &LogTarget) -> io::Result<PathBuf> {
    fs::create_dir_all(&target.directory)?;
    let path = target.path();
    fs::write(&path, "")?;
    Ok(path)
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if the log file cannot be prepared or a global subscriber is
/// already installed.
pub fn init_logging(target: &LogTarget) -> Result<LoggingGuard, io::Error> {
    let path = prepare_log_file(target)?;

    let appender = tracing_appender::rolling::never(&target.directory, &target.file_name);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    let stdout_layer = target.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .compact()
            .boxed()
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}
