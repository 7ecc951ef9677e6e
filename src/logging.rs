//! Log output: every line goes to stdout and is appended to the log file.

use crate::error::SyncError;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. `log` records from every crate are
/// forwarded into it. Level comes from `RUST_LOG`, default `info`.
pub fn init(path: &Path) -> Result<(), SyncError> {
    let file = open_log_file(path)
        .map_err(|e| SyncError::Logging(format!("cannot open {}: {e}", path.display())))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stdout.and(Mutex::new(file)))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| SyncError::Logging(e.to_string()))
}
