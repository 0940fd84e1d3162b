use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "kicks=info";

/// Millisecond local timestamps, e.g. `2024-03-01 14:05:09.123`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. The terminal belongs to the UI, so
/// everything goes to `path`. `KICKS_LOG` overrides the filter.
pub fn init(path: &Path) -> io::Result<()> {
    let file = open_log_file(path)?;
    let filter =
        EnvFilter::try_from_env("KICKS_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_timer(LocalTime)
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
