//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes every line to a size-rotated
//! file under the app's log directory and keeps the most recent lines in
//! memory. `log` records are bridged into the same subscriber.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

mod file;
mod ring;

pub use file::{RollingFile, RollingOptions};
pub use ring::RingBuffer;

/// Number of lines kept for `recent_lines`
pub const RECENT_CAPACITY: usize = 500;

static SINK: OnceLock<LogSink> = OnceLock::new();

/// Logger setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] io::Error),
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Destination shared by every writer the subscriber creates
#[derive(Clone)]
pub struct LogSink {
    file: Arc<Mutex<RollingFile>>,
    recent: Arc<RingBuffer>,
}

impl LogSink {
    pub fn new(file: RollingFile, recent: RingBuffer) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
            recent: Arc::new(recent),
        }
    }

    pub fn recent(&self) -> Vec<String> {
        self.recent.lines()
    }

    fn commit(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = file.write_line(bytes) {
            eprintln!("rolling-logger: write failed: {}", e);
        }
        drop(file);

        let line = String::from_utf8_lossy(bytes).trim_end().to_string();
        self.recent.push(line);
    }
}

/// One formatted event; committed as a whole line when dropped
pub struct SinkWriter {
    sink: LogSink,
    buf: Vec<u8>,
}

impl io::Write for SinkWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        self.sink.commit(&self.buf);
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            buf: Vec::new(),
        }
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the global logger, writing to `<log_dir>/<app_name>.log`
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, RollingOptions::default())
}

pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    options: RollingOptions,
) -> Result<(), LoggerError> {
    if SINK.get().is_some() {
        return Err(LoggerError::AlreadyInitialized(app_name.to_string()));
    }

    let file = RollingFile::open(log_dir.as_ref(), app_name, options)?;
    let sink = LogSink::new(file, RingBuffer::new(RECENT_CAPACITY));

    tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    SINK.set(sink).map_err(|_| LoggerError::AlreadyInitialized(app_name.to_string()))?;
    tracing::info!(app = app_name, "logger initialized");
    Ok(())
}

/// Most recent log lines, oldest first (empty before `init_logger`)
pub fn recent_lines() -> Vec<String> {
    SINK.get().map(LogSink::recent).unwrap_or_default()
}

pub fn info(message: &str) {
    log::info!("{}", message);
}

pub fn warn(message: &str) {
    log::warn!("{}", message);
}

pub fn error(message: &str) {
    log::error!("{}", message);
}
