//! Rolling file logger with a circular buffer of recent lines.
//!
//! Installs a `tracing` subscriber that also receives `log` records, and
//! writes every event to a daily log file and to an in-memory ring buffer.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;
/// Daily files kept on disk
pub const DEFAULT_RETAINED_FILES: usize = 7;

static BUFFER: OnceLock<LogBuffer> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded buffer of the most recent log lines
#[derive(Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = lock(&self.lines);
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Oldest first
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).iter().cloned().collect()
    }
}

/// Writer handed to the fmt layer; each event arrives as one write
pub struct BufferWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let text = String::from_utf8_lossy(&self.pending);
            for line in text.lines().filter(|l| !l.is_empty()) {
                self.buffer.push(line);
            }
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for BufferWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

/// Daily appender writing `<dir>/<app>.<YYYY-MM-DD>.log` (UTC dates),
/// keeping at most `retained` files.
pub fn rolling_appender(dir: impl AsRef<Path>, app_name: &str, retained: usize) -> Result<RollingFileAppender, String> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(app_name)
        .filename_suffix("log")
        .max_log_files(retained.max(1))
        .build(dir.as_ref())
        .map_err(|e| e.to_string())
}

/// Install the global logger with the default level `info`
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), String> {
    init_logger_with_level(log_dir, app_name, "info")
}

/// Install the global logger. `RUST_LOG` overrides `default_level`.
pub fn init_logger_with_level(log_dir: impl Into<PathBuf>, app_name: &str, default_level: &str) -> Result<(), String> {
    let log_dir = log_dir.into();
    std::fs::create_dir_all(&log_dir).map_err(|e| e.to_string())?;
    let (files, guard) = tracing_appender::non_blocking(rolling_appender(&log_dir, app_name, DEFAULT_RETAINED_FILES)?);
    // Dropping the guard stops the background writer
    let _ = FILE_GUARD.set(guard);
    let buffer = BUFFER.get_or_init(|| LogBuffer::new(DEFAULT_BUFFER_LINES)).clone();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| e.to_string())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(files))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_target(false).with_writer(buffer))
        .try_init()
        .map_err(|e| e.to_string())
}

/// Most recent lines logged since `init_logger`, oldest first
pub fn recent_logs() -> Vec<String> {
    BUFFER.get().map(LogBuffer::lines).unwrap_or_default()
}

pub fn info(message: &str) -> Result<(), String> {
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), String> {
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    tracing::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today_log(dir: &Path, app: &str) -> PathBuf {
        dir.join(format!("{}.{}.log", app, chrono::Utc::now().format("%Y-%m-%d")))
    }

    #[test]
    fn test_buffer_drops_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push("a");
        buffer.push("b");
        buffer.push("c");
        assert_eq!(buffer.lines(), ["b", "c"]);
    }

    #[test]
    fn test_buffer_writer_splits_lines_on_flush() {
        let buffer = LogBuffer::new(10);
        {
            let mut writer = buffer.make_writer();
            writer.write_all(b"first\nsecond\n").unwrap();
            assert!(buffer.lines().is_empty());
        }
        assert_eq!(buffer.lines(), ["first", "second"]);
    }

    #[test]
    fn test_appender_writes_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut appender = rolling_appender(dir.path(), "App", 2).unwrap();
        appender.write_all(b"one\n").unwrap();
        appender.write_all(b"two\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(std::fs::read_to_string(today_log(dir.path(), "App")).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_appends_to_existing_day() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(today_log(dir.path(), "App"), "one\n").unwrap();

        let mut appender = rolling_appender(dir.path(), "App", 3).unwrap();
        appender.write_all(b"two\n").unwrap();
        appender.flush().unwrap();
        assert_eq!(std::fs::read_to_string(today_log(dir.path(), "App")).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_leaves_other_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Other.2026-03-01.log"), "x").unwrap();
        let mut appender = rolling_appender(dir.path(), "App", 1).unwrap();
        appender.write_all(b"one\n").unwrap();
        appender.flush().unwrap();

        assert!(dir.path().join("Other.2026-03-01.log").exists());
        assert!(today_log(dir.path(), "App").exists());
    }
}
