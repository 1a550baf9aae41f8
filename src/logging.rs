use anyhow::Context;
use chrono::{DateTime, Local};
use log::Level;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config;

type Sink = Box<dyn Fn(Level, &str) + Send + Sync>;

struct Inner {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
    sinks: Mutex<Vec<(u64, Sink)>>,
    next_sink: AtomicU64,
}

/// Log handle owned by a single download run.
///
/// Every record is appended to the log file as `timestamp [LEVEL] message` and
/// forwarded to the `log` facade. Extra sinks can be attached for the lifetime
/// of a [`SinkGuard`].
#[derive(Clone)]
pub struct RunLog {
    inner: Arc<Inner>,
}

/// Detaches its sink from the [`RunLog`] when dropped.
pub struct SinkGuard {
    inner: Arc<Inner>,
    id: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn format_record(at: DateTime<Local>, level: Level, message: &str) -> String {
    format!("{} [{}] {}", at.format("%Y-%m-%d %H:%M:%S,%3f"), level, message)
}

impl RunLog {
    fn with_file(path: Option<PathBuf>, file: Option<File>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                file: Mutex::new(file),
                sinks: Mutex::new(Vec::new()),
                next_sink: AtomicU64::new(0),
            }),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        Ok(Self::with_file(Some(path.to_path_buf()), Some(file)))
    }

    /// Opens the per-user log, then the temp-directory fallback. Returns a
    /// console-only handle if neither can be written.
    pub fn open_default() -> Self {
        let candidates = config::user_log_path()
            .into_iter()
            .chain(std::iter::once(config::fallback_log_path()));
        for path in candidates {
            match Self::open(&path) {
                Ok(log) => return log,
                Err(e) => log::warn!("log file unavailable: {:#}", e),
            }
        }
        Self::disabled()
    }

    pub fn disabled() -> Self {
        Self::with_file(None, None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn record(&self, level: Level, message: &str) {
        log::log!(level, "{}", message);

        if let Some(file) = lock(&self.inner.file).as_mut() {
            let line = format_record(Local::now(), level, message);
            if let Err(e) = writeln!(file, "{}", line) {
                log::debug!("failed to append to log file: {}", e);
            }
        }

        for (_, sink) in lock(&self.inner.sinks).iter() {
            sink(level, message);
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message.as_ref());
    }

    pub fn attach<F>(&self, sink: F) -> SinkGuard
    where
        F: Fn(Level, &str) + Send + Sync + 'static,
    {
        let id = self.inner.next_sink.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.sinks).push((id, Box::new(sink)));
        SinkGuard {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    pub fn sink_count(&self) -> usize {
        lock(&self.inner.sinks).len()
    }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        lock(&self.inner.sinks).retain(|(id, _)| *id != self.id);
    }
}

const TAIL_CHUNK: u64 = 8 * 1024;

/// Last `max_lines` lines of a log file, or an empty string if it cannot be read.
/// Reads backwards from the end in fixed chunks.
pub fn read_tail(path: &Path, max_lines: usize) -> String {
    let Ok(mut file) = File::open(path) else {
        return String::new();
    };
    let Ok(len) = file.metadata().map(|meta| meta.len()) else {
        return String::new();
    };

    let mut start = len;
    let mut window: Vec<u8> = Vec::new();
    while start > 0 && window.iter().filter(|&&b| b == b'\n').count() <= max_lines {
        let step = TAIL_CHUNK.min(start);
        start -= step;
        let mut chunk = vec![0; step as usize];
        let read = file
            .seek(SeekFrom::Start(start))
            .and_then(|_| file.read_exact(&mut chunk));
        if let Err(e) = read {
            log::debug!("cannot read {}: {}", path.display(), e);
            return String::new();
        }
        chunk.extend_from_slice(&window);
        window = chunk;
    }

    let text = String::from_utf8_lossy(&window);
    let mut lines: Vec<&str> = text.lines().collect();
    if start > 0 && !lines.is_empty() {
        // Cut mid-line.
        lines.remove(0);
    }
    let from = lines.len().saturating_sub(max_lines);
    lines[from..].join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn record_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            format_record(at, Level::Error, "boom"),
            "2024-03-09 14:05:07,000 [ERROR] boom"
        );
    }

    #[test]
    fn appends_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        RunLog::open(&path).unwrap().info("first run");
        let second = RunLog::open(&path).unwrap();
        second.warn("second run");
        drop(second);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] first run"));
        assert!(lines[1].ends_with("[WARN] second run"));
    }

    #[test]
    fn sink_is_detached_when_guard_drops() {
        let log = RunLog::disabled();
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let seen = Arc::clone(&seen);
            let _guard = log.attach(move |level, _| {
                if level == Level::Error {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            });
            assert_eq!(log.sink_count(), 1);
            log.error("counted");
            log.info("ignored by the sink");
        }
        log.error("after detach");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(log.sink_count(), 0);
    }

    #[test]
    fn tail_keeps_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let body: String = (1..=100).map(|i| format!("line {}\n", i)).collect();
        fs::write(&path, body).unwrap();

        let tail = read_tail(&path, 3);
        assert_eq!(tail, "line 98\nline 99\nline 100");
        assert_eq!(read_tail(&dir.path().join("missing.log"), 3), "");
    }

    #[test]
    fn tail_of_large_file_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let body: String = (1..=20_000).map(|i| format!("record number {}\n", i)).collect();
        fs::write(&path, &body).unwrap();

        let tail = read_tail(&path, 60);
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), 60);
        assert_eq!(lines[0], "record number 19941");
        assert_eq!(lines[59], "record number 20000");

        // No trailing newline, and more lines asked for than a chunk holds.
        fs::write(&path, body.trim_end()).unwrap();
        let tail = read_tail(&path, 1_000);
        assert_eq!(tail.lines().count(), 1_000);
        assert!(tail.starts_with("record number 19001\n"));
        assert!(tail.ends_with("record number 20000"));
    }
}
