//! Rolling Logger
//!
//! Process-wide logging for the app:
//! - a size-rotated log file (`<app>.log`, `<app>.log.1`, ...)
//! - an in-memory circular buffer of the most recent lines
//! - stderr output while developing
//!
//! `log` records are bridged into the same subscriber, so library code can
//! use either facade.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// Rotation and buffer limits
#[derive(Debug, Clone, Copy)]
pub struct RollingConfig {
    /// Rotate once the active file would grow past this size
    pub max_file_bytes: u64,
    /// Rotated files kept besides the active one
    pub max_files: usize,
    /// Lines kept in the in-memory ring
    pub ring_capacity: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 3,
            ring_capacity: 500,
        }
    }
}

struct Inner {
    dir: PathBuf,
    base_name: String,
    file: Option<File>,
    written: u64,
    ring: VecDeque<String>,
    partial: String,
    config: RollingConfig,
}

impl Inner {
    fn active_path(&self) -> PathBuf {
        self.dir.join(&self.base_name)
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base_name, n))
    }

    fn open_active(&mut self) -> io::Result<()> {
        let path = self.active_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    /// Shift `<app>.log.N` -> `<app>.log.N+1`, dropping the oldest
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        if self.config.max_files == 0 {
            let _ = fs::remove_file(self.active_path());
            return self.open_active();
        }

        let oldest = self.rotated_path(self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.config.max_files).rev() {
            let from = self.rotated_path(n);
            if from.exists() {
                fs::rename(&from, self.rotated_path(n + 1))?;
            }
        }
        let active = self.active_path();
        if active.exists() {
            fs::rename(&active, self.rotated_path(1))?;
        }
        self.open_active()
    }

    fn push_ring(&mut self, line: String) {
        if self.config.ring_capacity == 0 {
            return;
        }
        while self.ring.len() >= self.config.ring_capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(line);
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        let len = buf.len() as u64;
        if self.written > 0 && self.written + len > self.config.max_file_bytes {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.open_active()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
            self.written += len;
        }

        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.push_ring(line.trim_end().to_string());
        }
        Ok(())
    }
}

/// Rolling file writer plus ring buffer, cheap to clone
#[derive(Clone)]
pub struct RollingLogger {
    inner: Arc<Mutex<Inner>>,
}

impl RollingLogger {
    /// Open (or create) `<log_dir>/<app_name>.log`
    pub fn new(log_dir: impl Into<PathBuf>, app_name: &str, config: RollingConfig) -> Result<Self, String> {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create log dir: {}", e))?;

        let mut inner = Inner {
            dir,
            base_name: format!("{}.log", app_name),
            file: None,
            written: 0,
            ring: VecDeque::with_capacity(config.ring_capacity.min(1024)),
            partial: String::new(),
            config,
        };
        inner
            .open_active()
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    /// Append one line (a trailing newline is added)
    pub fn write_line(&self, line: &str) -> Result<(), String> {
        let mut buf = line.to_string();
        buf.push('\n');
        let mut inner = self.inner.lock().map_err(|_| "logger poisoned".to_string())?;
        inner.write_bytes(buf.as_bytes()).map_err(|e| e.to_string())
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => inner.ring.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Path of the file currently written to
    pub fn log_path(&self) -> PathBuf {
        match self.inner.lock() {
            Ok(inner) => inner.active_path(),
            Err(poisoned) => poisoned.into_inner().active_path(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        match self.inner.lock() {
            Ok(inner) => inner.dir.clone(),
            Err(poisoned) => poisoned.into_inner().dir.clone(),
        }
    }
}

/// Writer handed to the fmt layer for each event
pub struct RollingWriter {
    inner: Arc<Mutex<Inner>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "logger poisoned"))?;
        inner.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "logger poisoned"))?;
        match inner.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingLogger {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            inner: self.inner.clone(),
        }
    }
}

/// Local wall-clock timestamps, millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

static GLOBAL: OnceLock<RollingLogger> = OnceLock::new();

/// Initialize the global logger with default limits
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, RollingConfig::default())
}

/// Initialize the global logger. A second call is an error.
pub fn init_logger_with(log_dir: impl AsRef<Path>, app_name: &str, config: RollingConfig) -> Result<(), String> {
    if GLOBAL.get().is_some() {
        return Err("Logger already initialized".to_string());
    }

    let logger = RollingLogger::new(log_dir.as_ref(), app_name, config)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(logger.clone())
        .with_ansi(false)
        .with_timer(LocalTime);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_timer(LocalTime);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer);

    #[cfg(not(target_os = "android"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        subscriber
            .try_init()
            .map_err(|e| format!("Failed to install subscriber: {}", e))?;
    }

    #[cfg(target_os = "android")]
    {
        // logcat gets `log` records; tracing events go to the file
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Info)
                .with_tag(app_name),
        );
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| format!("Failed to install subscriber: {}", e))?;
    }

    GLOBAL
        .set(logger)
        .map_err(|_| "Logger already initialized".to_string())?;

    tracing::info!(app = app_name, "logger initialized");
    Ok(())
}

/// Whether `init_logger` has run in this process
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

pub fn info(msg: &str) -> Result<(), String> {
    if !is_initialized() {
        return Err("Logger not initialized".to_string());
    }
    tracing::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    if !is_initialized() {
        return Err("Logger not initialized".to_string());
    }
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent lines from the global logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    GLOBAL.get().map(|l| l.recent_lines()).unwrap_or_default()
}
