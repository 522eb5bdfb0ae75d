//! Asynchronous logging for the TubeGrab application
//!
//! Records from the `log` facade are handed to a writer thread that owns the
//! log file, so the UI thread never waits on disk I/O. When the log file
//! cannot be opened, `env_logger` takes over and writes to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::config::APP_DIR_NAME;
use crate::error::AppError;

/// Entries buffered by the writer thread before a forced flush
const FLUSH_BATCH: usize = 10;

/// Asynchronous logger that writes to file without blocking the caller
pub struct AsyncLogger {
    sender: mpsc::Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<()>>,
}

/// Messages understood by the writer thread
pub enum LogMessage {
    Entry { level: Level, target: String, text: String },
    Shutdown,
}

impl AsyncLogger {
    /// Open (or create) the log file and start the writer thread
    pub fn new() -> Result<Self, AppError> {
        let log_path = Self::log_path()?;
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let (tx, rx) = mpsc::channel::<LogMessage>();
        let handle = std::thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = std::io::BufWriter::new(log_file);
                let mut pending = 0usize;

                // Block for the first message, then drain whatever queued up behind it
                while let Ok(first) = rx.recv() {
                    let mut next = Some(first);
                    while let Some(msg) = next.take() {
                        match msg {
                            LogMessage::Shutdown => {
                                let _ = file.flush();
                                return;
                            }
                            LogMessage::Entry { level, target, text } => {
                                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                                let _ = writeln!(file, "[{} {} {}] {}", level, timestamp, target, text);
                                pending += 1;
                            }
                        }
                        if pending >= FLUSH_BATCH {
                            let _ = file.flush();
                            pending = 0;
                        }
                        next = rx.try_recv().ok();
                    }
                    let _ = file.flush();
                    pending = 0;
                }
            })?;

        Ok(AsyncLogger {
            sender: tx,
            handle: Some(handle),
        })
    }

    /// Platform location of the log file, creating its directory
    fn log_path() -> Result<PathBuf, AppError> {
        #[cfg(windows)]
        {
            let exe_path = std::env::current_exe()?;
            let exe_dir = exe_path.parent().ok_or_else(|| {
                AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "Failed to get executable directory"))
            })?;
            Ok(exe_dir.join("tubegrab_log.txt"))
        }

        #[cfg(not(windows))]
        {
            let app_dir = match xdg::BaseDirectories::new() {
                Ok(xdg_dirs) => xdg_dirs.get_cache_home().join(APP_DIR_NAME),
                Err(_) => {
                    let home_dir = dirs::home_dir().ok_or_else(|| {
                        AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "Failed to get home directory"))
                    })?;
                    home_dir.join(format!(".{}", APP_DIR_NAME))
                }
            };
            std::fs::create_dir_all(&app_dir)?;
            Ok(app_dir.join(format!("{}.log", APP_DIR_NAME)))
        }
    }

    /// Queue a record; dropped silently if the writer has gone away
    pub fn log(&self, level: Level, target: &str, text: String) {
        let _ = self.sender.send(LogMessage::Entry {
            level,
            target: target.to_string(),
            text,
        });
    }

    /// Flush pending records and join the writer thread
    pub fn shutdown(mut self) {
        let _ = self.sender.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// Global logger instance
static LOGGER: Mutex<Option<AsyncLogger>> = Mutex::new(None);

/// `log` facade adapter forwarding to the global [`AsyncLogger`]
struct FileLog;

static FILE_LOG: FileLog = FileLog;

impl Log for FileLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Our own crate logs at debug, dependencies only when something is wrong
        if metadata.target().starts_with(APP_DIR_NAME) {
            metadata.level() <= Level::Debug
        } else {
            metadata.level() <= Level::Warn
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(guard) = LOGGER.lock() {
            if let Some(logger) = &*guard {
                logger.log(record.level(), record.target(), record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

/// Initialize the global logging system
///
/// Prefers the file logger; falls back to `env_logger` on stderr. Calling it
/// twice keeps the first installation.
pub fn setup_logging() -> Result<(), AppError> {
    match AsyncLogger::new() {
        Ok(logger) => {
            if let Ok(mut guard) = LOGGER.lock() {
                *guard = Some(logger);
            }
            if log::set_logger(&FILE_LOG).is_ok() {
                log::set_max_level(LevelFilter::Debug);
            }
            Ok(())
        }
        Err(e) => {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(format!("{}=info", APP_DIR_NAME)),
            )
            .try_init();
            log::warn!("File logging unavailable, using stderr: {}", e);
            Err(e)
        }
    }
}

/// Shut the file logger down, flushing everything written so far
pub fn shutdown_logging() {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(logger) = guard.take() {
            logger.shutdown();
        }
    }
}
