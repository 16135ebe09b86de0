// Session-based logging with automatic rotation.
// Buffered in memory and written on exit, or streamed through tracing with --stream-logs.
use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

pub struct SessionLogger {
    log_buffer: Mutex<Vec<String>>,
    log_path: PathBuf,
    log_dir: PathBuf,
    retention_count: usize,
    app_name: String,
    stream: bool,
}

impl SessionLogger {
    pub fn new(log_dir: PathBuf, app_name: &str, retention_count: usize, stream: bool) -> Result<Self> {
        fs::create_dir_all(&log_dir)?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("{}_{}.log", app_name, timestamp);
        let log_path = log_dir.join(&log_filename);

        let logger = Self {
            log_buffer: Mutex::new(Vec::new()),
            log_path,
            log_dir,
            retention_count,
            app_name: app_name.to_string(),
            stream,
        };

        logger.clean_old_logs()?;
        logger.log(LogLevel::Info, format!("=== {} Session Started ===", app_name));

        Ok(logger)
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let log_line = match level {
            LogLevel::Info => format!("[{}] {}", timestamp, message),
            LogLevel::Warn => format!("[{}] WARN: {}", timestamp, message),
            LogLevel::Error => format!("[{}] ERROR: {}", timestamp, message),
        };

        if self.stream {
            match level {
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            }
            let _ = self.write_line_to_file(&log_line);
        } else {
            self.log_buffer.lock().push(log_line);
        }
    }

    fn write_line_to_file(&self, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    fn clean_old_logs(&self) -> Result<()> {
        let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        let prefix = format!("{}_", self.app_name);

        if let Ok(entries) = fs::read_dir(&self.log_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("log") {
                    continue;
                }
                let matches_prefix = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix));
                if !matches_prefix {
                    continue;
                }
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    log_files.push((path, modified));
                }
            }
        }

        // Newest first; the session about to start takes one retention slot.
        log_files.sort_by(|a, b| b.1.cmp(&a.1));
        let keep = self.retention_count.saturating_sub(1);
        for (path, _) in log_files.iter().skip(keep) {
            let _ = fs::remove_file(path);
        }

        Ok(())
    }

    pub fn flush_to_disk(&self) -> Result<()> {
        let mut buffer = self.log_buffer.lock();
        if buffer.is_empty() {
            return Ok(());
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        for line in buffer.iter() {
            writeln!(file, "{}", line)?;
        }

        file.flush()?;
        buffer.clear();
        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        self.log(LogLevel::Info, format!("=== {} Session Ended ===", self.app_name));
        self.flush_to_disk()
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    #[cfg(test)]
    fn buffered_lines(&self) -> Vec<String> {
        self.log_buffer.lock().clone()
    }
}

static LOGGER: once_cell::sync::OnceCell<SessionLogger> = once_cell::sync::OnceCell::new();

pub fn init_logger(log_dir: PathBuf, app_name: &str, retention_count: usize, stream: bool) -> Result<()> {
    if stream {
        let _ = tracing_subscriber::fmt().with_target(false).try_init();
    }
    let logger = SessionLogger::new(log_dir, app_name, retention_count, stream)?;
    LOGGER.set(logger).map_err(|_| anyhow::anyhow!("Logger already initialized"))?;
    Ok(())
}

pub fn log_at(level: LogLevel, message: impl AsRef<str>) {
    if let Some(logger) = LOGGER.get() {
        logger.log(level, message);
    }
}

pub fn log_info(message: impl AsRef<str>) {
    log_at(LogLevel::Info, message);
}

pub fn log_warn(message: impl AsRef<str>) {
    log_at(LogLevel::Warn, message);
}

pub fn log_error(message: impl AsRef<str>) {
    log_at(LogLevel::Error, message);
}

pub fn finalize_logs() -> Result<()> {
    if let Some(logger) = LOGGER.get() {
        logger.finalize()?;
    }
    Ok(())
}

pub fn get_log_path() -> Option<PathBuf> {
    LOGGER.get().map(|logger| logger.log_path.clone())
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log_info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log_warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log_error(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_lines_carry_level_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let logger = SessionLogger::new(dir.path().to_path_buf(), "test", 5, false).unwrap();
        logger.log(LogLevel::Warn, "display missing");
        logger.log(LogLevel::Error, "write failed");

        let lines = logger.buffered_lines();
        assert!(lines[0].ends_with("=== test Session Started ==="));
        assert!(lines[1].ends_with("WARN: display missing"));
        assert!(lines[2].ends_with("ERROR: write failed"));
    }

    #[test]
    fn test_flush_writes_buffer_to_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = SessionLogger::new(dir.path().to_path_buf(), "test", 5, false).unwrap();
        logger.log(LogLevel::Info, "hello");
        logger.flush_to_disk().unwrap();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("hello"));
        assert!(logger.buffered_lines().is_empty());
    }

    #[test]
    fn test_old_logs_are_rotated() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..6 {
            fs::write(dir.path().join(format!("test_2020010{}_000000.log", i)), "old").unwrap();
        }
        fs::write(dir.path().join("other_20200101_000000.log"), "keep").unwrap();

        let _logger = SessionLogger::new(dir.path().to_path_buf(), "test", 3, false).unwrap();

        let remaining = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("test_"))
            .count();
        assert_eq!(remaining, 2);
        assert!(dir.path().join("other_20200101_000000.log").exists());
    }
}
