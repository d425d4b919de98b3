//! Invocation-scoped logger
//!
//! A `Logger` is created by whoever starts a pipeline invocation and is
//! handed to every component by reference. Each record can go to a log
//! file, to an in-memory buffer and to the `log` facade.

use std::fs::OpenOptions;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use log::Level;

/// One captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Logger with file, memory and facade sinks
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Captured records, when capturing is enabled
    records: Mutex<Option<Vec<LogEntry>>>,
    /// Whether records are also sent to the `log` facade
    forward: bool,
}

impl Logger {
    /// Creates a logger appending to `log_file` and forwarding to the facade
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file, created if missing
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be opened
    pub fn new(log_file: &str) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            records: Mutex::new(None),
            forward: true,
        })
    }

    /// Logger that only forwards to the `log` facade
    pub fn console() -> Self {
        Logger {
            file: Mutex::new(None),
            records: Mutex::new(None),
            forward: true,
        }
    }

    /// Logger that keeps every record in memory, for inspection in tests
    pub fn capturing() -> Self {
        Logger {
            file: Mutex::new(None),
            records: Mutex::new(Some(Vec::new())),
            forward: false,
        }
    }

    /// Records a message at the given level
    pub fn log(&self, level: Level, message: &str) {
        if self.forward {
            log::log!(level, "{}", message);
        }

        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let line = format!("{} [{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), level, message);
                // A failing log file must never abort the pipeline
                let _ = writeln!(file, "{}", line).and_then(|_| file.flush());
            }
        }

        if let Ok(mut guard) = self.records.lock() {
            if let Some(records) = guard.as_mut() {
                records.push(LogEntry { level, message: message.to_string() });
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    /// Snapshot of the captured records (empty unless capturing)
    pub fn entries(&self) -> Vec<LogEntry> {
        self.records.lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Captured messages at one level
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries().into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}
