use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Number of entries the global logger keeps
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Log level enum for type-safe logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// A single recorded log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Subsystem that produced the entry, e.g. "pipeline" or "manager"
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

/// Fixed-size ring of log entries
struct RingBuffer {
    buffer: Vec<LogEntry>,
    head: usize,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    fn push(&mut self, item: LogEntry) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    fn to_vec(&self) -> Vec<LogEntry> {
        // Oldest first
        let mut result = Vec::with_capacity(self.buffer.len());
        result.extend_from_slice(&self.buffer[self.head..]);
        result.extend_from_slice(&self.buffer[..self.head]);
        result
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.head = 0;
    }
}

enum LogCommand {
    Log(LogEntry),
    Snapshot(Sender<Vec<LogEntry>>),
    Clear,
}

/// Buffered logger backed by a worker thread
///
/// `log` never blocks: entries are handed to the worker over a bounded channel
/// and dropped when the channel is full.
pub struct Logger {
    sender: Sender<LogCommand>,
    min_level: Arc<AtomicU8>,
}

impl Logger {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        let min_level = Arc::new(AtomicU8::new(LogLevel::Debug as u8));

        std::thread::spawn(move || {
            Self::worker(receiver, capacity);
        });

        Self { sender, min_level }
    }

    fn worker(receiver: Receiver<LogCommand>, capacity: usize) {
        let mut buffer = RingBuffer::new(capacity);

        for cmd in receiver {
            match cmd {
                LogCommand::Log(entry) => buffer.push(entry),
                LogCommand::Snapshot(reply) => {
                    let _ = reply.send(buffer.to_vec());
                }
                LogCommand::Clear => buffer.clear(),
            }
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        (level as u8) >= self.min_level.load(Ordering::Relaxed)
    }

    pub fn log(&self, level: LogLevel, message: &str, target: &str) {
        self.record(level, message, target, None);
    }

    /// Log with structured context
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: &str,
        target: &str,
        context: Map<String, Value>,
    ) {
        self.record(level, message, target, Some(context));
    }

    fn record(
        &self,
        level: LogLevel,
        message: &str,
        target: &str,
        context: Option<Map<String, Value>>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            target: target.to_string(),
            context,
        };

        let _ = self.sender.try_send(LogCommand::Log(entry));
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    /// Entries currently held, oldest first
    pub fn recent(&self) -> Vec<LogEntry> {
        let (reply_tx, reply_rx) = bounded(1);
        if self.sender.send(LogCommand::Snapshot(reply_tx)).is_ok() {
            reply_rx.recv().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    pub fn clear(&self) {
        let _ = self.sender.send(LogCommand::Clear);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

// Global logger instance
lazy_static::lazy_static! {
    pub static ref LOGGER: Logger = Logger::default();
}

/// Record into the global buffer and forward to the `log` facade
#[macro_export]
macro_rules! nexus_log {
    ($level:expr, $target:expr, $($arg:tt)*) => {
        {
            let level: $crate::logger::LogLevel = $level;
            let message = format!($($arg)*);
            $crate::logger::LOGGER.log(level, &message, $target);
            match level {
                $crate::logger::LogLevel::Error => $crate::log::error!(target: $target, "{}", message),
                $crate::logger::LogLevel::Warn => $crate::log::warn!(target: $target, "{}", message),
                $crate::logger::LogLevel::Info => $crate::log::info!(target: $target, "{}", message),
                $crate::logger::LogLevel::Debug => $crate::log::debug!(target: $target, "{}", message),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: message.to_string(),
            target: "test".to_string(),
            context: None,
        }
    }

    #[test]
    fn test_ring_buffer_wraps_in_order() {
        let mut ring = RingBuffer::new(3);
        for i in 0..5 {
            ring.push(entry(&format!("m{}", i)));
        }

        let messages: Vec<String> = ring.to_vec().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["m2", "m3", "m4"]);

        ring.clear();
        assert!(ring.to_vec().is_empty());
    }

    #[test]
    fn test_logger_records_and_filters() {
        let logger = Logger::new(10);
        logger.set_min_level(LogLevel::Warn);
        assert_eq!(logger.min_level(), LogLevel::Warn);

        logger.log(LogLevel::Info, "dropped", "test");
        logger.log(LogLevel::Error, "kept", "test");

        let logs = logger.recent();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "kept");
        assert_eq!(logs[0].level, LogLevel::Error);
    }

    #[test]
    fn test_logger_context_and_clear() {
        let logger = Logger::new(10);
        let mut context = Map::new();
        context.insert("pipeline".to_string(), Value::from("A"));
        logger.log_with_context(LogLevel::Info, "with context", "test", context);

        let logs = logger.recent();
        assert_eq!(
            logs[0].context.as_ref().and_then(|c| c.get("pipeline")),
            Some(&Value::from("A"))
        );

        logger.clear();
        assert!(logger.recent().is_empty());
    }

    #[test]
    fn test_macro_records_into_global_logger() {
        crate::nexus_log!(LogLevel::Error, "logger-test", "macro entry {}", 42);

        let found = LOGGER
            .recent()
            .into_iter()
            .any(|e| e.target == "logger-test" && e.message == "macro entry 42");
        assert!(found);
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"warn\"");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
    }
}
