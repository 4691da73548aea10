//! Structured logging for measurement sessions
//!
//! Entries carry a level, the emitting component, an optional correlation id
//! and sorted key/value fields. While a session runs its id is attached to
//! every entry. A logger either writes to stderr, as console lines or JSON,
//! or keeps its entries in memory for inspection.

use crate::error::AppError;
use crate::models::{Config, RunResult};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn paint(&self, text: String) -> ColoredString {
        match self {
            LogLevel::Debug => text.cyan(),
            LogLevel::Info => text.green(),
            LogLevel::Warn => text.yellow(),
            LogLevel::Error => text.red().bold(),
        }
    }

    /// Quietest level that still shows what the user asked for
    fn for_config(config: &Config) -> Self {
        if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that wrote the entry
    pub logger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// How entries are rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One human-readable line per entry
    Console,
    /// One JSON object per line, used with `--debug`
    Json,
}

#[derive(Clone)]
enum Sink {
    Stderr { format: LogFormat, use_color: bool },
    Memory(Arc<Mutex<Vec<LogEntry>>>),
}

/// Cheap to clone; clones share the sink and the session context
#[derive(Clone)]
pub struct Logger {
    name: String,
    min_level: LogLevel,
    sink: Sink,
    session_id: Arc<RwLock<Option<String>>>,
}

impl Logger {
    /// Console logger at info level
    pub fn new(name: String) -> Self {
        Self {
            name,
            min_level: LogLevel::Info,
            sink: Sink::Stderr {
                format: LogFormat::Console,
                use_color: true,
            },
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Level, format and color follow `--verbose`, `--debug` and the color setting
    pub fn with_config(name: String, config: &Config) -> Self {
        Self {
            name,
            min_level: LogLevel::for_config(config),
            sink: Sink::Stderr {
                format: if config.debug { LogFormat::Json } else { LogFormat::Console },
                use_color: config.enable_color,
            },
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Logger that records every entry in memory
    pub fn capturing(name: String) -> Self {
        Self {
            name,
            min_level: LogLevel::Debug,
            sink: Sink::Memory(Arc::new(Mutex::new(Vec::new()))),
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Same sink and context under another component name
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Entries recorded by a capturing logger; empty for stderr loggers
    pub fn captured(&self) -> Vec<LogEntry> {
        match &self.sink {
            Sink::Memory(entries) => entries.lock().map(|entries| entries.clone()).unwrap_or_default(),
            Sink::Stderr { .. } => Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub async fn set_session_id(&self, session_id: String) {
        *self.session_id.write().await = Some(session_id);
    }

    pub async fn clear_session_id(&self) {
        *self.session_id.write().await = None;
    }

    /// Log the start of an operation and return its correlation id
    pub async fn start_operation(&self, operation: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();

        self.info(&format!("Started operation: {}", operation))
            .correlation_id(&correlation_id)
            .field("operation", operation)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    pub async fn end_operation(&self, correlation_id: &str, operation: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation, success))
            .correlation_id(correlation_id)
            .field("operation", operation)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder {
            logger: self,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.to_string(),
                logger: self.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if let Some(session_id) = self.session_id.read().await.as_ref() {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }

        let line = match &self.sink {
            Sink::Memory(entries) => {
                if let Ok(mut entries) = entries.lock() {
                    entries.push(entry);
                }
                return;
            }
            Sink::Stderr { format: LogFormat::Json, .. } => render_json(&entry),
            Sink::Stderr { format: LogFormat::Console, use_color } => render_console(&entry, *use_color),
        };

        let _ = writeln!(io::stderr().lock(), "{}", line);
    }
}

fn render_console(entry: &LogEntry, use_color: bool) -> String {
    let level = format!("{:>5}", entry.level.as_str());
    let level = if use_color {
        entry.level.paint(level).to_string()
    } else {
        level
    };

    let mut line = format!(
        "{} {} {}: {}",
        entry.timestamp.format("%H:%M:%S%.3f"),
        level,
        entry.logger,
        entry.message
    );

    if let Some(correlation_id) = &entry.correlation_id {
        let short: String = correlation_id.chars().take(8).collect();
        line.push_str(&format!(" [{}]", short));
    }

    for (key, value) in &entry.fields {
        line.push_str(&format!(" {}={}", key, value));
    }

    line
}

fn render_json(entry: &LogEntry) -> String {
    serde_json::to_string(entry).unwrap_or_else(|_| {
        serde_json::json!({ "level": entry.level, "message": entry.message }).to_string()
    })
}

/// Adds fields to an entry before it is written
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl LogEntryBuilder<'_> {
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Values that fail to serialize are skipped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), value);
        }
        self
    }

    /// The four metrics of one attempt
    pub fn run_result(self, result: &RunResult) -> Self {
        self.field("download_mbps", result.download)
            .field("upload_mbps", result.upload)
            .field("ping_ms", result.ping)
            .field("jitter_ms", result.jitter)
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}
