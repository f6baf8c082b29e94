//! Structured gameplay log. Player state transitions, power-up layers, factory output, level
//! assembly and event routing each leave a category-tagged record here.
//!
//! Records live in a bounded ring owned by the `PatternLog` resource. Each record is also mirrored
//! to Bevy's tracing-backed log macros and, when a file sink is attached, appended to disk as one
//! JSON object per line. The ring drops its oldest entry once full, so memory stays flat no matter
//! how long the session runs.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;
use serde::Serialize;

pub const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogCategory {
    State,
    Decorator,
    Factory,
    Composite,
    Observer,
    Singleton,
    Info,
    Error,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::State => "STATE",
            LogCategory::Decorator => "DECORATOR",
            LogCategory::Factory => "FACTORY",
            LogCategory::Composite => "COMPOSITE",
            LogCategory::Observer => "OBSERVER",
            LogCategory::Singleton => "SINGLETON",
            LogCategory::Info => "INFO",
            LogCategory::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub category: LogCategory,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Ring of recent records plus an optional JSON-lines file sink.
#[derive(Resource)]
pub struct PatternLog {
    records: VecDeque<LogRecord>,
    capacity: usize,
    file: Option<LineWriter<File>>,
}

impl Default for PatternLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PatternLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            file: None,
        }
    }

    /// Truncates (or creates) `path` and appends every subsequent record to it.
    pub fn attach_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        self.file = Some(LineWriter::new(file));
        Ok(())
    }

    pub fn has_file_sink(&self) -> bool {
        self.file.is_some()
    }

    pub fn record(&mut self, category: LogCategory, message: impl Into<String>) {
        let record = LogRecord {
            category,
            message: message.into(),
            timestamp_ms: now_ms(),
        };

        match category {
            LogCategory::Error => error!(category = category.as_str(), "{}", record.message),
            _ => info!(category = category.as_str(), "{}", record.message),
        }

        self.write_to_file(&record);

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.back()
    }

    pub fn count(&self, category: LogCategory) -> usize {
        self.records
            .iter()
            .filter(|record| record.category == category)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn write_to_file(&mut self, record: &LogRecord) {
        let Some(writer) = self.file.as_mut() else {
            return;
        };

        let result = serde_json::to_string(record)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(writer, "{line}"));

        if let Err(err) = result {
            // Keep the in-memory ring going; a broken sink only loses the on-disk copy.
            warn!("Pattern log file sink failed ({err}); continuing without it.");
            self.file = None;
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
