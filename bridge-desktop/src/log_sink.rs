//! In-memory log sink
//!
//! Holds the most recent records for a diagnostics pane or a test to read
//! back. Older records are dropped once `capacity` is reached.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::sink::{LogLevel, LogRecord, LoggerSink};

#[derive(Debug)]
pub struct RecordingSink {
    min_level: LogLevel,
    capacity: usize,
    records: Mutex<VecDeque<LogRecord>>,
}

impl RecordingSink {
    pub const DEFAULT_CAPACITY: usize = 500;

    pub fn new(min_level: LogLevel) -> Self {
        Self::with_capacity(min_level, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(min_level: LogLevel, capacity: usize) -> Self {
        Self {
            min_level,
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of the retained records, oldest first
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Remove and return the retained records
    pub fn take(&self) -> Vec<LogRecord> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, record: LogRecord) -> Result<()> {
        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(LogLevel::Info, "core_service::session", message)
    }

    #[tokio::test]
    async fn test_keeps_newest_records() {
        let sink = RecordingSink::with_capacity(LogLevel::Debug, 2);
        sink.log(record("Opened book list")).await.unwrap();
        sink.log(record("Derived book list")).await.unwrap();
        sink.log(record("Loaded page")).await.unwrap();

        let messages: Vec<_> = sink.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["Derived book list", "Loaded page"]);
    }

    #[tokio::test]
    async fn test_take_empties_the_sink() {
        let sink = RecordingSink::default();
        sink.log(record("Opened book list")).await.unwrap();

        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
        assert_eq!(sink.min_level(), LogLevel::Info);
    }
}
