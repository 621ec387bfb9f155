//! Event sink mocks
//!
//! Sinks that capture, reject or panic on records so tests can observe what the
//! reporter emits and how it copes with a misbehaving collaborator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Details;
use crate::error::reporter::{EventSink, LogRecord, SinkError};
use crate::logging::LogLevel;

/// Sink that keeps every record it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records captured so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The only record captured; panics unless exactly one exists
    pub fn single(&self) -> LogRecord {
        let records = self.records();
        assert_eq!(records.len(), 1, "expected exactly one record, got {records:?}");
        records.into_iter().next().unwrap()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn record(&self, level: LogLevel, message: &str, fields: &Details) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(LogRecord {
            level,
            message: message.to_string(),
            fields: fields.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Sink that rejects every record
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn record(&self, _level: LogLevel, _message: &str, _fields: &Details) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("sink offline".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sink that panics while recording
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingSink;

#[async_trait]
impl EventSink for PanickingSink {
    async fn record(&self, _level: LogLevel, _message: &str, _fields: &Details) -> Result<(), SinkError> {
        panic!("sink exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
