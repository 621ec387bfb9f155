//! Structured logging for error records
//!
//! This module owns the tracing subscriber setup and the runtime-level dispatch
//! used by the default event sink. Correlation ids live in [`correlation`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, prelude::*};

use crate::error::Details;

pub mod correlation;

/// Log levels accepted by event sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level for very detailed debugging
    Trace,
    /// Debug level for development information
    Debug,
    /// Info level for general operational information
    Info,
    /// Warn level for concerning but non-critical issues
    Warn,
    /// Error level for errors that affect functionality
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Keys the reporter puts on every error record
const RECORD_KEYS: [&str; 10] = [
    "context",
    "kind",
    "message",
    "errorCode",
    "statusCode",
    "details",
    "traceId",
    "correlationId",
    "location",
    "occurredAt",
];

/// Install the global subscriber, filtered by `RUST_LOG`
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_line_number(true)
                .with_file(true),
        )
        .try_init()
}

/// Emit a message with structured record fields at a runtime-chosen level
pub fn log_with_fields(level: LogLevel, message: &str, fields: &Details) {
    let context = field_str(fields, "context").unwrap_or("none");
    let kind = field_str(fields, "kind").unwrap_or("unknown");
    let error_code = field_str(fields, "errorCode").unwrap_or("unknown");
    let status_code = fields.get("statusCode").and_then(Value::as_u64).unwrap_or_default();
    let trace_id = field_str(fields, "traceId").unwrap_or("none");
    let correlation_id = field_str(fields, "correlationId").unwrap_or("none");
    let location = field_str(fields, "location").unwrap_or("unknown");
    let occurred_at = field_str(fields, "occurredAt").unwrap_or("unknown");
    let details = fields.get("details").map(Value::to_string).unwrap_or_default();
    let extra = extra_fields(fields);

    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                context = %context,
                kind = %kind,
                error_code = %error_code,
                status_code,
                trace_id = %trace_id,
                correlation_id = %correlation_id,
                location = %location,
                occurred_at = %occurred_at,
                details = %details,
                extra = %extra,
                "{}",
                message
            )
        };
    }

    match level {
        LogLevel::Trace => emit!(Level::TRACE),
        LogLevel::Debug => emit!(Level::DEBUG),
        LogLevel::Info => emit!(Level::INFO),
        LogLevel::Warn => emit!(Level::WARN),
        LogLevel::Error => emit!(Level::ERROR),
    }
}

fn field_str<'a>(fields: &'a Details, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

// Anything a custom caller added beyond the standard record keys.
fn extra_fields(fields: &Details) -> Value {
    let extra: Details = fields
        .iter()
        .filter(|(key, _)| !RECORD_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(extra)
}
