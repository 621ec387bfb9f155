//! Error reporting through a pluggable event sink
//!
//! The reporter turns a [`ClassifiedError`] into one structured log record and
//! hands back the boundary-safe [`PublicErrorView`]. Emission is best-effort: a
//! sink that fails or panics is noted and otherwise ignored.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::NormalizerConfig;
use crate::error::{ClassifiedError, Details, PublicErrorView};
use crate::logging::correlation::get_correlation_id;
use crate::logging::{self, LogLevel};

/// Errors a sink may raise while recording
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for leveled structured events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Record one event
    async fn record(&self, level: LogLevel, message: &str, fields: &Details) -> Result<(), SinkError>;

    /// Get the name of the sink
    fn name(&self) -> &str;
}

/// Sink that emits records through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn record(&self, level: LogLevel, message: &str, fields: &Details) -> Result<(), SinkError> {
        logging::log_with_fields(level, message, fields);
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

/// One structured log record for a reported error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: Details,
}

impl LogRecord {
    /// Build the record for an error reported under `context`
    pub fn for_error(error: &ClassifiedError, context: &str, capture_location: bool) -> Self {
        let mut fields = Details::new();
        fields.insert("context".to_string(), Value::from(context));
        fields.insert("kind".to_string(), Value::from(error.kind().name()));
        fields.insert("message".to_string(), Value::from(error.message()));
        fields.insert("errorCode".to_string(), Value::from(error.error_code()));
        fields.insert("statusCode".to_string(), Value::from(error.status_code()));
        fields.insert("details".to_string(), Value::Object(error.details().clone()));
        fields.insert("traceId".to_string(), Value::from(error.trace_id().to_string()));

        if capture_location {
            if let Some(location) = error.location() {
                fields.insert("location".to_string(), Value::from(location));
            }
        }

        if let Some(correlation_id) = get_correlation_id() {
            fields.insert("correlationId".to_string(), Value::from(correlation_id));
        }

        let occurred_at = serde_json::to_value(Utc::now()).unwrap_or(Value::Null);
        fields.insert("occurredAt".to_string(), occurred_at);

        Self {
            level: LogLevel::Error,
            message: format!("[{}] Error: {}", context, error.message()),
            fields,
        }
    }
}

/// Reports classified errors to an event sink
#[derive(Clone)]
pub struct ErrorReporter {
    sink: Arc<dyn EventSink>,
    config: Arc<NormalizerConfig>,
}

impl ErrorReporter {
    /// Create a reporter with default configuration
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_config(sink, NormalizerConfig::default())
    }

    /// Create a reporter with explicit configuration
    pub fn with_config(sink: Arc<dyn EventSink>, config: NormalizerConfig) -> Self {
        Self {
            sink,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Log a classified error once and return its public view.
    ///
    /// An empty `context` falls back to the configured default context.
    pub async fn report(&self, error: &ClassifiedError, context: &str) -> PublicErrorView {
        let context = context_or(context, &self.config.default_context);
        let record = LogRecord::for_error(error, context, self.config.capture_location);
        self.emit(&record).await;
        error.to_public_view()
    }

    /// Hand one record to the sink without letting it fail the caller
    async fn emit(&self, record: &LogRecord) {
        let outcome = AssertUnwindSafe(async {
            self.sink.record(record.level, &record.message, &record.fields).await
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    sink = %self.sink.name(),
                    error = %e,
                    "Failed to record error report"
                );
            }
            Err(_) => {
                tracing::warn!(sink = %self.sink.name(), "Event sink panicked while recording error report");
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("sink", &self.sink.name())
            .field("config", &self.config)
            .finish()
    }
}

pub(crate) fn context_or<'a>(context: &'a str, fallback: &'a str) -> &'a str {
    if context.is_empty() { fallback } else { context }
}

/// Raised when the default reporter is installed twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Default error reporter already initialized")]
pub struct ReporterInitError;

/// Default error reporter instance
static DEFAULT_REPORTER: OnceLock<ErrorReporter> = OnceLock::new();

/// Install the process-wide default reporter
pub fn init_default_reporter(reporter: ErrorReporter) -> Result<(), ReporterInitError> {
    DEFAULT_REPORTER.set(reporter).map_err(|_| ReporterInitError)?;
    tracing::debug!(sink = %default_reporter().sink_name(), "Installed default error reporter");
    Ok(())
}

/// Get the default reporter, falling back to a tracing-backed one
pub fn default_reporter() -> &'static ErrorReporter {
    DEFAULT_REPORTER.get_or_init(ErrorReporter::default)
}

/// Report an error using the default reporter
pub async fn report(error: &ClassifiedError, context: &str) -> PublicErrorView {
    default_reporter().report(error, context).await
}

/// Extension trait for reporting errors through the default reporter
pub trait ErrorReportExt {
    /// Report this error using the default reporter
    async fn report(&self, context: &str) -> PublicErrorView;

    /// Get the user-facing sentence for this error
    fn user_message(&self) -> &'static str;
}

impl ErrorReportExt for ClassifiedError {
    async fn report(&self, context: &str) -> PublicErrorView {
        report(self, context).await
    }

    fn user_message(&self) -> &'static str {
        crate::error::messages::resolve_user_message(self.error_code())
    }
}
