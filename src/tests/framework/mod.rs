//! Error pipeline testing framework
//!
//! Helpers for building reporters around the mock sinks in [`mock`].

use std::sync::Arc;

use crate::config::NormalizerConfig;
use crate::error::reporter::{ErrorReporter, EventSink};

pub mod mock;

pub use mock::{FailingSink, PanickingSink, RecordingSink};

/// Reporter that captures every record it emits
pub fn recording_reporter() -> (ErrorReporter, RecordingSink) {
    let sink = RecordingSink::new();
    (ErrorReporter::new(Arc::new(sink.clone())), sink)
}

/// Recording reporter with a custom configuration
pub fn recording_reporter_with(config: NormalizerConfig) -> (ErrorReporter, RecordingSink) {
    let sink = RecordingSink::new();
    (ErrorReporter::with_config(Arc::new(sink.clone()), config), sink)
}

/// Reporter around an arbitrary sink
pub fn reporter_with<S: EventSink + 'static>(sink: S) -> ErrorReporter {
    ErrorReporter::new(Arc::new(sink))
}
