//! Tests for error reporting
//!
//! This module checks the log record the reporter emits and that a failing sink
//! never reaches the caller.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use crate::config::NormalizerConfig;
    use crate::error::ClassifiedError;
    use crate::error::reporter::{ErrorReportExt, report};
    use crate::logging::LogLevel;
    use crate::logging::correlation::with_correlation_id;
    use crate::tests::framework::{
        FailingSink, PanickingSink, recording_reporter, recording_reporter_with, reporter_with,
    };

    #[tokio::test]
    async fn test_report_emits_one_record() {
        let (reporter, sink) = recording_reporter();
        let error = ClassifiedError::not_found("User not found").with_detail("userId", 42);

        let view = reporter.report(&error, "LoadProfile").await;

        assert_eq!(view, error.to_public_view());

        let record = sink.single();
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "[LoadProfile] Error: User not found");
        assert_eq!(record.fields["context"], json!("LoadProfile"));
        assert_eq!(record.fields["kind"], json!("NOT_FOUND"));
        assert_eq!(record.fields["message"], json!("User not found"));
        assert_eq!(record.fields["errorCode"], json!("NOT_FOUND"));
        assert_eq!(record.fields["statusCode"], json!(404));
        assert_eq!(record.fields["details"], json!({ "userId": 42 }));
        assert_eq!(record.fields["traceId"], json!(error.trace_id().to_string()));
        assert!(record.fields["location"].as_str().unwrap().contains("reporter_tests.rs"));
        let occurred_at: DateTime<Utc> = serde_json::from_value(record.fields["occurredAt"].clone()).unwrap();
        assert!(occurred_at <= Utc::now());
        assert!(!record.fields.contains_key("correlationId"));
    }

    #[tokio::test]
    async fn test_empty_context_uses_default() {
        let (reporter, sink) = recording_reporter();
        reporter.report(&ClassifiedError::conflict("dup"), "").await;

        let record = sink.single();
        assert_eq!(record.fields["context"], json!("Application"));
        assert_eq!(record.message, "[Application] Error: dup");
    }

    #[tokio::test]
    async fn test_location_capture_can_be_disabled() {
        let config = NormalizerConfig {
            capture_location: false,
            ..NormalizerConfig::default()
        };
        let (reporter, sink) = recording_reporter_with(config);
        reporter.report(&ClassifiedError::conflict("dup"), "Signup").await;

        assert!(!sink.single().fields.contains_key("location"));
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let reporter = reporter_with(FailingSink);
        let error = ClassifiedError::timeout("slow");

        let view = reporter.report(&error, "Sync").await;
        assert_eq!(view.status_code, 408);
        assert_eq!(view.error_code, "TIMEOUT_ERROR");
    }

    #[tokio::test]
    async fn test_panicking_sink_is_swallowed() {
        let reporter = reporter_with(PanickingSink);
        let error = ClassifiedError::forbidden("no");

        let view = reporter.report(&error, "Admin").await;
        assert_eq!(view, error.to_public_view());
    }

    #[tokio::test]
    async fn test_correlation_id_is_recorded() {
        let (reporter, sink) = recording_reporter();

        with_correlation_id("request-7", async {
            reporter.report(&ClassifiedError::validation("bad"), "Form").await;
        })
        .await;

        assert_eq!(sink.single().fields["correlationId"], json!("request-7"));
    }

    #[tokio::test]
    async fn test_report_does_not_reclassify() {
        let (reporter, _sink) = recording_reporter();
        let error = ClassifiedError::api("upstream said no", 418, "TEAPOT");

        let view = reporter.report(&error, "Brew").await;
        assert_eq!(view.status_code, 418);
        assert_eq!(view.error_code, "TEAPOT");
        assert_eq!(view.message, "upstream said no");
    }

    #[tokio::test]
    async fn test_default_reporter() {
        let error = ClassifiedError::unauthorized("log in");

        let view = report(&error, "Session").await;
        assert_eq!(view.error_code, "UNAUTHORIZED");

        let view = error.report("Session").await;
        assert_eq!(view.status_code, 401);
        assert_eq!(
            error.user_message(),
            "You are not authorized to perform this action. Please log in."
        );
    }
}
