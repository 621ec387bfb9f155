//! Tests for operation wrapping
//!
//! This module checks that wrapped operations pass successes through silently
//! and turn failures into exactly one report plus a public view.

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{Value, json};

    use crate::error::ClassifiedError;
    use crate::error::wrapper::{guard, wrap};
    use crate::logging::correlation::with_correlation_id;
    use crate::tests::framework::recording_reporter;

    #[tokio::test]
    async fn test_success_passes_through_without_logging() {
        let (reporter, sink) = recording_reporter();
        let double = reporter.wrap(|n: u32| async move { Ok::<_, Value>(n * 2) }, "Double");

        assert_eq!(double.call(21).await, Ok(42));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_reported_once() {
        let (reporter, sink) = recording_reporter();
        let fetch = reporter.wrap(
            |_: ()| async { Err::<(), _>(json!({ "code": "ETIMEDOUT" })) },
            "FetchUser",
        );

        let view = fetch.call(()).await.unwrap_err();

        assert_eq!(view.status_code, 408);
        assert_eq!(view.error_code, "TIMEOUT_ERROR");
        assert_eq!(view.message, "Request timed out");

        let record = sink.single();
        assert_eq!(record.fields["context"], json!("FetchUser"));
        assert!(record.fields["location"].as_str().unwrap().contains("wrapper_tests.rs"));
    }

    #[tokio::test]
    async fn test_each_call_reports_its_own_failure() {
        let (reporter, sink) = recording_reporter();
        let fail = reporter.wrap(|_: ()| async { Err::<(), _>("Transaction failed".to_string()) }, "Send");

        assert!(fail.call(()).await.is_err());
        assert!(fail.call(()).await.is_err());
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_deliberate_errors_keep_their_kind() {
        let (reporter, sink) = recording_reporter();
        let lookup = reporter.wrap(
            |(table, id): (&'static str, u64)| async move {
                Err::<(), _>(ClassifiedError::not_found(format!("{table} {id} not found")))
            },
            "Lookup",
        );

        let view = lookup.call(("users", 9)).await.unwrap_err();

        assert_eq!(view.status_code, 404);
        assert_eq!(view.error_code, "NOT_FOUND");
        assert_eq!(view.message, "users 9 not found");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_operation_runs_before_reporting() {
        let (reporter, sink) = recording_reporter();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let observed = sink.clone();

        let op = reporter.wrap(
            move |_: ()| {
                let counter = counter.clone();
                let observed = observed.clone();
                async move {
                    tokio::task::yield_now().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert!(observed.is_empty());
                    Err::<(), _>(io::Error::other("disk full"))
                }
            },
            "Persist",
        );

        let view = op.call(()).await.unwrap_err();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(view.error_code, "UNEXPECTED_ERROR");
        assert_eq!(view.message, "disk full");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_context_uses_wrap_default() {
        let (reporter, sink) = recording_reporter();
        let op = reporter.wrap(|_: ()| async { Err::<(), _>("boom") }, "");

        assert_eq!(op.context(), "AsyncOperation");
        let _ = op.call(()).await;
        assert_eq!(sink.single().fields["context"], json!("AsyncOperation"));
    }

    #[tokio::test]
    async fn test_correlated_calls_share_an_id() {
        let (reporter, sink) = recording_reporter();
        let op = reporter
            .wrap(|_: ()| async { Err::<(), _>("boom") }, "Correlated")
            .correlated();

        let _ = op.call(()).await;
        let record = sink.single();
        assert!(record.fields["correlationId"].is_string());

        let (reporter, sink) = recording_reporter();
        let op = reporter
            .wrap(|_: ()| async { Err::<(), _>("boom") }, "Correlated")
            .correlated();
        with_correlation_id("outer-request", async {
            let _ = op.call(()).await;
        })
        .await;
        assert_eq!(sink.single().fields["correlationId"], json!("outer-request"));
    }

    #[tokio::test]
    async fn test_uncorrelated_calls_have_no_id() {
        let (reporter, sink) = recording_reporter();
        let op = reporter.wrap(|_: ()| async { Err::<(), _>("boom") }, "Plain");

        let _ = op.call(()).await;
        assert!(!sink.single().fields.contains_key("correlationId"));
    }

    #[tokio::test]
    async fn test_guard_single_future() {
        let (reporter, sink) = recording_reporter();

        let ok = reporter.guard(async { Ok::<_, Value>("done") }, "Job").await;
        assert_eq!(ok, Ok("done"));
        assert!(sink.is_empty());

        let failed = reporter
            .guard(async { Err::<(), _>(json!({ "response": { "status": 503 } })) }, "Job")
            .await
            .unwrap_err();
        assert_eq!(failed.status_code, 503);
        assert_eq!(failed.error_code, "API_ERROR");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_default_reporter_wrappers() {
        let op = wrap(|x: i32| async move { Ok::<_, String>(x + 1) }, "Increment");
        assert_eq!(op.call(1).await, Ok(2));

        let failed = guard(async { Err::<(), _>("Signature invalid") }, "Verify")
            .await
            .unwrap_err();
        assert_eq!(failed.status_code, 503);
    }
}
