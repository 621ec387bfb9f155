//! Correlation ID management for error records
//!
//! Correlation ids link every error record produced while handling one logical
//! request. They are task-local so an id set before an `.await` is still in scope
//! after it, whichever worker thread resumes the task.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    /// Correlation id of the current task, if one was scoped
    static CURRENT_CORRELATION_ID: String;
}

/// Generate a new correlation ID
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the correlation ID in scope for the current task
pub fn get_correlation_id() -> Option<String> {
    CURRENT_CORRELATION_ID.try_with(Clone::clone).ok()
}

/// Get the current correlation ID or generate a new one if none exists
pub fn get_or_generate_correlation_id() -> String {
    get_correlation_id().unwrap_or_else(generate_correlation_id)
}

/// Create a child correlation ID from a parent correlation ID
pub fn create_child_correlation_id(parent_id: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}.{}", parent_id, &suffix[..8])
}

/// Run a future with a specific correlation ID in scope
pub async fn with_correlation_id<F>(correlation_id: impl Into<String>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_CORRELATION_ID.scope(correlation_id.into(), future).await
}

/// Run a future with a freshly generated correlation ID in scope
pub async fn with_new_correlation_id<F>(future: F) -> F::Output
where
    F: Future,
{
    with_correlation_id(generate_correlation_id(), future).await
}

/// Run a future with a child of the current (or a new) correlation ID in scope
pub async fn with_child_correlation_id<F>(future: F) -> F::Output
where
    F: Future,
{
    let parent_id = get_or_generate_correlation_id();
    with_correlation_id(create_child_correlation_id(&parent_id), future).await
}

/// Run a closure with a specific correlation ID in scope
pub fn sync_with_correlation_id<F, R>(correlation_id: impl Into<String>, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_CORRELATION_ID.sync_scope(correlation_id.into(), f)
}
