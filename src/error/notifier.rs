//! One-call classify, report and resolve for UI-facing failure handling

use crate::error::classifier::{Failure, classify};
use crate::error::messages::resolve_user_message;
use crate::error::reporter::{ErrorReporter, context_or, default_reporter};
use crate::error::NotifyResult;

impl ErrorReporter {
    /// Classify a failure, report it once and attach the user-facing sentence.
    ///
    /// An empty `context` falls back to the configured notification context.
    #[track_caller]
    pub fn notify<'a, F>(&'a self, failure: &F, context: &'a str) -> impl Future<Output = NotifyResult> + use<'a, F>
    where
        F: Failure + ?Sized,
    {
        let context = context_or(context, &self.config().notify_context);
        let classified = classify(failure, context);

        async move {
            let view = self.report(&classified, context).await;
            let user_message = resolve_user_message(&view.error_code).to_string();
            NotifyResult { view, user_message }
        }
    }
}

/// Notify through the default reporter
#[track_caller]
pub fn notify<'a, F>(failure: &F, context: &'a str) -> impl Future<Output = NotifyResult> + use<'a, F>
where
    F: Failure + ?Sized,
{
    default_reporter().notify(failure, context)
}
