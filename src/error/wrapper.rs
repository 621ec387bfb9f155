//! Operation wrapping
//!
//! A wrapped operation runs to completion first. Only once it has settled is a
//! failure classified and reported, and the caller then sees the public view in
//! place of the original failure. Successful results pass through untouched and
//! produce no log record.

use std::fmt;
use std::panic::Location;

use crate::error::classifier::{Failure, Rule, classify_with_rule};
use crate::error::reporter::{ErrorReporter, context_or, default_reporter};
use crate::error::{ClassifiedError, PublicErrorView};
use crate::logging::correlation::{get_or_generate_correlation_id, with_correlation_id};

/// An operation whose failures are normalized before the caller sees them
#[derive(Clone)]
pub struct Wrapped<F> {
    operation: F,
    context: String,
    reporter: Option<ErrorReporter>,
    correlated: bool,
}

/// Wrap an operation so its failures are classified and reported
pub fn wrap<F>(operation: F, context: impl Into<String>) -> Wrapped<F> {
    Wrapped::new(operation, context)
}

impl<F> Wrapped<F> {
    pub fn new(operation: F, context: impl Into<String>) -> Self {
        Self {
            operation,
            context: context.into(),
            reporter: None,
            correlated: false,
        }
    }

    /// Report through a specific reporter instead of the default one
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Run every invocation inside a correlation scope.
    ///
    /// An id already in scope is reused, otherwise a fresh one is generated.
    pub fn correlated(mut self) -> Self {
        self.correlated = true;
        self
    }

    /// Context label used when reporting, after defaults are applied
    pub fn context(&self) -> &str {
        context_or(&self.context, &self.reporter().config().wrap_context)
    }

    fn reporter(&self) -> &ErrorReporter {
        self.reporter.as_ref().unwrap_or_else(|| default_reporter())
    }

    /// Invoke the operation.
    ///
    /// Arguments are passed through as a single value; use a tuple for several
    /// and `()` for none.
    #[track_caller]
    pub fn call<A, Fut, T, E>(&self, args: A) -> impl Future<Output = Result<T, PublicErrorView>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        let caller = Location::caller();
        let reporter = self.reporter();
        let context = self.context();
        let correlated = self.correlated;

        async move {
            let run = settle(reporter, (self.operation)(args), context, caller);
            if correlated {
                with_correlation_id(get_or_generate_correlation_id(), run).await
            } else {
                run.await
            }
        }
    }
}

impl<F> fmt::Debug for Wrapped<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("context", &self.context)
            .field("reporter", &self.reporter)
            .field("correlated", &self.correlated)
            .finish_non_exhaustive()
    }
}

impl ErrorReporter {
    /// Wrap an operation so its failures are reported through this reporter
    pub fn wrap<F>(&self, operation: F, context: impl Into<String>) -> Wrapped<F> {
        Wrapped::new(operation, context).with_reporter(self.clone())
    }

    /// Await a single future, normalizing its failure
    #[track_caller]
    pub fn guard<'a, Fut, T, E>(
        &'a self,
        future: Fut,
        context: &'a str,
    ) -> impl Future<Output = Result<T, PublicErrorView>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        let caller = Location::caller();
        let context = context_or(context, &self.config().wrap_context);
        settle(self, future, context, caller)
    }
}

/// Await a single future through the default reporter
#[track_caller]
pub fn guard<'a, Fut, T, E>(
    future: Fut,
    context: &'a str,
) -> impl Future<Output = Result<T, PublicErrorView>>
where
    Fut: Future<Output = Result<T, E>>,
    E: Failure,
{
    default_reporter().guard(future, context)
}

async fn settle<Fut, T, E>(
    reporter: &ErrorReporter,
    future: Fut,
    context: &str,
    caller: &'static Location<'static>,
) -> Result<T, PublicErrorView>
where
    Fut: Future<Output = Result<T, E>>,
    E: Failure,
{
    let classified = match future.await {
        Ok(value) => return Ok(value),
        Err(failure) => classify_at(&failure, context, caller),
    };

    Err(reporter.report(&classified, context).await)
}

// Points fresh classifications at the code that invoked the wrapper.
fn classify_at<E: Failure>(failure: &E, context: &str, caller: &'static Location<'static>) -> ClassifiedError {
    match classify_with_rule(failure, context) {
        (classified, Rule::PassThrough) => classified,
        (classified, _) => classified.at_location(caller),
    }
}
