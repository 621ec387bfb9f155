//! Failure classification
//!
//! Maps an arbitrary failure onto exactly one taxonomy kind. The classifier only
//! inspects the *shape* of a failure through the [`Failure`] trait: whether it is
//! already classified, whether it carries an abort/timeout signal code, whether it
//! carries an upstream response payload, and its message text.
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. already classified: passed through unchanged
//! 2. `ECONNABORTED` / `ETIMEDOUT` signal: timeout
//! 3. upstream response payload: API error with the upstream status and code
//! 4. message mentions `Transaction` or `Signature`: blockchain
//! 5. anything else: unexpected
//!
//! Rule 4 is a substring heuristic on free text and is a known source of false
//! positives (any message that happens to contain those words). It is kept as-is
//! for compatibility with consumers that rely on it.
//!
//! A panic raised by a [`Failure`] probe is caught and classified as unexpected,
//! but it still goes through the process panic hook first, so the default hook
//! prints the usual `thread '..' panicked at` line to stderr. Install a quieter
//! hook with [`std::panic::set_hook`] if that output is unwanted.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::io;
use std::panic::{self, AssertUnwindSafe, Location};

use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::error::Elapsed;

use crate::error::taxonomy::{DEFAULT_API_ERROR_CODE, DEFAULT_STATUS_CODE};
use crate::error::{ClassifiedError, Details, PublicErrorView};

/// Signal code for an aborted connection
pub const CONNECTION_ABORTED: &str = "ECONNABORTED";
/// Signal code for an operation that timed out
pub const TIMED_OUT: &str = "ETIMEDOUT";

pub const TIMEOUT_MESSAGE: &str = "Request timed out";
pub const API_FALLBACK_MESSAGE: &str = "API request failed";
pub const BLOCKCHAIN_MESSAGE: &str = "Blockchain transaction failed";
pub const UNEXPECTED_FALLBACK_MESSAGE: &str = "Unexpected error occurred";

const BLOCKCHAIN_MARKERS: [&str; 2] = ["Transaction", "Signature"];

/// Response payload returned by an upstream service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamResponse {
    /// Upstream transport status
    pub status: Option<u16>,
    /// Upstream body, usually `{ "message": ..., "errorCode": ... }`
    pub data: Option<Value>,
}

impl UpstreamResponse {
    pub fn new(status: Option<u16>, data: Option<Value>) -> Self {
        Self { status, data }
    }

    /// Read `{status, data}` out of a JSON response value.
    ///
    /// A response that is not an object carries neither.
    fn from_value(value: &Value) -> Self {
        Self {
            status: value.get("status").and_then(status_from_value),
            data: value.get("data").filter(|data| !data.is_null()).cloned(),
        }
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|value| !value.is_empty())
    }
}

/// Shape of a failure as seen by the classifier
///
/// Implementors only need [`Failure::message`]; every other probe defaults to
/// "not present".
pub trait Failure {
    /// The normalized record this failure already is, if any
    fn as_classified(&self) -> Option<ClassifiedError> {
        None
    }

    /// Abort/timeout style signal code (`ECONNABORTED`, `ETIMEDOUT`, ...)
    fn signal_code(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Upstream response payload carried by the failure
    fn upstream_response(&self) -> Option<UpstreamResponse> {
        None
    }

    /// Human-oriented message text
    fn message(&self) -> Option<Cow<'_, str>>;

    /// Diagnostic snapshot of the whole failure, recorded for unexpected errors
    fn snapshot(&self) -> Value {
        self.message()
            .map_or(Value::Null, |message| Value::String(message.into_owned()))
    }
}

impl<T: Failure + ?Sized> Failure for &T {
    fn as_classified(&self) -> Option<ClassifiedError> {
        (**self).as_classified()
    }

    fn signal_code(&self) -> Option<Cow<'_, str>> {
        (**self).signal_code()
    }

    fn upstream_response(&self) -> Option<UpstreamResponse> {
        (**self).upstream_response()
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        (**self).message()
    }

    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}

impl Failure for ClassifiedError {
    fn as_classified(&self) -> Option<ClassifiedError> {
        Some(self.clone())
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(ClassifiedError::message(self)))
    }
}

impl Failure for PublicErrorView {
    fn as_classified(&self) -> Option<ClassifiedError> {
        Some(self.to_classified())
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.message))
    }
}

/// Explicitly shaped failure for callers that do not have a richer error type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFailure {
    pub message: Option<String>,
    pub code: Option<String>,
    pub response: Option<UpstreamResponse>,
}

impl RawFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_response(mut self, status: Option<u16>, data: Option<Value>) -> Self {
        self.response = Some(UpstreamResponse::new(status, data));
        self
    }
}

impl Failure for RawFailure {
    fn signal_code(&self) -> Option<Cow<'_, str>> {
        self.code.as_deref().map(Cow::Borrowed)
    }

    fn upstream_response(&self) -> Option<UpstreamResponse> {
        self.response.clone()
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        self.message.as_deref().map(Cow::Borrowed)
    }

    fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Dynamic failures, e.g. a decoded error body or a value from a script host.
///
/// Recognized keys: `code`, `response.{status,data}`, `message`. An object that
/// carries `message`, a positive `statusCode` and `errorCode` is treated as
/// already classified.
impl Failure for Value {
    fn as_classified(&self) -> Option<ClassifiedError> {
        let view = PublicErrorView {
            status_code: self.get("statusCode").and_then(status_from_value)?,
            error_code: self.get("errorCode")?.as_str()?.to_string(),
            message: self.get("message")?.as_str()?.to_string(),
            details: self
                .get("details")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        };
        Some(view.to_classified())
    }

    fn signal_code(&self) -> Option<Cow<'_, str>> {
        self.get("code")?.as_str().map(Cow::Borrowed)
    }

    fn upstream_response(&self) -> Option<UpstreamResponse> {
        let response = self.get("response")?;
        is_truthy(response).then(|| UpstreamResponse::from_value(response))
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(message) => Some(Cow::Borrowed(message)),
            _ => self.get("message")?.as_str().map(Cow::Borrowed),
        }
    }

    fn snapshot(&self) -> Value {
        self.clone()
    }
}

impl Failure for io::Error {
    fn signal_code(&self) -> Option<Cow<'_, str>> {
        io_signal(self.kind()).map(Cow::Borrowed)
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl Failure for Elapsed {
    fn signal_code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(TIMED_OUT))
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl Failure for Box<dyn StdError + Send + Sync + 'static> {
    fn as_classified(&self) -> Option<ClassifiedError> {
        classified_from_error(self.as_ref())
    }

    fn signal_code(&self) -> Option<Cow<'_, str>> {
        chain_signal(self.as_ref()).map(Cow::Borrowed)
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl Failure for eyre::Report {
    fn as_classified(&self) -> Option<ClassifiedError> {
        self.downcast_ref::<ClassifiedError>()
            .cloned()
            .or_else(|| self.downcast_ref::<PublicErrorView>().map(PublicErrorView::to_classified))
    }

    fn signal_code(&self) -> Option<Cow<'_, str>> {
        self.chain().find_map(error_signal).map(Cow::Borrowed)
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl Failure for str {
    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl Failure for String {
    fn message(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

/// Which resolution rule produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    PassThrough,
    Timeout,
    Upstream,
    Blockchain,
    Unexpected,
}

/// Classify a failure into exactly one taxonomy kind.
///
/// `context` only labels the diagnostic trace. This never fails outward: a panic
/// raised while probing the failure collapses to an unexpected error.
#[track_caller]
pub fn classify<F: Failure + ?Sized>(failure: &F, context: &str) -> ClassifiedError {
    classify_with_rule(failure, context).0
}

/// Classify a failure and report which rule matched
#[track_caller]
pub fn classify_with_rule<F: Failure + ?Sized>(failure: &F, context: &str) -> (ClassifiedError, Rule) {
    let caller = Location::caller();
    let span = tracing::trace_span!("classify", context = %context);
    let _guard = span.enter();

    match panic::catch_unwind(AssertUnwindSafe(|| resolve(failure))) {
        Ok((classified, Rule::PassThrough)) => {
            tracing::trace!(error_code = %classified.error_code(), "Failure already classified");
            (classified, Rule::PassThrough)
        }
        Ok((classified, rule)) => {
            tracing::trace!(
                rule = ?rule,
                kind = %classified.kind(),
                error_code = %classified.error_code(),
                status_code = classified.status_code(),
                "Classified failure"
            );
            (classified.at_location(caller), rule)
        }
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::warn!(reason = %reason, "Failure probe panicked during classification");
            let classified = ClassifiedError::unexpected(UNEXPECTED_FALLBACK_MESSAGE)
                .with_detail("originalError", reason)
                .at_location(caller);
            (classified, Rule::Unexpected)
        }
    }
}

fn resolve<F: Failure + ?Sized>(failure: &F) -> (ClassifiedError, Rule) {
    if let Some(classified) = failure.as_classified() {
        return (classified, Rule::PassThrough);
    }

    let message = failure.message().filter(|message| !message.is_empty());

    if failure.signal_code().is_some_and(|code| is_timeout_signal(&code)) {
        let original = message
            .as_deref()
            .map_or(Value::Null, |message| Value::String(message.to_string()));
        let classified = ClassifiedError::timeout(TIMEOUT_MESSAGE).with_detail("originalError", original);
        return (classified, Rule::Timeout);
    }

    if let Some(response) = failure.upstream_response() {
        return (from_upstream(&response), Rule::Upstream);
    }

    if let Some(text) = message.as_deref().filter(|text| mentions_blockchain(text)) {
        let classified = ClassifiedError::blockchain(BLOCKCHAIN_MESSAGE).with_detail("originalError", text);
        return (classified, Rule::Blockchain);
    }

    let text = message.map_or_else(|| UNEXPECTED_FALLBACK_MESSAGE.to_string(), Cow::into_owned);
    let classified = ClassifiedError::unexpected(text).with_detail("originalError", failure.snapshot());
    (classified, Rule::Unexpected)
}

fn from_upstream(response: &UpstreamResponse) -> ClassifiedError {
    let message = response.data_str("message").unwrap_or(API_FALLBACK_MESSAGE);
    let error_code = response.data_str("errorCode").unwrap_or(DEFAULT_API_ERROR_CODE);
    let status_code = response.status.unwrap_or(DEFAULT_STATUS_CODE);

    let mut details = Details::new();
    details.insert(
        "apiResponse".to_string(),
        response.data.clone().unwrap_or(Value::Null),
    );
    details.insert(
        "status".to_string(),
        response.status.map_or(Value::Null, Value::from),
    );

    ClassifiedError::api(message, status_code, error_code).with_details(details)
}

/// Whether a signal code means the operation was aborted or timed out
pub fn is_timeout_signal(code: &str) -> bool {
    matches!(code, CONNECTION_ABORTED | TIMED_OUT)
}

/// Whether a message trips the blockchain heuristic (case-sensitive)
pub fn mentions_blockchain(message: &str) -> bool {
    BLOCKCHAIN_MARKERS.iter().any(|marker| message.contains(marker))
}

fn io_signal(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::TimedOut => Some(TIMED_OUT),
        io::ErrorKind::ConnectionAborted => Some(CONNECTION_ABORTED),
        _ => None,
    }
}

fn error_signal(error: &(dyn StdError + 'static)) -> Option<&'static str> {
    if let Some(io_error) = error.downcast_ref::<io::Error>() {
        return io_signal(io_error.kind());
    }
    error.is::<Elapsed>().then_some(TIMED_OUT)
}

// Walks the source chain so a timeout wrapped in context still counts.
fn chain_signal(error: &(dyn StdError + 'static)) -> Option<&'static str> {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(signal) = error_signal(error) {
            return Some(signal);
        }
        current = error.source();
    }
    None
}

fn classified_from_error(error: &(dyn StdError + 'static)) -> Option<ClassifiedError> {
    error
        .downcast_ref::<ClassifiedError>()
        .cloned()
        .or_else(|| error.downcast_ref::<PublicErrorView>().map(PublicErrorView::to_classified))
}

fn status_from_value(value: &Value) -> Option<u16> {
    value
        .as_u64()
        .and_then(|status| u16::try_from(status).ok())
        .filter(|status| *status > 0)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        return reason.to_string();
    }
    if let Some(reason) = payload.downcast_ref::<String>() {
        return reason.clone();
    }
    "classification panicked".to_string()
}

