use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

// Error modules
pub mod classifier;
pub mod messages;
pub mod notifier;
pub mod reporter;
pub mod taxonomy;
pub mod wrapper;

use taxonomy::{DEFAULT_API_ERROR_CODE, DEFAULT_GENERIC_ERROR_CODE, DEFAULT_STATUS_CODE, ErrorKind};

/// Open diagnostic payload attached to a classified error.
///
/// Opaque to the taxonomy: keys and values are whatever the classifier or caller
/// found useful (original error, upstream payload, status, ...).
pub type Details = Map<String, Value>;

/// Canonical normalized error record
///
/// Built once per failure occurrence, either by the classifier or by one of the
/// per-kind constructors, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    status_code: u16,
    error_code: String,
    details: Details,
    trace_id: Uuid,
    location: Option<String>,
}

impl ClassifiedError {
    /// Create a generic error with a caller-chosen status and code.
    ///
    /// A zero status falls back to 500 and an empty code to `UNKNOWN_ERROR`. A code
    /// that belongs to a taxonomy kind is tagged with that kind.
    #[track_caller]
    pub fn new(message: impl Into<String>, status_code: u16, error_code: impl Into<String>) -> Self {
        let error_code = non_empty_or(error_code.into(), DEFAULT_GENERIC_ERROR_CODE);
        let kind = ErrorKind::from_error_code(&error_code).unwrap_or(ErrorKind::Generic);
        Self::build(kind, message.into(), status_code, error_code)
    }

    /// Create an error of a fixed-shape kind with its default status and code
    #[track_caller]
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::build(kind, message.into(), kind.status_code(), kind.error_code().to_string())
    }

    /// Create a new validation error
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Validation, message)
    }

    /// Create a new not found error
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::NotFound, message)
    }

    /// Create a new unauthorized error
    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unauthorized, message)
    }

    /// Create a new forbidden error
    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Forbidden, message)
    }

    /// Create a new conflict error
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Conflict, message)
    }

    /// Create a new blockchain error
    #[track_caller]
    pub fn blockchain(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Blockchain, message)
    }

    /// Create a new timeout error
    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Timeout, message)
    }

    /// Create a new upstream API error.
    ///
    /// The upstream status and code are kept as-is; zero and empty fall back to
    /// 500 and `API_ERROR`.
    #[track_caller]
    pub fn api(message: impl Into<String>, status_code: u16, error_code: impl Into<String>) -> Self {
        let error_code = non_empty_or(error_code.into(), DEFAULT_API_ERROR_CODE);
        Self::build(ErrorKind::Api, message.into(), status_code, error_code)
    }

    /// Create a new unexpected error
    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unexpected, message)
    }

    #[track_caller]
    fn build(kind: ErrorKind, message: String, status_code: u16, error_code: String) -> Self {
        let location = Location::caller();
        Self {
            kind,
            message,
            status_code: if status_code == 0 { DEFAULT_STATUS_CODE } else { status_code },
            error_code,
            details: Details::new(),
            trace_id: Uuid::new_v4(),
            location: Some(format!("{}:{}", location.file(), location.line())),
        }
    }

    /// Replace the details payload
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Add a single detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Point the stack reference at a different call site
    pub(crate) fn at_location(mut self, location: &'static Location<'static>) -> Self {
        self.location = Some(format!("{}:{}", location.file(), location.line()));
        self
    }

    /// Taxonomy kind this error was classified as
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Diagnostic message, not necessarily safe for end users
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    /// Diagnostic identifier carried into the log record
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// `file:line` of the call site that constructed this error
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Project the fields that may cross the system boundary
    pub fn to_public_view(&self) -> PublicErrorView {
        PublicErrorView {
            status_code: self.status_code,
            error_code: self.error_code.clone(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

impl From<ClassifiedError> for PublicErrorView {
    fn from(error: ClassifiedError) -> Self {
        Self {
            status_code: error.status_code,
            error_code: error.error_code,
            message: error.message,
            details: error.details,
        }
    }
}

impl From<&ClassifiedError> for PublicErrorView {
    fn from(error: &ClassifiedError) -> Self {
        error.to_public_view()
    }
}

/// Boundary-safe projection of a classified error
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct PublicErrorView {
    pub status_code: u16,
    pub error_code: String,
    pub message: String,
    #[serde(default)]
    pub details: Details,
}

impl PublicErrorView {
    /// Rebuild a classified record from a view that crossed a boundary.
    ///
    /// The kind is recovered from the error code; unknown codes become generic.
    #[track_caller]
    pub fn to_classified(&self) -> ClassifiedError {
        let kind = ErrorKind::from_error_code(&self.error_code).unwrap_or(ErrorKind::Generic);
        ClassifiedError::build(kind, self.message.clone(), self.status_code, self.error_code.clone())
            .with_details(self.details.clone())
    }
}

/// Public view plus the sentence to show the end user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResult {
    #[serde(flatten)]
    pub view: PublicErrorView,
    pub user_message: String,
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() { fallback.to_string() } else { value }
}

pub type Result<T, E = PublicErrorView> = core::result::Result<T, E>;
