//! Error taxonomy for normalized failures
//!
//! This module defines the closed set of error kinds a failure can be classified as.
//! Each kind carries a fixed transport status code and a stable error code that
//! downstream consumers switch on. The table is additive only: an existing error
//! code is never renamed or renumbered.

use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Error code used by the API kind when the upstream payload does not declare one
pub const DEFAULT_API_ERROR_CODE: &str = "API_ERROR";

/// Error code used by the generic kind when the caller does not supply one
pub const DEFAULT_GENERIC_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Status code used whenever no positive status is available
pub const DEFAULT_STATUS_CODE: u16 = 500;

/// Taxonomy kind of a classified error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The caller supplied invalid input
    Validation,
    /// The requested resource does not exist
    NotFound,
    /// The caller is not authenticated
    Unauthorized,
    /// The caller is authenticated but lacks permission
    Forbidden,
    /// The request conflicts with existing state
    Conflict,
    /// A blockchain transaction or signature step failed
    Blockchain,
    /// The operation was aborted or timed out
    Timeout,
    /// An upstream API answered with an error payload
    Api,
    /// Fallback for anything that matched no other rule
    Unexpected,
    /// Base kind with caller-chosen status and code
    Generic,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 10] = [
        Self::Validation,
        Self::NotFound,
        Self::Unauthorized,
        Self::Forbidden,
        Self::Conflict,
        Self::Blockchain,
        Self::Timeout,
        Self::Api,
        Self::Unexpected,
        Self::Generic,
    ];

    /// Conventional transport status for this kind.
    ///
    /// `Api` and `Generic` usually carry an overriding status; the value here is
    /// only their fallback.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::Conflict => 409,
            Self::Blockchain => 503,
            Self::Timeout => 408,
            Self::Api => DEFAULT_STATUS_CODE,
            Self::Unexpected => 500,
            Self::Generic => DEFAULT_STATUS_CODE,
        }
    }

    /// Stable, never-localized error code for this kind
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Blockchain => "BLOCKCHAIN_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Api => DEFAULT_API_ERROR_CODE,
            Self::Unexpected => "UNEXPECTED_ERROR",
            Self::Generic => DEFAULT_GENERIC_ERROR_CODE,
        }
    }

    /// Upper-case kind name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Blockchain => "BLOCKCHAIN",
            Self::Timeout => "TIMEOUT",
            Self::Api => "API",
            Self::Unexpected => "UNEXPECTED",
            Self::Generic => "GENERIC",
        }
    }

    /// Look up the kind that owns an error code
    pub fn from_error_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.error_code() == code)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
