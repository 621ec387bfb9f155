//! User-facing messages for error codes
//!
//! Every sentence here is pre-approved end-user copy. Resolution depends on the
//! error code alone and never looks at an error's details, so no diagnostic data
//! can leak into what the user sees.

use crate::error::taxonomy::ErrorKind;

/// Sentence shown for any error code without dedicated copy
pub const FALLBACK_USER_MESSAGE: &str =
    "An unexpected error occurred. Please try again or contact support.";

/// Resolve the user-facing sentence for an error code
pub fn resolve_user_message(error_code: &str) -> &'static str {
    match error_code {
        "VALIDATION_ERROR" => "Invalid input provided. Please check your data and try again.",
        "NOT_FOUND" => "The requested resource could not be found.",
        "UNAUTHORIZED" => "You are not authorized to perform this action. Please log in.",
        "FORBIDDEN" => "You do not have permission to access this resource.",
        "CONFLICT" => "A conflict occurred. The resource may already exist.",
        "BLOCKCHAIN_ERROR" => {
            "There was an issue with the blockchain transaction. Please try again later."
        }
        "TIMEOUT_ERROR" => {
            "The request took too long to complete. Please check your connection and try again."
        }
        "API_ERROR" => "There was a problem communicating with the server. Please try again.",
        _ => FALLBACK_USER_MESSAGE,
    }
}

impl ErrorKind {
    /// User-facing sentence for this kind's default error code
    pub fn user_message(self) -> &'static str {
        resolve_user_message(self.error_code())
    }
}
