//! vCD Extension API Protocol Types
//!
//! Decodes HTTP responses returned by the extension API and builds the
//! JSON error payload the API uses to describe failures.

pub mod error;
pub mod report;
pub mod response;

pub use error::ResponseError;
pub use report::{error_report, error_to_json, ErrorDetail, ErrorEnvelope};
pub use response::{
    deserialize_response_content, process_response, response_to_error, ApiResponse,
};

/// Top-level key of an error payload.
pub const ERROR_MESSAGE: &str = "message";

/// Short reason inside an error payload.
pub const ERROR_REASON: &str = "reason";

/// Full description inside an error payload.
pub const ERROR_DESCRIPTION: &str = "description";

/// Error chain inside an error payload.
pub const ERROR_STACKTRACE: &str = "stacktrace";

/// Message used when an error body carries nothing usable.
pub const ERROR_UNKNOWN: &str = "unknown error";
