//! Error payloads returned by the extension API.

use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error payload: `{"message": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub message: ErrorDetail,
}

/// Details of an error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Short reason: the error text up to the first comma.
    pub reason: String,
    /// Full error text.
    pub description: String,
    /// The error followed by each of its sources, outermost first.
    pub stacktrace: Vec<String>,
}

/// Build the error payload for an error.
pub fn error_report(error: &(dyn Error + 'static)) -> ErrorEnvelope {
    let description = error.to_string();
    let reason = description
        .split(',')
        .next()
        .unwrap_or_default()
        .to_string();

    let mut stacktrace = vec![description.clone()];
    let mut source = error.source();
    while let Some(cause) = source {
        stacktrace.push(cause.to_string());
        source = cause.source();
    }

    ErrorEnvelope {
        message: ErrorDetail {
            reason,
            description,
            stacktrace,
        },
    }
}

/// Build the error payload as JSON; `None` yields an empty object.
pub fn error_to_json(error: Option<&(dyn Error + 'static)>) -> Value {
    match error {
        Some(error) => serde_json::to_value(error_report(error))
            .unwrap_or_else(|_| Value::Object(Map::new())),
        None => Value::Object(Map::new()),
    }
}
