//! HTTP response decoding.
//!
//! The extension API answers 200, 201 or 202 with a JSON body (possibly
//! empty). Any other status carries an error body: JSON in the usual
//! `{"message": {"reason": ...}}` shape, except 504, where the gateway
//! in front of the API answers with XML.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::error::ResponseError;
use crate::{ERROR_MESSAGE, ERROR_REASON, ERROR_UNKNOWN};

/// Status codes whose body is a result rather than an error.
pub const SUCCESS_CODES: [u16; 3] = [200, 201, 202];

/// Gateway timeout; the body is XML.
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Message used for a 504 with an empty body.
pub const GATEWAY_DEFAULT_MESSAGE: &str = "An error has occurred.";

/// Raw HTTP response: status plus undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes, UTF-8 encoded.
    pub content: Vec<u8>,
}

impl ApiResponse {
    /// Create a response from a status and body.
    pub fn new(status: u16, content: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content: content.into(),
        }
    }

    /// Whether the status is one of [`SUCCESS_CODES`].
    pub fn is_success(&self) -> bool {
        SUCCESS_CODES.contains(&self.status)
    }
}

/// Decode a response.
///
/// Returns the decoded JSON body for a success status and the error
/// described by the body otherwise.
pub fn process_response(response: &ApiResponse) -> Result<Value, ResponseError> {
    if response.is_success() {
        deserialize_response_content(response)
    } else {
        Err(response_to_error(response))
    }
}

/// Decode a UTF-8 JSON body. An empty body decodes to an empty object.
///
/// Only use this on JSON bodies.
pub fn deserialize_response_content(response: &ApiResponse) -> Result<Value, ResponseError> {
    let decoded = String::from_utf8(response.content.clone())?;
    if decoded.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(&decoded)?)
}

/// Build the error a non-success response describes.
///
/// A body that cannot be decoded yields the decoding error instead.
pub fn response_to_error(response: &ApiResponse) -> ResponseError {
    if response.status == GATEWAY_TIMEOUT {
        let message = if response.content.is_empty() {
            GATEWAY_DEFAULT_MESSAGE.to_string()
        } else {
            let text = String::from_utf8_lossy(&response.content);
            root_attribute(&text, ERROR_MESSAGE).unwrap_or_default()
        };
        return ResponseError::status(response.status, message);
    }

    let content = match deserialize_response_content(response) {
        Ok(content) => content,
        Err(e) => return e,
    };

    let message = match content.get(ERROR_MESSAGE) {
        Some(error) => match error.get(ERROR_REASON) {
            Some(reason) => value_text(reason),
            None => value_text(error),
        },
        None => ERROR_UNKNOWN.to_string(),
    };

    ResponseError::status(response.status, message)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read an attribute of the root element of an XML document.
fn root_attribute(xml: &str, name: &str) -> Option<String> {
    static ROOT_TAG: OnceLock<Regex> = OnceLock::new();
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

    let root_tag = ROOT_TAG.get_or_init(|| {
        // Quoted values may contain an unescaped '>'.
        Regex::new(r#"<[A-Za-z_][^\s/>]*((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*/?>"#)
            .expect("static regex")
    });
    let attribute = ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"\s([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static regex")
    });

    let attrs = root_tag.captures(xml)?.get(1)?.as_str();
    attribute
        .captures_iter(attrs)
        .find(|caps| caps.get(1).map(|m| m.as_str()) == Some(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|m| unescape(m.as_str()))
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
