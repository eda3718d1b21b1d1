//! JSON API client
//!
//! Thin wrapper over a blocking `ureq` agent. Every response, including
//! HTTP error statuses, is collected into an [`ApiResponse`] and decoded
//! by [`vcd_protocol::process_response`], so callers see one error type
//! for both transport and API failures.

use std::io::{self, Read};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use vcd_protocol::{process_response, ApiResponse, ResponseError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Blocking JSON API client.
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    headers: Vec<(String, String)>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_agent(
            ureq::AgentBuilder::new()
                .timeout(DEFAULT_TIMEOUT)
                .timeout_connect(DEFAULT_CONNECT_TIMEOUT)
                .build(),
        )
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    /// Send `name: value` with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    /// GET a JSON document.
    pub fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let response = self.fetch(url, self.request("GET", url).call())?;
        Ok(process_response(&response)?)
    }

    /// POST a JSON body and decode the JSON reply.
    pub fn post_json(&self, url: &str, body: &impl Serialize) -> Result<Value, ApiError> {
        let response = self.fetch(url, self.request("POST", url).send_json(body))?;
        Ok(process_response(&response)?)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.headers
            .iter()
            .fold(self.agent.request(method, url), |request, (name, value)| {
                request.set(name, value)
            })
    }

    fn fetch(
        &self,
        url: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<ApiResponse, ApiError> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(ApiError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let status = response.status();
        let mut content = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut content)
            .map_err(|source| ApiError::Body {
                url: url.to_string(),
                source,
            })?;
        debug!(url, status, bytes = content.len(), "received API response");
        Ok(ApiResponse::new(status, content))
    }
}
