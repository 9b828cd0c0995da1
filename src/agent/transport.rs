//! Wire transport to the agent runtime.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::{ConfigError, TransportError};

/// Header carrying the runtime session id.
pub const SESSION_HEADER: &str = "X-Agent-Session-Id";

/// Provider code for an unknown agent.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Provider code for rate limiting.
pub const THROTTLING: &str = "ThrottlingException";

/// One request/response exchange with the agent runtime.
///
/// Implementations make exactly one attempt; retrying is the caller's call.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send `payload` on `session_id` and return the raw response body.
    async fn invoke(&self, session_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;

    /// Human-readable target, used in error messages.
    fn endpoint(&self) -> &str;
}

/// JSON-over-HTTP transport.
pub struct HttpAgentTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    api_token: Option<SecretString>,
    read_timeout: Duration,
}

impl HttpAgentTransport {
    pub fn new(config: &AgentConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            read_timeout: config.read_timeout,
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.read_timeout)
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl AgentTransport for HttpAgentTransport {
    async fn invoke(&self, session_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, session_id)
            .body(payload);
        if let Some(token) = &self.api_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        let response = request.send().await.map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Agent runtime responded");

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(provider_error(status, &body))
        }
    }

    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

/// Decode a non-2xx response into a provider error.
///
/// The code comes from `code`, `__type` or `error.code` in a JSON body,
/// falling back to one derived from the status.
fn provider_error(status: StatusCode, body: &[u8]) -> TransportError {
    let json: Option<Value> = serde_json::from_slice(body).ok();

    let code = json
        .as_ref()
        .and_then(|v| {
            v.get("code")
                .or_else(|| v.get("__type"))
                .or_else(|| v.pointer("/error/code"))
        })
        .and_then(Value::as_str)
        // `__type` may be namespaced, e.g. `com.amazon#ThrottlingException`.
        .map(|c| c.rsplit('#').next().unwrap_or(c).to_string())
        .unwrap_or_else(|| match status {
            StatusCode::NOT_FOUND => RESOURCE_NOT_FOUND.to_string(),
            StatusCode::TOO_MANY_REQUESTS => THROTTLING.to_string(),
            other => format!("Http{}", other.as_u16()),
        });

    let message = json
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .or_else(|| v.pointer("/error/message"))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    TransportError::Provider { code, message }
}
