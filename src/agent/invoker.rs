//! Prompt → agent response.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::transport::{AgentTransport, RESOURCE_NOT_FOUND, THROTTLING};
use crate::error::{AgentError, TransportError};

/// Shortest session id the agent runtime accepts.
pub const MIN_SESSION_ID_LEN: usize = 33;

/// Fresh random session id, always at least [`MIN_SESSION_ID_LEN`] long.
pub fn new_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}

/// Sends prompts to the agent runtime.
///
/// One attempt per call, no sleeps: any retry policy belongs to the caller.
pub struct AgentInvoker {
    transport: Arc<dyn AgentTransport>,
}

impl AgentInvoker {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    /// Invoke the agent with `prompt`, on `session_id` or a fresh session.
    pub async fn invoke(&self, prompt: &str, session_id: Option<&str>) -> Result<String, AgentError> {
        if prompt.is_empty() {
            return Err(AgentError::Validation("prompt must be a non-empty string".into()));
        }

        let session_id = match session_id {
            Some(id) if id.chars().count() < MIN_SESSION_ID_LEN => {
                return Err(AgentError::Validation(format!(
                    "session id must be at least {MIN_SESSION_ID_LEN} characters, got {}",
                    id.chars().count()
                )));
            }
            Some(id) => id.to_string(),
            None => new_session_id(),
        };

        let payload = json!({ "prompt": prompt }).to_string().into_bytes();

        info!(
            endpoint = %self.transport.endpoint(),
            session_id = %session_id,
            prompt_chars = prompt.len(),
            "Invoking agent"
        );

        let body = self
            .transport
            .invoke(&session_id, payload)
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let text = response_text(&body);
        info!(session_id = %session_id, response_chars = text.len(), "Agent invocation complete");
        Ok(text)
    }

    fn map_transport_error(&self, e: TransportError) -> AgentError {
        match e {
            TransportError::Provider { code, message } => match code.as_str() {
                RESOURCE_NOT_FOUND => {
                    error!(endpoint = %self.transport.endpoint(), "Agent not found");
                    AgentError::AgentNotFound {
                        endpoint: self.transport.endpoint().to_string(),
                        message,
                    }
                }
                THROTTLING => {
                    warn!(message = %message, "Agent request throttled");
                    AgentError::Throttled(message)
                }
                _ => {
                    error!(code = %code, message = %message, "Agent invocation failed");
                    AgentError::Service { code, message }
                }
            },
            TransportError::Timeout(after) => {
                error!(after_secs = after.as_secs(), "Agent request timed out");
                AgentError::Timeout(after)
            }
            TransportError::Connection(message) => {
                error!(error = %message, "Agent transport failed");
                AgentError::Transport(message)
            }
        }
    }
}

/// Extract the reply text from a response body.
///
/// Empty body → empty string; non-JSON → the body as text; JSON → `response`,
/// else `output`, else the whole document.
fn response_text(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        warn!("Agent response is not JSON, returning raw text");
        return String::from_utf8_lossy(body).into_owned();
    };

    match value.get("response").or_else(|| value.get("output")) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => match value {
            Value::String(text) => text,
            other => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Records every call and replies with a fixed result.
    struct StubTransport {
        reply: Result<Vec<u8>, (String, String)>,
        calls: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl StubTransport {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.as_bytes().to_vec()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn provider_error(code: &str, message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err((code.into(), message.into())),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<u8>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentTransport for StubTransport {
        async fn invoke(&self, session_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().push((session_id.to_string(), payload));
            match &self.reply {
                Ok(body) => Ok(body.clone()),
                Err((code, message)) => Err(TransportError::Provider {
                    code: code.clone(),
                    message: message.clone(),
                }),
            }
        }

        fn endpoint(&self) -> &str {
            "stub://agent"
        }
    }

    struct TimeoutTransport;

    #[async_trait]
    impl AgentTransport for TimeoutTransport {
        async fn invoke(&self, _: &str, _: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Timeout(Duration::from_secs(120)))
        }

        fn endpoint(&self) -> &str {
            "stub://slow"
        }
    }

    #[test]
    fn generated_session_ids_meet_floor() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.len() >= MIN_SESSION_ID_LEN);
        assert!(a.starts_with("session-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn sends_prompt_payload() {
        let transport = StubTransport::ok(r#"{"response":"Created issue #42"}"#);
        let invoker = AgentInvoker::new(transport.clone());

        let out = invoker.invoke("Create an issue", None).await.unwrap();
        assert_eq!(out, "Created issue #42");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let payload: Value = serde_json::from_slice(&calls[0].1).unwrap();
        assert_eq!(payload, json!({ "prompt": "Create an issue" }));
        assert!(calls[0].0.len() >= MIN_SESSION_ID_LEN);
    }

    #[tokio::test]
    async fn empty_prompt_rejected_without_call() {
        let transport = StubTransport::ok("{}");
        let invoker = AgentInvoker::new(transport.clone());

        let err = invoker.invoke("", None).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn short_session_rejected_without_call() {
        let transport = StubTransport::ok("{}");
        let invoker = AgentInvoker::new(transport.clone());

        let short = "a".repeat(32);
        let err = invoker.invoke("hi", Some(&short)).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn caller_session_used_as_is() {
        let transport = StubTransport::ok(r#"{"output":"done"}"#);
        let invoker = AgentInvoker::new(transport.clone());

        let session = "s".repeat(33);
        assert_eq!(invoker.invoke("hi", Some(&session)).await.unwrap(), "done");
        assert_eq!(transport.calls()[0].0, session);
    }

    #[tokio::test]
    async fn empty_body_is_empty_string() {
        let invoker = AgentInvoker::new(StubTransport::ok(""));
        assert_eq!(invoker.invoke("hi", None).await.unwrap(), "");
    }

    #[tokio::test]
    async fn non_json_body_returned_verbatim() {
        let invoker = AgentInvoker::new(StubTransport::ok("plain words, not json"));
        assert_eq!(invoker.invoke("hi", None).await.unwrap(), "plain words, not json");
    }

    #[tokio::test]
    async fn json_without_known_field_rendered_whole() {
        let invoker = AgentInvoker::new(StubTransport::ok(r#"{"result":1}"#));
        assert_eq!(invoker.invoke("hi", None).await.unwrap(), r#"{"result":1}"#);
    }

    #[tokio::test]
    async fn response_field_preferred_over_output() {
        let invoker = AgentInvoker::new(StubTransport::ok(r#"{"output":"b","response":"a"}"#));
        assert_eq!(invoker.invoke("hi", None).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn resource_not_found_maps_to_agent_not_found() {
        let transport = StubTransport::provider_error(RESOURCE_NOT_FOUND, "no such runtime");
        let invoker = AgentInvoker::new(transport.clone());

        match invoker.invoke("hi", None).await.unwrap_err() {
            AgentError::AgentNotFound { endpoint, message } => {
                assert_eq!(endpoint, "stub://agent");
                assert_eq!(message, "no such runtime");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn throttling_maps_to_throttled_without_retry() {
        let transport = StubTransport::provider_error(THROTTLING, "rate exceeded");
        let invoker = AgentInvoker::new(transport.clone());

        assert!(matches!(
            invoker.invoke("hi", None).await.unwrap_err(),
            AgentError::Throttled(_)
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn other_codes_pass_through() {
        let invoker = AgentInvoker::new(StubTransport::provider_error("AccessDeniedException", "nope"));
        match invoker.invoke("hi", None).await.unwrap_err() {
            AgentError::Service { code, message } => {
                assert_eq!(code, "AccessDeniedException");
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_timeout() {
        let invoker = AgentInvoker::new(Arc::new(TimeoutTransport));
        assert!(matches!(
            invoker.invoke("hi", None).await.unwrap_err(),
            AgentError::Timeout(d) if d == Duration::from_secs(120)
        ));
    }
}
