//! Error types for mail2issue.

use std::time::Duration;

/// Configuration-related errors. Fatal at startup, never per-message.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build client: {0}")]
    Client(String),
}

/// Blob store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Bucket not found: {bucket}")]
    NoSuchBucket { bucket: String },

    #[error("Blob store request failed: {0}")]
    Transport(String),
}

/// Prompt loading and formatting errors.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt '{name}' not found in remote override or local directory")]
    NotFound { name: String },

    #[error("Missing required variable in prompt: {name}")]
    MissingVariable { name: String },

    #[error("Malformed prompt template at byte {position}: {reason}")]
    MalformedTemplate { position: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Agent invocation errors.
///
/// `AgentNotFound` and `Throttled` are the two provider codes with a dedicated
/// meaning; any other provider failure passes through as `Service`.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid agent input: {0}")]
    Validation(String),

    #[error("Agent not found: {endpoint}. Verify the agent exists and is active. Error: {message}")]
    AgentNotFound { endpoint: String, message: String },

    #[error("Request throttled by agent runtime: {0}")]
    Throttled(String),

    #[error("Agent invocation failed: {code}: {message}")]
    Service { code: String, message: String },

    #[error("Agent request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Agent transport error: {0}")]
    Transport(String),
}

/// Errors raised by an agent transport before they are mapped onto [`AgentError`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The runtime answered with a machine-readable error code.
    #[error("{code}: {message}")]
    Provider { code: String, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connection(String),
}

/// Per-record pipeline errors. Every variant is converted into a failed
/// `ProcessingResult` by the processor; none of them escapes a batch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}
