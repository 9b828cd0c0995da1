//! Shared types for the email ingestion pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Queue records ───────────────────────────────────────────────────

/// Identifier used when a record carries no `messageId`.
pub const UNKNOWN_MESSAGE_ID: &str = "UNKNOWN";

/// One queued delivery notification. Opaque to the queue; `body` holds the
/// notification JSON (raw, or wrapped in a `Notification` envelope).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl QueueRecord {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            body: Some(body.into()),
        }
    }

    /// The record id, or [`UNKNOWN_MESSAGE_ID`].
    pub fn id(&self) -> &str {
        self.message_id.as_deref().unwrap_or(UNKNOWN_MESSAGE_ID)
    }
}

/// A batch of queue records, as delivered by the trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// A record the caller should redeliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// Batch reply. Every record is acknowledged, so `batch_item_failures` is
/// always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

// ── Email metadata ──────────────────────────────────────────────────

/// Where the raw message lives in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobLocation {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Structured metadata decoded from a delivery notification.
///
/// Only built by the notification parser, which guarantees a non-empty
/// `blob_location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMetadata {
    /// Queue record identifier.
    pub message_id: String,
    pub from_address: String,
    pub to_addresses: Vec<String>,
    pub subject: String,
    /// Receipt timestamp as sent by the mail service; not interpreted.
    pub timestamp: String,
    pub blob_location: BlobLocation,
}

// ── Email content ───────────────────────────────────────────────────

/// A file extracted from the MIME structure.
///
/// `content` is populated at extraction and taken once the upload succeeds;
/// `url` is set by that same upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size_bytes: content.len() as u64,
            content: Some(content),
            url: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// Bodies and attachments of a reconstructed message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailContent {
    pub text_body: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailContent {
    /// Best body for the agent: text, else HTML, else empty.
    pub fn body_for_agent(&self) -> &str {
        if !self.text_body.is_empty() {
            &self.text_body
        } else {
            &self.html_body
        }
    }

    pub fn has_content(&self) -> bool {
        !self.text_body.is_empty() || !self.html_body.is_empty()
    }

    /// Attachments that were published and have a public URL.
    pub fn published_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.url.is_some())
    }
}

// ── Processing result ───────────────────────────────────────────────

/// Outcome of one record. Built through [`ProcessingResult::succeeded`] or
/// [`ProcessingResult::failed`], so a failure always carries an
/// `error_message` and a success always carries an `agent_response`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EmailMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl ProcessingResult {
    pub fn succeeded(
        message_id: impl Into<String>,
        metadata: EmailMetadata,
        agent_response: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            message_id: message_id.into(),
            metadata: Some(metadata),
            agent_response: Some(agent_response.into()),
            error_message: None,
            processed_at: Utc::now(),
        }
    }

    pub fn failed(
        message_id: impl Into<String>,
        metadata: Option<EmailMetadata>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message_id: message_id.into(),
            metadata,
            agent_response: None,
            error_message: Some(error_message.into()),
            processed_at: Utc::now(),
        }
    }

    /// Whether the queue record should be acknowledged.
    ///
    /// Always true: failed records are logged, not redelivered.
    pub fn should_acknowledge(&self) -> bool {
        true
    }
}

impl fmt::Display for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "ProcessingResult(success=true, message_id={})", self.message_id)
        } else {
            write!(
                f,
                "ProcessingResult(success=false, message_id={}, error={})",
                self.message_id,
                self.error_message.as_deref().unwrap_or_default()
            )
        }
    }
}
