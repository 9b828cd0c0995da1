//! Delivery notification parsing.
//!
//! A record body is either the mail-service notification itself or a
//! pub/sub envelope (`{"Type": "Notification", "Message": "<json>"}`) around
//! it. Either way the result is an [`EmailMetadata`] with a blob location.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::{BlobLocation, EmailMetadata, QueueRecord};

const DEFAULT_SUBJECT: &str = "No Subject";
const UNKNOWN_SENDER: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct Notification {
    mail: Option<MailSection>,
    receipt: Option<ReceiptSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MailSection {
    common_headers: CommonHeaders,
    timestamp: Option<String>,
    return_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommonHeaders {
    from: Option<HeaderField>,
    to: Option<HeaderField>,
    subject: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReceiptSection {
    action: ReceiptAction,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReceiptAction {
    bucket_name: Option<String>,
    object_key: Option<String>,
}

/// An address header that may arrive as a list or as a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HeaderField {
    List(Vec<String>),
    Single(String),
    Other(#[allow(dead_code)] Value),
}

impl HeaderField {
    /// First address: list → first element, string → itself.
    fn first(&self) -> Option<&str> {
        match self {
            Self::List(items) => items.first().map(String::as_str),
            Self::Single(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// All addresses: list kept as-is, string wrapped, anything else empty.
    fn all(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Single(s) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

/// Parse a queue record into email metadata.
pub fn parse_notification(record: &QueueRecord) -> Result<EmailMetadata, PipelineError> {
    let body = record
        .body
        .as_deref()
        .ok_or_else(|| PipelineError::Validation("record has no body".to_string()))?;

    let outer: Value = serde_json::from_str(body)?;
    let inner = unwrap_envelope(outer)?;

    let notification: Notification = serde_json::from_value(inner)?;
    let (Some(mail), Some(receipt)) = (notification.mail, notification.receipt) else {
        return Err(PipelineError::Validation(
            "notification missing 'mail' or 'receipt'".to_string(),
        ));
    };

    let bucket = receipt.action.bucket_name.unwrap_or_default();
    let key = receipt.action.object_key.unwrap_or_default();
    if bucket.is_empty() || key.is_empty() {
        return Err(PipelineError::Validation(
            "notification missing blob location".to_string(),
        ));
    }

    let headers = mail.common_headers;
    let from_address = headers
        .from
        .as_ref()
        .and_then(HeaderField::first)
        .map(str::to_string)
        .or(mail.return_path)
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let to_addresses = headers
        .to
        .as_ref()
        .map(HeaderField::all)
        .unwrap_or_default();
    let subject = match headers.subject {
        Some(Value::String(s)) => s,
        _ => DEFAULT_SUBJECT.to_string(),
    };

    Ok(EmailMetadata {
        message_id: record.id().to_string(),
        from_address,
        to_addresses,
        subject,
        timestamp: mail.timestamp.unwrap_or_default(),
        blob_location: BlobLocation { bucket, key },
    })
}

/// Strip a `Notification` envelope if present.
fn unwrap_envelope(outer: Value) -> Result<Value, PipelineError> {
    let kind = outer.get("Type").or_else(|| outer.get("type"));
    let message = outer.get("Message").or_else(|| outer.get("message"));

    match (kind.and_then(Value::as_str), message) {
        (Some("Notification"), Some(Value::String(inner))) => {
            debug!("Unwrapping notification envelope");
            Ok(serde_json::from_str(inner)?)
        }
        (Some("Notification"), Some(_)) => Err(PipelineError::Validation(
            "notification envelope 'Message' is not a string".to_string(),
        )),
        _ => Ok(outer),
    }
}
