//! Attachment offload: uploads payloads to the blob store and records the
//! public URL on each attachment.
//!
//! Never fails the pipeline: oversized files are skipped and upload errors
//! are logged, leaving `url` unset.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::AttachmentConfig;
use crate::pipeline::types::Attachment;
use crate::store::BlobStore;

/// Publishes attachments under `attachments/{env}/{message_id}/{filename}`.
pub struct AttachmentPublisher {
    store: Arc<dyn BlobStore>,
    config: Option<AttachmentConfig>,
}

impl AttachmentPublisher {
    /// `config` is `None` when upload is disabled.
    pub fn new(store: Arc<dyn BlobStore>, config: Option<AttachmentConfig>) -> Self {
        Self { store, config }
    }

    /// Both a destination bucket and a public domain are configured.
    pub fn is_configured(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| !c.bucket.is_empty() && !c.public_domain.is_empty())
    }

    /// Upload every attachment that still holds content.
    ///
    /// On success `url` is set and `content` dropped. Returns the number of
    /// attachments uploaded.
    pub async fn publish(&self, message_id: &str, attachments: &mut [Attachment]) -> usize {
        let Some(config) = self.config.as_ref().filter(|_| self.is_configured()) else {
            info!("Attachment upload not configured, skipping");
            return 0;
        };
        if attachments.is_empty() {
            return 0;
        }

        info!(count = attachments.len(), "Uploading attachments");
        let mut uploaded = 0;
        for attachment in attachments.iter_mut() {
            if self.publish_one(config, message_id, attachment).await {
                uploaded += 1;
            }
        }
        info!(uploaded, total = attachments.len(), "Attachment upload finished");
        uploaded
    }

    async fn publish_one(
        &self,
        config: &AttachmentConfig,
        message_id: &str,
        attachment: &mut Attachment,
    ) -> bool {
        if attachment.content.is_none() {
            warn!(filename = %attachment.filename, "Attachment has no content, skipping");
            return false;
        }
        if attachment.size_bytes > config.max_size_bytes {
            warn!(
                filename = %attachment.filename,
                size = attachment.size_bytes,
                limit = config.max_size_bytes,
                "Attachment too large, skipping"
            );
            return false;
        }

        let key = attachment_key(&config.environment, message_id, &attachment.filename);
        let Some(body) = attachment.content.take() else {
            return false;
        };

        // Restored below if the upload fails.
        match self
            .store
            .put(&config.bucket, &key, body.clone(), &attachment.content_type)
            .await
        {
            Ok(()) => {
                let url = format!("https://{}/{}", config.public_domain, key);
                info!(filename = %attachment.filename, url = %url, "Uploaded attachment");
                attachment.url = Some(url);
                true
            }
            Err(e) => {
                error!(filename = %attachment.filename, error = %e, "Failed to upload attachment");
                attachment.content = Some(body);
                false
            }
        }
    }
}

/// Object key for an attachment.
pub fn attachment_key(environment: &str, message_id: &str, filename: &str) -> String {
    format!(
        "attachments/{}/{}/{}",
        environment,
        sanitize_key_segment(message_id),
        sanitize_key_segment(filename)
    )
}

/// Make a value safe as a single key/URL path segment: strip surrounding
/// angle brackets, replace `/ \ # ? & %` with `_`, drop control characters.
pub fn sanitize_key_segment(value: &str) -> String {
    value
        .trim_matches(|c: char| c == '<' || c == '>')
        .chars()
        .filter(|c| !c.is_ascii_control())
        .map(|c| match c {
            '/' | '\\' | '#' | '?' | '&' | '%' => '_',
            other => other,
        })
        .collect()
}
