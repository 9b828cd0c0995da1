//! Email processor: one queue record in, one `ProcessingResult` out.
//!
//! Flow:
//! 1. Parse the delivery notification
//! 2. Fetch the raw message from the blob store
//! 3. Extract bodies and attachments
//! 4. Publish attachments (when configured)
//! 5. Build the issue prompt and invoke the agent
//!
//! Every failure is captured in the returned result; nothing propagates to
//! the batch loop.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::context::AppContext;
use crate::email::extract_content;
use crate::error::PipelineError;
use crate::pipeline::notification::parse_notification;
use crate::pipeline::types::{EmailContent, EmailMetadata, ProcessingResult, QueueRecord};
use crate::prompts::{GITHUB_ISSUE_PROMPT, format_prompt};

/// Agent response recorded when a message has no body text.
pub const EMPTY_BODY_SENTINEL: &str = "skipped: empty body";

/// Characters kept in log previews.
const PREVIEW_CHARS: usize = 200;

/// Runs the pipeline for individual records.
pub struct EmailProcessor {
    ctx: Arc<AppContext>,
}

impl EmailProcessor {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Process one record. Never fails; the outcome is in the result.
    pub async fn process(&self, record: &QueueRecord) -> ProcessingResult {
        let message_id = record.id().to_string();
        info!(message_id = %message_id, "Processing queue record");

        let metadata = match parse_notification(record) {
            Ok(metadata) => metadata,
            Err(e) => return failure(message_id, None, e),
        };
        info!(
            message_id = %metadata.message_id,
            from = %metadata.from_address,
            subject = %metadata.subject,
            "Parsed notification"
        );

        // Metadata stays on the result even when a later stage fails.
        match self.run(&metadata).await {
            Ok(agent_response) => ProcessingResult::succeeded(message_id, metadata, agent_response),
            Err(e) => failure(message_id, Some(metadata), e),
        }
    }

    async fn run(&self, meta: &EmailMetadata) -> Result<String, PipelineError> {
        let mut content = self.fetch(meta).await?;

        self.ctx
            .attachments
            .publish(&meta.message_id, &mut content.attachments)
            .await;

        let agent_response = if content.has_content() {
            self.invoke_agent(meta, &content).await?
        } else {
            warn!(message_id = %meta.message_id, "Email body is empty, skipping agent invocation");
            EMPTY_BODY_SENTINEL.to_string()
        };

        log_success(meta, &content, &agent_response);
        Ok(agent_response)
    }

    async fn fetch(&self, meta: &EmailMetadata) -> Result<EmailContent, PipelineError> {
        let location = &meta.blob_location;
        info!(location = %location, "Fetching raw message");

        let raw = self.ctx.store.get(&location.bucket, &location.key).await?;
        debug!(bytes = raw.len(), "Fetched raw message");

        let content = extract_content(&raw);
        info!(
            text_chars = content.text_body.len(),
            html_chars = content.html_body.len(),
            attachments = content.attachments.len(),
            "Extracted content"
        );
        Ok(content)
    }

    async fn invoke_agent(
        &self,
        meta: &EmailMetadata,
        content: &EmailContent,
    ) -> Result<String, PipelineError> {
        let started = Instant::now();
        let prompt = self.build_prompt(meta, content).await?;
        let response = self.ctx.agent.invoke(&prompt, None).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Agent invocation finished"
        );
        Ok(response)
    }

    async fn build_prompt(
        &self,
        meta: &EmailMetadata,
        content: &EmailContent,
    ) -> Result<String, PipelineError> {
        let template = self.ctx.prompts.load(GITHUB_ISSUE_PROMPT).await?;
        let attachments = attachment_summary(content);

        let prompt = format_prompt(
            &template,
            &[
                ("from_address", meta.from_address.as_str()),
                ("subject", meta.subject.as_str()),
                ("body", content.body_for_agent()),
                ("timestamp", meta.timestamp.as_str()),
                ("attachments", attachments.as_str()),
            ],
        )?;
        Ok(prompt)
    }
}

/// Bullet list of published attachments, or `None` when there are none.
pub fn attachment_summary(content: &EmailContent) -> String {
    let lines: Vec<String> = content
        .published_attachments()
        .filter_map(|a| {
            a.url
                .as_ref()
                .map(|url| format!("- {} ({}): {}", a.filename, a.content_type, url))
        })
        .collect();

    if lines.is_empty() {
        "None".to_string()
    } else {
        lines.join("\n")
    }
}

fn failure(
    message_id: String,
    metadata: Option<EmailMetadata>,
    e: PipelineError,
) -> ProcessingResult {
    error!(message_id = %message_id, error = %e, "Failed to process record");
    ProcessingResult::failed(message_id, metadata, e.to_string())
}

fn log_success(meta: &EmailMetadata, content: &EmailContent, agent_response: &str) {
    info!(
        message_id = %meta.message_id,
        from = %meta.from_address,
        subject = %meta.subject,
        attachments = content.attachments.len(),
        body_preview = %preview(content.body_for_agent()),
        agent_response = %preview(agent_response),
        "Email processed successfully"
    );
}

/// First [`PREVIEW_CHARS`] characters, with `...` when truncated.
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
