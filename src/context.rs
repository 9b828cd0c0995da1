//! Process-wide context: clients and caches built once and reused across
//! every batch the process handles.

use std::sync::Arc;

use tracing::info;

use crate::agent::{AgentInvoker, AgentTransport, HttpAgentTransport};
use crate::config::AppConfig;
use crate::email::AttachmentPublisher;
use crate::error::ConfigError;
use crate::prompts::PromptStore;
use crate::store::{BlobStore, S3BlobStore};

/// Shared dependencies for the pipeline.
pub struct AppContext {
    pub store: Arc<dyn BlobStore>,
    pub prompts: PromptStore,
    pub attachments: AttachmentPublisher,
    pub agent: AgentInvoker,
}

impl AppContext {
    /// Wire a context from explicit parts.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn BlobStore>,
        transport: Arc<dyn AgentTransport>,
    ) -> Self {
        Self {
            prompts: PromptStore::from_config(&config.prompts, Arc::clone(&store)),
            attachments: AttachmentPublisher::new(Arc::clone(&store), config.attachments.clone()),
            agent: AgentInvoker::new(transport),
            store,
        }
    }

    /// Production wiring: S3 blob store and HTTP agent transport.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let store: Arc<dyn BlobStore> = Arc::new(S3BlobStore::from_env().await);
        let transport: Arc<dyn AgentTransport> = Arc::new(HttpAgentTransport::new(&config.agent)?);

        info!(
            endpoint = %config.agent.endpoint,
            environment = %config.environment,
            prompt_bucket = config.prompts.bucket.as_deref().unwrap_or("-"),
            attachments_enabled = config.attachments.is_some(),
            "Context initialized"
        );

        Ok(Self::new(config, store, transport))
    }
}
