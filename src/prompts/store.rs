//! Prompt template loading.
//!
//! Lookup order: in-memory cache (while younger than the TTL) → remote
//! override bucket (if configured) → local template directory. Remote errors
//! of any kind fall through to the local directory; only a template missing
//! locally as well is an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::PromptConfig;
use crate::error::PromptError;
use crate::store::BlobStore;

#[derive(Debug, Clone)]
struct CachedPrompt {
    content: String,
    loaded_at: Instant,
}

/// Remote override location.
struct RemoteSource {
    store: Arc<dyn BlobStore>,
    bucket: String,
    key_prefix: String,
}

/// Cached prompt template loader. One instance lives for the whole process.
pub struct PromptStore {
    remote: Option<RemoteSource>,
    local_dir: PathBuf,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedPrompt>>,
}

impl PromptStore {
    /// Local-only store.
    pub fn new(local_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            remote: None,
            local_dir: local_dir.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Add a remote override bucket, consulted before the local directory.
    pub fn with_remote(
        mut self,
        store: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        self.remote = Some(RemoteSource {
            store,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
        });
        self
    }

    /// Build from configuration; the remote source is only attached when a
    /// bucket is configured.
    pub fn from_config(config: &PromptConfig, store: Arc<dyn BlobStore>) -> Self {
        let prompts = Self::new(config.local_dir.clone(), config.cache_ttl);
        match &config.bucket {
            Some(bucket) => prompts.with_remote(store, bucket.clone(), config.key_prefix.clone()),
            None => prompts,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load a named template.
    pub async fn load(&self, name: &str) -> Result<String, PromptError> {
        if let Some(cached) = self.cache.lock().await.get(name) {
            let age = cached.loaded_at.elapsed();
            if age < self.ttl {
                debug!(prompt = name, age_secs = age.as_secs(), "Using cached prompt");
                return Ok(cached.content.clone());
            }
            info!(
                prompt = name,
                age_secs = age.as_secs(),
                ttl_secs = self.ttl.as_secs(),
                "Prompt cache expired, reloading"
            );
        }

        let content = match self.load_remote(name).await {
            Some(content) => content,
            None => self.load_local(name).await?,
        };

        self.cache.lock().await.insert(
            name.to_string(),
            CachedPrompt {
                content: content.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(content)
    }

    /// Drop every cached template; the next `load` goes back to the sources.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
        info!("Prompt cache cleared");
    }

    /// Number of cached templates.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn load_remote(&self, name: &str) -> Option<String> {
        let remote = self.remote.as_ref()?;
        let key = format!("{}{}", remote.key_prefix, name);
        match remote.store.get_text(&remote.bucket, &key).await {
            Ok(content) => {
                info!(prompt = name, bucket = %remote.bucket, key = %key, chars = content.len(), "Using remote prompt override");
                Some(content)
            }
            Err(e) => {
                info!(prompt = name, error = %e, "Remote prompt override not available, falling back to local");
                None
            }
        }
    }

    async fn load_local(&self, name: &str) -> Result<String, PromptError> {
        let path = self.local_dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(prompt = name, path = %path.display(), chars = content.len(), "Loaded local prompt");
                Ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(prompt = name, path = %path.display(), "Prompt not found");
                Err(PromptError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(PromptError::Io(e)),
        }
    }
}
