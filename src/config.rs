//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default prompt cache TTL: 5 minutes.
pub const DEFAULT_PROMPT_CACHE_TTL_SECS: u64 = 300;

/// Default attachment ceiling in MiB.
pub const DEFAULT_ATTACHMENT_MAX_SIZE_MB: u64 = 20;

const DEFAULT_AGENT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_AGENT_READ_TIMEOUT_SECS: u64 = 120;

/// Full handler configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub prompts: PromptConfig,
    /// `None` when attachment upload is disabled.
    pub attachments: Option<AttachmentConfig>,
    /// Deployment environment tag (`dev`, `prod`, ...).
    pub environment: String,
}

/// Agent runtime connection settings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Invocation URL of the agent runtime.
    pub endpoint: reqwest::Url,
    /// Optional bearer token.
    pub api_token: Option<SecretString>,
    pub connect_timeout: Duration,
    /// Upper bound for the whole request, response body included.
    pub read_timeout: Duration,
}

/// Prompt template sources.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub cache_ttl: Duration,
    /// Remote override bucket; remote lookup is skipped when unset.
    pub bucket: Option<String>,
    pub key_prefix: String,
    /// Directory holding the packaged templates.
    pub local_dir: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_PROMPT_CACHE_TTL_SECS),
            bucket: None,
            key_prefix: "prompts/".to_string(),
            local_dir: PathBuf::from("prompts"),
        }
    }
}

/// Attachment offload settings. Only built when both the bucket and the
/// public domain are set.
#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    pub bucket: String,
    pub public_domain: String,
    pub max_size_bytes: u64,
    pub environment: String,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoint_raw = get("AGENT_ENDPOINT_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("AGENT_ENDPOINT_URL".to_string()))?;
        let endpoint =
            reqwest::Url::parse(&endpoint_raw).map_err(|e| ConfigError::InvalidValue {
                key: "AGENT_ENDPOINT_URL".to_string(),
                message: e.to_string(),
            })?;

        let agent = AgentConfig {
            endpoint,
            api_token: get("AGENT_API_TOKEN").map(SecretString::from),
            connect_timeout: Duration::from_secs(parse_or(
                get("AGENT_CONNECT_TIMEOUT_SECS"),
                "AGENT_CONNECT_TIMEOUT_SECS",
                DEFAULT_AGENT_CONNECT_TIMEOUT_SECS,
            )?),
            read_timeout: Duration::from_secs(parse_or(
                get("AGENT_READ_TIMEOUT_SECS"),
                "AGENT_READ_TIMEOUT_SECS",
                DEFAULT_AGENT_READ_TIMEOUT_SECS,
            )?),
        };

        let prompt_defaults = PromptConfig::default();
        let prompts = PromptConfig {
            cache_ttl: Duration::from_secs(parse_or(
                get("PROMPT_CACHE_TTL"),
                "PROMPT_CACHE_TTL",
                DEFAULT_PROMPT_CACHE_TTL_SECS,
            )?),
            bucket: get("PROMPT_BUCKET"),
            key_prefix: get("PROMPT_KEY_PREFIX").unwrap_or(prompt_defaults.key_prefix),
            local_dir: get("PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(prompt_defaults.local_dir),
        };

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());

        let max_size_mb = parse_or(
            get("ATTACHMENT_MAX_SIZE_MB"),
            "ATTACHMENT_MAX_SIZE_MB",
            DEFAULT_ATTACHMENT_MAX_SIZE_MB,
        )?;
        let attachments = match (get("ATTACHMENTS_S3_BUCKET"), get("ATTACHMENTS_CLOUDFRONT_DOMAIN"))
        {
            (Some(bucket), Some(public_domain)) => Some(AttachmentConfig {
                bucket,
                public_domain,
                max_size_bytes: max_size_mb * 1024 * 1024,
                environment: environment.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            agent,
            prompts,
            attachments,
            environment,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}': {e}"),
        }),
    }
}
