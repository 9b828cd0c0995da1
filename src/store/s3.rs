//! S3-backed blob store.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, error};

use super::traits::BlobStore;
use crate::error::StorageError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Blob store over `aws-sdk-s3`.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    /// Wrap an existing client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard credential/region chain.
    ///
    /// One attempt per request: a hung or failing call is reported to the
    /// caller instead of being retried inside the SDK.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(1))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .read_timeout(READ_TIMEOUT)
                    .build(),
            )
            .load()
            .await;
        debug!(
            connect_timeout = ?CONNECT_TIMEOUT,
            read_timeout = ?READ_TIMEOUT,
            "S3 client initialized (max_attempts=1)"
        );
        Self::new(aws_sdk_s3::Client::new(&sdk_config))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetObjectError::NoSuchKey(_)) => StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                Some(service) if service.code() == Some("NoSuchBucket") => {
                    StorageError::NoSuchBucket {
                        bucket: bucket.to_string(),
                    }
                }
                _ => {
                    error!(bucket, key, "S3 get_object failed: {}", DisplayErrorContext(&e));
                    StorageError::Transport(DisplayErrorContext(&e).to_string())
                }
            })?;

        let body = output.body.collect().await.map_err(|e| {
            error!(bucket, key, error = %e, "Failed to read S3 object body");
            StorageError::Transport(format!("reading s3://{bucket}/{key}: {e}"))
        })?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service) if service.code() == Some("NoSuchBucket") => {
                    StorageError::NoSuchBucket {
                        bucket: bucket.to_string(),
                    }
                }
                _ => StorageError::Transport(DisplayErrorContext(&e).to_string()),
            })?;
        Ok(())
    }
}
