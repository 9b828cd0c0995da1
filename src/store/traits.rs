//! `BlobStore` trait: the single async interface to object storage.

use async_trait::async_trait;

use crate::error::StorageError;

/// Bucket/key addressed object storage.
///
/// Implementations must report a missing object as [`StorageError::NotFound`]
/// and a missing bucket as [`StorageError::NoSuchBucket`]; callers rely on the
/// distinction for error messages.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the full object body.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store an object, replacing any existing one.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Fetch an object and decode it as UTF-8 (invalid bytes are replaced).
    async fn get_text(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        let bytes = self.get(bucket, key).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}
