//! Blob storage: raw message fetch, attachment offload, prompt overrides.

pub mod memory;
pub mod s3;
pub mod traits;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;
pub use traits::BlobStore;
