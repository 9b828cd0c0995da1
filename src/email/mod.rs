//! Email content handling: MIME reconstruction and attachment offload.

pub mod attachments;
pub mod mime;

pub use attachments::AttachmentPublisher;
pub use mime::extract_content;
