//! Email ingestion pipeline.
//!
//! Each queue record flows through:
//! 1. `parse_notification()`: delivery notification → metadata + blob location
//! 2. Blob fetch and MIME extraction
//! 3. Attachment publishing
//! 4. Prompt build and agent invocation
//!
//! Failures are recorded per record; a batch always acknowledges every record.

pub mod batch;
pub mod notification;
pub mod processor;
pub mod types;

pub use batch::{BatchSummary, process_batch, process_records};
pub use notification::parse_notification;
pub use processor::{EMPTY_BODY_SENTINEL, EmailProcessor};
