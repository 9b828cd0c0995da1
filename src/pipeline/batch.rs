//! Batch entry point: records are processed one after another and every one
//! is acknowledged.

use tracing::{error, info};

use crate::pipeline::processor::EmailProcessor;
use crate::pipeline::types::{BatchEvent, BatchResponse, ProcessingResult};

/// Per-batch tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Process every record in order. Record N+1 starts only after record N has
/// finished, agent round-trip included.
pub async fn process_batch(processor: &EmailProcessor, event: &BatchEvent) -> BatchResponse {
    let (_, summary) = process_records(processor, event).await;
    info!(
        total = summary.total,
        success = summary.succeeded,
        errors = summary.failed,
        "Batch processing complete"
    );
    BatchResponse::default()
}

/// Like [`process_batch`], returning each record's result.
pub async fn process_records(
    processor: &EmailProcessor,
    event: &BatchEvent,
) -> (Vec<ProcessingResult>, BatchSummary) {
    let total = event.records.len();
    info!(count = total, "Processing record batch");

    let mut results = Vec::with_capacity(total);
    let mut summary = BatchSummary {
        total,
        ..BatchSummary::default()
    };

    for record in &event.records {
        let result = processor.process(record).await;
        if result.success {
            summary.succeeded += 1;
            info!(%result, "Record processed");
        } else {
            summary.failed += 1;
            error!(%result, "Record failed");
        }
        results.push(result);
    }

    (results, summary)
}
