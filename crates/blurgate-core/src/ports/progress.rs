//! Progress reporting port for UI integration.

use crate::domain::CheckRecord;

/// Events emitted during a batch check for progress tracking.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Checking started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// An image received its verdict.
    Completed {
        /// The check record.
        record: CheckRecord,
    },
    /// An image was skipped due to an error.
    Skipped {
        /// Path to the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All images have been processed.
    Finished {
        /// Total images checked successfully.
        processed: usize,
        /// Images judged blurry.
        blurry: usize,
        /// Total images skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
