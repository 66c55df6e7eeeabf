//! Batch checking over the image, output and progress ports.

use anyhow::Result;
use tracing::{debug, warn};

use crate::detector::BlurDetector;
use crate::domain::CheckRecord;
use crate::ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Images that received a verdict.
    pub processed: usize,
    /// Images judged blurry.
    pub blurry: usize,
    /// Images that could not be loaded or framed.
    pub skipped: usize,
}

impl CheckSummary {
    /// Returns true if any image was judged blurry.
    #[must_use]
    pub const fn any_blurry(&self) -> bool {
        self.blurry > 0
    }
}

/// Computes a verdict for every image in `source`.
///
/// Load and frame failures are reported as skipped and do not stop the batch.
/// `timestamp` is called once per record.
///
/// # Errors
///
/// Returns an error only if writing or flushing `output` fails.
pub fn check_images(
    source: &dyn ImageSource,
    detector: &BlurDetector,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
    timestamp: impl Fn() -> String,
) -> Result<CheckSummary> {
    let total = source.count_hint();
    let mut summary = CheckSummary::default();

    for (index, item) in source.images().enumerate() {
        let image = match item {
            Ok(image) => image,
            Err(e) => {
                // The error message carries the path via anyhow context.
                warn!("Skipping image {index}: {e:#}");
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("image {index}"),
                    reason: format!("{e:#}"),
                });
                summary.skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: image.path.clone(),
            index,
            total,
        });

        let frame = match image.frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping {}: {e}", image.path);
                progress.on_event(ProgressEvent::Skipped {
                    path: image.path.clone(),
                    reason: e.to_string(),
                });
                summary.skipped += 1;
                continue;
            }
        };

        let verdict = detector.compute_verdict(&frame);
        debug!(path = %image.path, is_blurry = verdict.is_blurry, "Checked image");

        let record = CheckRecord::new(
            image.path.clone(),
            timestamp(),
            image.dimensions(),
            &verdict,
            detector.state(),
        );
        output.write(&record)?;

        summary.processed += 1;
        if record.is_blurry {
            summary.blurry += 1;
        }
        progress.on_event(ProgressEvent::Completed { record });
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished {
        processed: summary.processed,
        blurry: summary.blurry,
        skipped: summary.skipped,
    });

    Ok(summary)
}
