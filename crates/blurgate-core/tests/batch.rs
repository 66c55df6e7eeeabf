//! Batch checking through mock ports.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use blurgate_core::{check_images, BlurDetector, DetectorConfig, EngineState, VerdictSource};
use blurgate_test_support::{
    MockClassifier, MockImageSource, MockProgressSink, MockVerdictSink, SyntheticFrameBuilder,
};

fn fixed_clock() -> String {
    "2024-01-01T00:00:00Z".to_string()
}

#[test]
fn batch_counts_blurry_and_skipped() {
    let source = MockImageSource::new(vec![
        SyntheticFrameBuilder::checkerboard(64, 64),
        SyntheticFrameBuilder::black(64, 64),
    ])
    .with_failure("corrupt.jpg: invalid JPEG");
    let detector = BlurDetector::unavailable(DetectorConfig::default());
    let output = MockVerdictSink::new();
    let progress = MockProgressSink::new();

    let summary = check_images(&source, &detector, &output, &progress, fixed_clock).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.blurry, 1);
    assert_eq!(summary.skipped, 1);
    assert!(summary.any_blurry());

    let records = output.records();
    assert_eq!(records.len(), 2);
    assert!(!records[0].is_blurry);
    assert!(records[1].is_blurry);
    assert_eq!(records[1].timestamp, "2024-01-01T00:00:00Z");
    assert_eq!(records[1].engine_state, EngineState::ModelUnavailable);
    assert_eq!(output.flush_count(), 1);

    assert_eq!(progress.completed_count(), 2);
    assert_eq!(progress.skipped_count(), 1);
    assert_eq!(progress.finished_counts(), Some((2, 1, 1)));
}

#[test]
fn batch_records_model_source() {
    let source = MockImageSource::new(vec![SyntheticFrameBuilder::sharp_frame()]);
    let detector = BlurDetector::with_classifier(
        Box::new(MockClassifier::new(32).with_output(&[0.05, 0.95])),
        DetectorConfig::default(),
    );
    let output = MockVerdictSink::new();
    let progress = MockProgressSink::new();

    let summary = check_images(&source, &detector, &output, &progress, fixed_clock).unwrap();

    assert!(!summary.any_blurry());
    let record = &output.records()[0];
    assert_eq!(record.engine_state, EngineState::ModelReady);
    assert!(matches!(record.source, VerdictSource::Model { .. }));
    assert!(record.blur_percentage.abs() < f64::EPSILON);
    assert_eq!(source.iteration_count(), 1);
}

#[test]
fn empty_batch_still_flushes() {
    let source = MockImageSource::empty();
    let detector = BlurDetector::unavailable(DetectorConfig::default());
    let output = MockVerdictSink::new();
    let progress = MockProgressSink::new();

    let summary = check_images(&source, &detector, &output, &progress, fixed_clock).unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(output.flush_count(), 1);
    assert_eq!(progress.finished_counts(), Some((0, 0, 0)));
}
