//! Test support utilities for blurgate.
//!
//! Provides mocks, synthetic frame builders, and classifier artifacts for
//! testing the verdict pipeline.
//!
//! # Example
//!
//! ```
//! use blurgate_core::{BlurDetector, DetectorConfig};
//! use blurgate_test_support::{MockClassifier, SyntheticFrameBuilder};
//!
//! let classifier = MockClassifier::new(32).with_output(&[0.995, 0.005]);
//! let detector = BlurDetector::with_classifier(Box::new(classifier), DetectorConfig::default());
//!
//! let image = SyntheticFrameBuilder::checkerboard(64, 64);
//! let frame = image.frame().expect("valid frame");
//! assert!(detector.compute_verdict(&frame).is_blurry);
//! ```

mod artifact;
mod builders;
mod mocks;

pub use artifact::{ClassifierArtifactBuilder, BLURRY_BIAS, SHARP_BIAS};
pub use builders::SyntheticFrameBuilder;
pub use mocks::{
    CallLog, InferCall, MockClassifier, MockImageSource, MockProgressSink, MockVerdictSink,
};
