//! Blurgate Core - blur verdict engine
//!
//! Decides whether a captured frame is blurry. Frames are squared and resized
//! ([`preprocess`]), range-normalized ([`normalize`]) and classified by a
//! candle model ([`inference`]); the probabilities are thresholded
//! ([`decision`]). When no model is loaded or a classification fails, a
//! Laplacian-variance score ([`fallback`]) decides instead. [`BlurDetector`]
//! ties the stages together and never fails; [`batch`] drives it over the
//! [`ports`].

pub mod batch;
pub mod decision;
pub mod detector;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod inference;
pub mod normalize;
pub mod ports;
pub mod preprocess;

pub use batch::{check_images, CheckSummary};
pub use decision::{FallbackThresholds, ProbabilityThresholds};
pub use detector::{BlurDetector, DetectorConfig};
pub use domain::{
    CheckRecord, EngineState, FallbackReason, Frame, FrameError, ImageDimensions, ImageInfo,
    InputDType, InputSpec, OutputSpec, PixelLayout, Probabilities, Verdict, VerdictSource,
};
pub use error::{InferenceError, ModelLoadError};
pub use inference::{CandleClassifier, Classifier};
pub use ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};
pub use preprocess::SquareMode;
