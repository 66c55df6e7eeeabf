//! Error kinds raised inside the verdict engine.
//!
//! Neither kind ever reaches a caller of
//! [`BlurDetector::compute_verdict`](crate::BlurDetector::compute_verdict);
//! both are logged and answered with the Laplacian fallback.

use std::path::PathBuf;

use thiserror::Error;

/// The classifier artifact could not be turned into a usable model.
///
/// Not retried: a detector that saw this error stays in
/// [`EngineState::ModelUnavailable`](crate::EngineState::ModelUnavailable).
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// The artifact file is missing or unreadable.
    #[error("failed to read model artifact {}: {source}", .path.display())]
    Read {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not a valid safetensors file.
    #[error("invalid safetensors artifact: {0}")]
    Format(#[from] safetensors::SafeTensorError),

    /// Required header metadata is missing or malformed.
    #[error("invalid model metadata: {0}")]
    Metadata(String),

    /// Tensor names, shapes or dtypes do not describe a usable classifier.
    #[error("inconsistent model layout: {0}")]
    Shape(String),

    /// The inference backend rejected the weights.
    #[error("inference backend error: {0}")]
    Backend(#[from] candle_core::Error),
}

/// A single classification failed. The engine stays usable.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// A buffer handed to the next stage has the wrong element count.
    #[error("input buffer holds {actual} values, model expects {expected}")]
    InputLength {
        /// Element count required by the model's input tensor.
        expected: usize,
        /// Element count supplied.
        actual: usize,
    },

    /// Cropping or resizing the frame failed.
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    /// The classifier returned an empty probability vector.
    #[error("classifier produced no probabilities")]
    EmptyOutput,

    /// The inference backend failed while running the model.
    #[error("inference backend error: {0}")]
    Backend(#[from] candle_core::Error),

    /// The classifier or preprocessing panicked.
    #[error("classification panicked: {0}")]
    Panicked(String),
}
