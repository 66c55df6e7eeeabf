//! Verdict types produced by the detector.

use serde::{Deserialize, Serialize};

/// Class probabilities produced by the classifier.
///
/// Index 0 is the blur probability, index 1 the sharp probability. Missing
/// entries read as `0.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Probabilities(Vec<f32>);

impl Probabilities {
    /// Wraps a raw probability vector.
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Probability that the frame is blurry.
    #[must_use]
    pub fn blur(&self) -> f32 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Probability that the frame is sharp.
    #[must_use]
    pub fn sharp(&self) -> f32 {
        self.0.get(1).copied().unwrap_or(0.0)
    }

    /// Number of classes present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the classifier produced no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values in class order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for Probabilities {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Why the Laplacian fallback produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No classifier was loaded.
    ModelUnavailable,
    /// The classifier was loaded but this call failed.
    InferenceFailed,
}

/// What produced a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerdictSource {
    /// The classifier's probabilities.
    Model {
        /// Blur class probability.
        blur_probability: f32,
        /// Sharp class probability.
        sharp_probability: f32,
    },
    /// The Laplacian-variance fallback.
    Fallback {
        /// Laplacian variance of the frame.
        score: f64,
        /// Threshold the score was compared against.
        threshold: f64,
        /// Why the classifier was not used.
        reason: FallbackReason,
    },
}

/// The blur decision for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Canonical outcome.
    pub is_blurry: bool,
    /// Evidence behind the outcome.
    pub source: VerdictSource,
}

impl Verdict {
    /// Verdict backed by classifier output.
    #[must_use]
    pub fn from_model(is_blurry: bool, probabilities: &Probabilities) -> Self {
        Self {
            is_blurry,
            source: VerdictSource::Model {
                blur_probability: probabilities.blur(),
                sharp_probability: probabilities.sharp(),
            },
        }
    }

    /// Verdict backed by the Laplacian fallback.
    #[must_use]
    pub const fn from_fallback(
        is_blurry: bool,
        score: f64,
        threshold: f64,
        reason: FallbackReason,
    ) -> Self {
        Self {
            is_blurry,
            source: VerdictSource::Fallback {
                score,
                threshold,
                reason,
            },
        }
    }

    /// Legacy percentage view: `100.0` when blurry, `0.0` otherwise.
    ///
    /// No intermediate values are ever produced.
    #[must_use]
    pub const fn blur_percentage(&self) -> f64 {
        if self.is_blurry {
            100.0
        } else {
            0.0
        }
    }

    /// Returns true if the classifier produced this verdict.
    #[must_use]
    pub const fn used_model(&self) -> bool {
        matches!(self.source, VerdictSource::Model { .. })
    }
}

/// Whether a detector holds a usable classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No classifier; every verdict comes from the fallback.
    ModelUnavailable,
    /// Classifier loaded and in use.
    ModelReady,
}
