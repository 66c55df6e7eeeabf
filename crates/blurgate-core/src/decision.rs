//! Threshold rules turning evidence into a blur verdict.

use crate::domain::Probabilities;

/// Classifier probability thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityThresholds {
    /// Blur probability at or above which a frame is blurry.
    pub blur: f32,
    /// Sharp probability below which a frame is blurry.
    pub sharp: f32,
}

impl Default for ProbabilityThresholds {
    fn default() -> Self {
        Self {
            blur: 0.99,
            sharp: 0.1,
        }
    }
}

/// Laplacian score thresholds for the two fallback situations.
///
/// The two paths have historically used different values; both are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackThresholds {
    /// Used when a loaded classifier failed on this frame.
    pub inference_failure: f64,
    /// Used when no classifier is loaded.
    pub model_unavailable: f64,
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            inference_failure: 150.0,
            model_unavailable: 50.0,
        }
    }
}

/// Blurry when the blur class is near certain or the sharp class is unlikely.
#[must_use]
pub fn is_blurry(probabilities: &Probabilities, thresholds: &ProbabilityThresholds) -> bool {
    probabilities.blur() >= thresholds.blur || probabilities.sharp() < thresholds.sharp
}

/// Blurry when the Laplacian score falls below `threshold`.
#[must_use]
pub fn is_blurry_score(score: f64, threshold: f64) -> bool {
    score < threshold
}
