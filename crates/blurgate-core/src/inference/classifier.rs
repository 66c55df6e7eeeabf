//! Classifier port used by the detector.

use crate::domain::{InputSpec, OutputSpec, Probabilities};
use crate::error::InferenceError;

/// A loaded two-class blur classifier.
///
/// Specs are fixed for the lifetime of the value. `infer` takes `&mut self`
/// so implementations may keep per-call state; the detector serializes calls.
pub trait Classifier: Send {
    /// Shape and element type of the input tensor.
    fn input_spec(&self) -> InputSpec;

    /// Shape of the output probability vector.
    fn output_spec(&self) -> OutputSpec;

    /// Runs one forward pass over a normalized `S * S * 3` buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length is wrong or the backend fails.
    fn infer(&mut self, input: &[f32]) -> Result<Probabilities, InferenceError>;
}
