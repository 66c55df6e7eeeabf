//! ML inference engine using Candle.
//!
//! Provides the [`Classifier`] port and its candle implementation, plus
//! safetensors loading and device selection.

mod candle_classifier;
mod classifier;
mod device;
mod loader;

pub use candle_classifier::CandleClassifier;
pub use classifier::Classifier;
pub use device::get_device;
pub use loader::WeightFile;
