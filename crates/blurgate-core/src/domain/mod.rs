//! Core domain types for blur verdicts.

mod frame;
mod model;
mod result;
mod verdict;

pub use frame::{Frame, FrameError, PixelLayout};
pub use model::{InputDType, InputSpec, OutputSpec};
pub use result::{CheckRecord, ImageDimensions, ImageInfo};
pub use verdict::{EngineState, FallbackReason, Probabilities, Verdict, VerdictSource};
