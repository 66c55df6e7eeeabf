//! Shape descriptors discovered from a loaded classifier.

use std::fmt;
use std::str::FromStr;

/// Element type of the classifier's input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputDType {
    /// 8-bit unsigned input; pixel bytes are fed unscaled.
    U8,
    /// 32-bit float input; pixels are scaled to `[0, 1]`.
    #[default]
    F32,
}

impl FromStr for InputDType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" | "uint8" => Ok(Self::U8),
            "f32" | "float32" => Ok(Self::F32),
            other => Err(format!("unsupported input dtype '{other}'")),
        }
    }
}

impl fmt::Display for InputDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => f.write_str("u8"),
            Self::F32 => f.write_str("f32"),
        }
    }
}

/// Input tensor description: `[1, size, size, channels]`, channel-interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    /// Square side `S` in pixels.
    pub size: u32,
    /// Channel count. Always 3 for supported models.
    pub channels: usize,
    /// Element type.
    pub dtype: InputDType,
}

impl InputSpec {
    /// Number of values in one input tensor.
    #[must_use]
    pub const fn element_count(&self) -> usize {
        self.size as usize * self.size as usize * self.channels
    }
}

/// Output tensor description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    /// Number of classes in the probability vector.
    pub classes: usize,
}
