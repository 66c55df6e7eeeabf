//! Check result types.

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{EngineState, Frame, FrameError, Verdict, VerdictSource};

/// Complete check result for a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Path to the checked image.
    pub path: String,
    /// Timestamp of the check (RFC 3339).
    pub timestamp: String,
    /// Image dimensions.
    pub dimensions: ImageDimensions,
    /// Canonical verdict.
    pub is_blurry: bool,
    /// Legacy percentage view, `0.0` or `100.0`.
    pub blur_percentage: f64,
    /// Evidence behind the verdict.
    pub source: VerdictSource,
    /// Detector state at the time of the check.
    pub engine_state: EngineState,
}

impl CheckRecord {
    /// Builds a record from a verdict.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        timestamp: impl Into<String>,
        dimensions: ImageDimensions,
        verdict: &Verdict,
        engine_state: EngineState,
    ) -> Self {
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            dimensions,
            is_blurry: verdict.is_blurry,
            blur_percentage: verdict.blur_percentage(),
            source: verdict.source.clone(),
            engine_state,
        }
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates dimensions from width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone)]
enum Pixels {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

/// A decoded image, normalized to 8-bit RGB or RGBA.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path to the image file.
    pub path: String,
    pixels: Pixels,
}

impl ImageInfo {
    /// Converts a decoded image, keeping alpha only when present.
    #[must_use]
    pub fn new(path: impl Into<String>, image: DynamicImage) -> Self {
        let pixels = match image {
            DynamicImage::ImageRgb8(rgb) => Pixels::Rgb(rgb),
            DynamicImage::ImageRgba8(rgba) => Pixels::Rgba(rgba),
            other if other.color().has_alpha() => Pixels::Rgba(other.into_rgba8()),
            other => Pixels::Rgb(other.into_rgb8()),
        };
        Self {
            path: path.into(),
            pixels,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        match &self.pixels {
            Pixels::Rgb(img) => img.width(),
            Pixels::Rgba(img) => img.width(),
        }
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        match &self.pixels {
            Pixels::Rgb(img) => img.height(),
            Pixels::Rgba(img) => img.height(),
        }
    }

    /// Image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width(), self.height())
    }

    /// Borrows the pixels as a frame.
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized images.
    pub fn frame(&self) -> Result<Frame<'_>, FrameError> {
        match &self.pixels {
            Pixels::Rgb(img) => Frame::try_from(img),
            Pixels::Rgba(img) => Frame::try_from(img),
        }
    }

    /// Returns a copy of the pixels as a dynamic image.
    #[must_use]
    pub fn to_dynamic(&self) -> DynamicImage {
        match &self.pixels {
            Pixels::Rgb(img) => DynamicImage::ImageRgb8(img.clone()),
            Pixels::Rgba(img) => DynamicImage::ImageRgba8(img.clone()),
        }
    }
}
