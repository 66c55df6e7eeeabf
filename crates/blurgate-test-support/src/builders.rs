//! Synthetic frame builders for testing.

use blurgate_core::domain::ImageInfo;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

/// Builder for creating synthetic test frames.
///
/// Sharp patterns score far above both fallback thresholds; flat and smooth
/// ones score at or near zero.
pub struct SyntheticFrameBuilder;

impl SyntheticFrameBuilder {
    // === Sharp Frames ===

    /// Creates a high-contrast checkerboard pattern (very sharp edges).
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> ImageInfo {
        Self::checkerboard_with_cell_size(width, height, 1)
    }

    /// Creates a checkerboard with custom cell size.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> ImageInfo {
        let cell = cell_size.max(1);
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        ImageInfo::new("synthetic://checkerboard", DynamicImage::ImageLuma8(img))
    }

    /// Creates an RGBA checkerboard with varying alpha.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rgba_checkerboard(width: u32, height: u32) -> ImageInfo {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            Rgba([v, v, v, ((x * 7 + y) % 256) as u8])
        });
        ImageInfo::new("synthetic://rgba_checkerboard", DynamicImage::ImageRgba8(img))
    }

    // === Blurry Frames ===

    /// Creates a uniform gray frame (no edges, simulates severe blur).
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> ImageInfo {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        ImageInfo::new("synthetic://uniform_gray", DynamicImage::ImageLuma8(img))
    }

    /// Creates an all-black RGB frame.
    #[must_use]
    pub fn black(width: u32, height: u32) -> ImageInfo {
        Self::rgb_uniform(width, height, 0, 0, 0)
    }

    /// Creates a smooth horizontal gradient (low variance, simulates defocus).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Luma([val])
        });
        ImageInfo::new(
            "synthetic://horizontal_gradient",
            DynamicImage::ImageLuma8(img),
        )
    }

    // === Special Frames ===

    /// Creates a 1x1 pixel frame (edge case).
    #[must_use]
    pub fn single_pixel(value: u8) -> ImageInfo {
        Self::rgb_uniform(1, 1, value, value, value)
    }

    /// Creates an RGB color frame.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> ImageInfo {
        let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        ImageInfo::new("synthetic://rgb_uniform", DynamicImage::ImageRgb8(img))
    }
}

/// Convenience functions for common test frames.
impl SyntheticFrameBuilder {
    /// Returns a standard sharp frame (224x224 checkerboard).
    #[must_use]
    pub fn sharp_frame() -> ImageInfo {
        Self::checkerboard(224, 224)
    }

    /// Returns a standard blurry frame (224x224 black).
    #[must_use]
    pub fn blurry_frame() -> ImageInfo {
        Self::black(224, 224)
    }
}
