//! Borrowed view over a decoded capture.

use image::{RgbImage, RgbaImage};
use thiserror::Error;

/// Channel packing of a frame's pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Packed `R, G, B` bytes.
    Rgb,
    /// Packed `R, G, B, A` bytes. Alpha is ignored by every stage.
    Rgba,
}

impl PixelLayout {
    /// Bytes per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A frame could not be built from the supplied buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("frame dimensions must be positive, got {width}x{height}")]
    EmptyDimensions {
        /// Supplied width.
        width: u32,
        /// Supplied height.
        height: u32,
    },

    /// Buffer length does not match `width * height * channels`.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} {layout:?}")]
    LengthMismatch {
        /// Supplied width.
        width: u32,
        /// Supplied height.
        height: u32,
        /// Supplied layout.
        layout: PixelLayout,
        /// Required byte count.
        expected: usize,
        /// Supplied byte count.
        actual: usize,
    },
}

/// An 8-bit RGB or RGBA image borrowed for one verdict computation.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wraps a packed pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the buffer length
    /// does not match the dimensions and layout.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(layout.channels()))
            .unwrap_or(usize::MAX);

        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                layout,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Channel packing.
    #[must_use]
    pub const fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Bytes per pixel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Raw packed pixel bytes, row-major.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Red, green and blue bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the frame.
    #[must_use]
    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width as usize + x) * self.channels();
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

impl<'a> TryFrom<&'a RgbImage> for Frame<'a> {
    type Error = FrameError;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        Self::new(image.width(), image.height(), PixelLayout::Rgb, image.as_raw())
    }
}

impl<'a> TryFrom<&'a RgbaImage> for Frame<'a> {
    type Error = FrameError;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        Self::new(image.width(), image.height(), PixelLayout::Rgba, image.as_raw())
    }
}
