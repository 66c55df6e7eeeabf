//! Frame preparation for the classifier input tensor.
//!
//! A frame is first fitted to a square window, then bilinearly resized to the
//! model's `S x S` input when the window is not already that size. Alpha is
//! dropped; the pixel value range is left untouched.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

use crate::domain::Frame;
use crate::error::InferenceError;

const OUT_CHANNELS: usize = 3;

/// How a frame is fitted to a square before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareMode {
    /// Centre crop each axis longer than `S`, zero pad each shorter one.
    ///
    /// The window is already `S x S`, so the resize is a no-op: frames
    /// larger than `S` lose their border and are never downscaled.
    #[default]
    CropOrPad,
    /// Centre crop to the shorter side, then resize to `S`.
    CenterCrop,
}

/// Produces `S x S x 3` byte buffers from arbitrary frames.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    size: u32,
    mode: SquareMode,
    square: Vec<u8>,
}

impl Preprocessor {
    /// Creates a preprocessor for a model input side of `size`.
    #[must_use]
    pub const fn new(size: u32, mode: SquareMode) -> Self {
        Self {
            size,
            mode,
            square: Vec::new(),
        }
    }

    /// Current target side `S`.
    #[must_use]
    pub const fn target_size(&self) -> u32 {
        self.size
    }

    /// Square fitting mode.
    #[must_use]
    pub const fn mode(&self) -> SquareMode {
        self.mode
    }

    /// Changes the target side.
    pub fn reconfigure(&mut self, size: u32) {
        if size != self.size {
            tracing::debug!(from = self.size, to = size, "Reconfiguring preprocessor");
            self.size = size;
        }
    }

    /// Writes exactly `S * S * 3` bytes for `frame` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Preprocess`] if the target size is zero or
    /// the intermediate square cannot be viewed as an image.
    pub fn run(&mut self, frame: &Frame<'_>, out: &mut Vec<u8>) -> Result<(), InferenceError> {
        if self.size == 0 {
            return Err(InferenceError::Preprocess(
                "target size must be positive".to_string(),
            ));
        }

        let side = match self.mode {
            SquareMode::CropOrPad => self.size,
            SquareMode::CenterCrop => frame.width().min(frame.height()),
        };

        if side == self.size {
            fit_square(frame, side, out);
            return Ok(());
        }

        fit_square(frame, side, &mut self.square);
        let view = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(side, side, self.square.as_slice())
            .ok_or_else(|| {
                InferenceError::Preprocess(format!("square buffer does not hold {side}x{side} RGB"))
            })?;
        let resized = imageops::resize(&view, self.size, self.size, FilterType::Triangle);

        out.clear();
        out.extend_from_slice(resized.as_raw());
        Ok(())
    }
}

/// Copies the centred `side x side` window of `frame` into `dst` as RGB,
/// padding with black where the frame is smaller.
fn fit_square(frame: &Frame<'_>, side: u32, dst: &mut Vec<u8>) {
    let side = side as usize;
    let width = frame.width() as usize;
    let channels = frame.channels();

    dst.clear();
    dst.resize(side * side * OUT_CHANNELS, 0);

    let (src_x, dst_x, span_x) = axis_window(width, side);
    let (src_y, dst_y, span_y) = axis_window(frame.height() as usize, side);
    let data = frame.data();

    for row in 0..span_y {
        let src_start = ((src_y + row) * width + src_x) * channels;
        let dst_start = ((dst_y + row) * side + dst_x) * OUT_CHANNELS;
        let src_row = &data[src_start..src_start + span_x * channels];
        let dst_row = &mut dst[dst_start..dst_start + span_x * OUT_CHANNELS];

        for (d, s) in dst_row
            .chunks_exact_mut(OUT_CHANNELS)
            .zip(src_row.chunks_exact(channels))
        {
            d.copy_from_slice(&s[..OUT_CHANNELS]);
        }
    }
}

/// Returns `(source offset, destination offset, span)` for one axis.
const fn axis_window(extent: usize, side: usize) -> (usize, usize, usize) {
    if extent >= side {
        ((extent - side) / 2, 0, side)
    } else {
        (0, (side - extent) / 2, extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelLayout;
    use proptest::prelude::*;

    fn pixel(buf: &[u8], side: usize, x: usize, y: usize) -> [u8; 3] {
        let i = (y * side + x) * 3;
        [buf[i], buf[i + 1], buf[i + 2]]
    }

    #[test]
    fn test_axis_window() {
        assert_eq!(axis_window(10, 4), (3, 0, 4));
        assert_eq!(axis_window(4, 4), (0, 0, 4));
        assert_eq!(axis_window(1, 4), (0, 1, 1));
    }

    #[test]
    fn test_small_frame_is_padded_with_black() {
        let data = [255u8, 255, 255];
        let frame = Frame::new(1, 1, PixelLayout::Rgb, &data).expect("frame");
        let mut pre = Preprocessor::new(4, SquareMode::CropOrPad);
        let mut out = Vec::new();
        pre.run(&frame, &mut out).expect("preprocess");

        assert_eq!(out.len(), 4 * 4 * 3);
        assert_eq!(pixel(&out, 4, 1, 1), [255, 255, 255]);
        let lit = out.iter().filter(|&&b| b != 0).count();
        assert_eq!(lit, 3, "only the centre pixel should be non-black");
    }

    #[test]
    fn test_large_frame_is_center_cropped() {
        // 6x6 frame, pixel value encodes x + 10*y.
        let data: Vec<u8> = (0..36u8)
            .flat_map(|i| {
                let v = (i % 6) + 10 * (i / 6);
                [v, v, v]
            })
            .collect();
        let frame = Frame::new(6, 6, PixelLayout::Rgb, &data).expect("frame");
        let mut pre = Preprocessor::new(2, SquareMode::CropOrPad);
        let mut out = Vec::new();
        pre.run(&frame, &mut out).expect("preprocess");

        assert_eq!(pixel(&out, 2, 0, 0), [22, 22, 22]);
        assert_eq!(pixel(&out, 2, 1, 1), [33, 33, 33]);
    }

    #[test]
    fn test_crop_or_pad_crops_without_downscaling() {
        // 8x8 frame: white 2-pixel border around a black 4x4 centre.
        let data: Vec<u8> = (0..64u32)
            .flat_map(|i| {
                let (x, y) = (i % 8, i / 8);
                let border = !(2..6).contains(&x) || !(2..6).contains(&y);
                [if border { 255 } else { 0 }; 3]
            })
            .collect();
        let frame = Frame::new(8, 8, PixelLayout::Rgb, &data).expect("frame");
        let mut out = Vec::new();

        let mut crop_or_pad = Preprocessor::new(4, SquareMode::CropOrPad);
        crop_or_pad.run(&frame, &mut out).expect("preprocess");
        assert!(out.iter().all(|&b| b == 0), "border is cropped away");

        let mut center_crop = Preprocessor::new(4, SquareMode::CenterCrop);
        center_crop.run(&frame, &mut out).expect("preprocess");
        assert!(out.iter().any(|&b| b > 0), "downscaling keeps the border");
    }

    #[test]
    fn test_alpha_is_dropped() {
        let data = [10u8, 20, 30, 99];
        let frame = Frame::new(1, 1, PixelLayout::Rgba, &data).expect("frame");
        let mut pre = Preprocessor::new(1, SquareMode::CropOrPad);
        let mut out = Vec::new();
        pre.run(&frame, &mut out).expect("preprocess");
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[test]
    fn test_center_crop_resizes_uniform_frame() {
        let data = vec![200u8; 40 * 20 * 3];
        let frame = Frame::new(40, 20, PixelLayout::Rgb, &data).expect("frame");
        let mut pre = Preprocessor::new(8, SquareMode::CenterCrop);
        let mut out = Vec::new();
        pre.run(&frame, &mut out).expect("preprocess");

        assert_eq!(out.len(), 8 * 8 * 3);
        assert!(out.iter().all(|&b| b.abs_diff(200) <= 1));
    }

    #[test]
    fn test_reconfigure_changes_output_size() {
        let data = vec![0u8; 5 * 5 * 3];
        let frame = Frame::new(5, 5, PixelLayout::Rgb, &data).expect("frame");
        let mut pre = Preprocessor::new(4, SquareMode::CropOrPad);
        pre.reconfigure(3);
        let mut out = Vec::new();
        pre.run(&frame, &mut out).expect("preprocess");
        assert_eq!(pre.target_size(), 3);
        assert_eq!(out.len(), 27);
    }

    #[test]
    fn test_zero_target_rejected() {
        let data = [0u8; 3];
        let frame = Frame::new(1, 1, PixelLayout::Rgb, &data).expect("frame");
        let mut pre = Preprocessor::new(0, SquareMode::CropOrPad);
        let mut out = Vec::new();
        assert!(matches!(
            pre.run(&frame, &mut out),
            Err(InferenceError::Preprocess(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_output_is_always_s_by_s(
            width in 1u32..48,
            height in 1u32..48,
            size in 1u32..32,
            rgba in any::<bool>(),
            crop in any::<bool>(),
        ) {
            let layout = if rgba { PixelLayout::Rgba } else { PixelLayout::Rgb };
            let mode = if crop { SquareMode::CenterCrop } else { SquareMode::CropOrPad };
            let data = vec![7u8; width as usize * height as usize * layout.channels()];
            let frame = Frame::new(width, height, layout, &data).expect("frame");
            let mut pre = Preprocessor::new(size, mode);
            let mut out = Vec::new();
            pre.run(&frame, &mut out).expect("preprocess");
            prop_assert_eq!(out.len(), size as usize * size as usize * 3);
        }
    }
}
