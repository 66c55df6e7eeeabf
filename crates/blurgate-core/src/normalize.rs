//! Pixel range normalization ahead of inference.
//!
//! Float models expect values in `[0, 1]`; 8-bit models take pixel bytes as
//! they are. The strategy is resolved once per model from its input dtype.

use crate::domain::InputDType;
use crate::error::InferenceError;

/// Float inputs whose sampled magnitude exceeds this are treated as byte scale.
pub const BYTE_SCALE_CUTOFF: f32 = 1.5;

/// Number of leading values inspected by [`sampled_magnitude`].
pub const MAGNITUDE_SAMPLES: usize = 100;

const BYTE_MAX: f32 = 255.0;

/// Pixel data handed to the normalizer.
#[derive(Debug, Clone, Copy)]
pub enum PixelBuffer<'a> {
    /// 8-bit pixel bytes, the normal preprocessor output.
    U8(&'a [u8]),
    /// Float pixels of unknown scale.
    F32(&'a [f32]),
}

impl PixelBuffer<'_> {
    /// Number of values in the buffer.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Returns true if the buffer holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Range strategy for a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Scale bytes into `[0, 1]`.
    UnitRange,
    /// Widen bytes without scaling.
    Raw,
}

impl Normalization {
    /// Picks the strategy matching a model's input dtype.
    #[must_use]
    pub const fn for_dtype(dtype: InputDType) -> Self {
        match dtype {
            InputDType::F32 => Self::UnitRange,
            InputDType::U8 => Self::Raw,
        }
    }

    /// Writes the normalized form of `source` into `out`.
    ///
    /// `out` is cleared first and holds exactly `expected_len` values on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InputLength`] if `source` does not hold
    /// `expected_len` values.
    pub fn apply(
        self,
        source: PixelBuffer<'_>,
        expected_len: usize,
        out: &mut Vec<f32>,
    ) -> Result<(), InferenceError> {
        if source.len() != expected_len {
            return Err(InferenceError::InputLength {
                expected: expected_len,
                actual: source.len(),
            });
        }

        out.clear();
        out.reserve(expected_len);

        match (self, source) {
            (Self::UnitRange, PixelBuffer::U8(bytes)) => {
                out.extend(bytes.iter().map(|&b| f32::from(b) / BYTE_MAX));
            }
            (Self::Raw, PixelBuffer::U8(bytes)) => {
                out.extend(bytes.iter().map(|&b| f32::from(b)));
            }
            (_, PixelBuffer::F32(values)) => {
                if sampled_magnitude(values) > BYTE_SCALE_CUTOFF {
                    out.extend(values.iter().map(|v| v / BYTE_MAX));
                } else {
                    out.extend_from_slice(values);
                }
            }
        }

        Ok(())
    }
}

/// Largest absolute value among the first [`MAGNITUDE_SAMPLES`] values.
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn sampled_magnitude(values: &[f32]) -> f32 {
    values
        .iter()
        .take(MAGNITUDE_SAMPLES)
        .map(|v| v.abs())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strategy_from_dtype() {
        assert_eq!(
            Normalization::for_dtype(InputDType::F32),
            Normalization::UnitRange
        );
        assert_eq!(Normalization::for_dtype(InputDType::U8), Normalization::Raw);
    }

    #[test]
    fn test_bytes_scaled_to_unit_range() {
        let mut out = Vec::new();
        Normalization::UnitRange
            .apply(PixelBuffer::U8(&[0, 51, 255]), 3, &mut out)
            .expect("normalize");
        assert_eq!(out, vec![0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_raw_bytes_widened_only() {
        let mut out = Vec::new();
        Normalization::Raw
            .apply(PixelBuffer::U8(&[0, 128, 255]), 3, &mut out)
            .expect("normalize");
        assert_eq!(out, vec![0.0, 128.0, 255.0]);
    }

    #[test]
    fn test_byte_scale_floats_divided() {
        let mut out = Vec::new();
        Normalization::UnitRange
            .apply(PixelBuffer::F32(&[255.0, 0.0, 127.5]), 3, &mut out)
            .expect("normalize");
        assert_eq!(out, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_unit_floats_pass_through() {
        let values = [0.0, 0.5, 1.0, 1.5];
        let mut out = Vec::new();
        Normalization::UnitRange
            .apply(PixelBuffer::F32(&values), 4, &mut out)
            .expect("normalize");
        assert_eq!(out, values);
    }

    #[test]
    fn test_magnitude_only_samples_prefix() {
        // Byte-scale values past the sampled prefix do not trigger scaling.
        let mut values = vec![0.5_f32; MAGNITUDE_SAMPLES];
        values.push(200.0);
        assert!((sampled_magnitude(&values) - 0.5).abs() < f32::EPSILON);

        let mut out = Vec::new();
        Normalization::UnitRange
            .apply(PixelBuffer::F32(&values), values.len(), &mut out)
            .expect("normalize");
        assert!((out[MAGNITUDE_SAMPLES] - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_magnitude_is_zero() {
        assert!(sampled_magnitude(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_length_mismatch() {
        let mut out = Vec::new();
        let err = Normalization::UnitRange
            .apply(PixelBuffer::U8(&[1, 2]), 3, &mut out)
            .expect_err("length mismatch");
        assert!(matches!(
            err,
            InferenceError::InputLength {
                expected: 3,
                actual: 2
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_unit_range_bounds(bytes in proptest::collection::vec(any::<u8>(), 1..512)) {
            let mut out = Vec::new();
            Normalization::UnitRange
                .apply(PixelBuffer::U8(&bytes), bytes.len(), &mut out)
                .expect("normalize");
            prop_assert_eq!(out.len(), bytes.len());
            prop_assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        #[test]
        fn prop_byte_scale_floats_land_in_unit_range(
            mut values in proptest::collection::vec(0.0_f32..=255.0, 0..256),
        ) {
            values.insert(0, 255.0);
            let mut out = Vec::new();
            Normalization::UnitRange
                .apply(PixelBuffer::F32(&values), values.len(), &mut out)
                .expect("normalize");
            prop_assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        #[test]
        fn prop_unit_floats_unchanged(
            values in proptest::collection::vec(-1.5_f32..=1.5, 0..256),
        ) {
            let mut out = Vec::new();
            Normalization::UnitRange
                .apply(PixelBuffer::F32(&values), values.len(), &mut out)
                .expect("normalize");
            prop_assert_eq!(out, values);
        }

        #[test]
        fn prop_byte_scale_floats_divided_elementwise(
            lead in 1.6_f32..=255.0,
            rest in proptest::collection::vec(-255.0_f32..=255.0, 0..256),
        ) {
            let mut values = vec![lead];
            values.extend(rest);
            let mut out = Vec::new();
            Normalization::Raw
                .apply(PixelBuffer::F32(&values), values.len(), &mut out)
                .expect("normalize");
            prop_assert_eq!(out.len(), values.len());
            for (got, v) in out.iter().zip(&values) {
                prop_assert!((got - v / 255.0).abs() <= f32::EPSILON);
            }
        }
    }
}
