//! Laplacian-variance sharpness score.
//!
//! Used whenever the classifier is unavailable or fails. Luma is sampled on a
//! sparse grid, so the score is cheap even for full-resolution frames.

use crate::domain::Frame;

/// Distance between sample positions, and margin kept from each edge.
pub const SAMPLE_STEP: usize = 4;

/// Rec. 601 luma weights in thousandths.
const LUMA_WEIGHTS: [i64; 3] = [299, 587, 114];
const LUMA_SCALE: f64 = 1000.0;

/// Mean squared 3x3 Laplacian response over a sparse grid of luma samples.
///
/// Samples sit at `x, y = 4, 8, 12, ...` while strictly less than the
/// dimension minus 4. Frames too small for any sample score `0.0`. Higher
/// means sharper.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn laplacian_score(frame: &Frame<'_>) -> f64 {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    let mut sum = 0.0_f64;
    let mut count = 0_u64;

    for y in (SAMPLE_STEP..height.saturating_sub(SAMPLE_STEP)).step_by(SAMPLE_STEP) {
        for x in (SAMPLE_STEP..width.saturating_sub(SAMPLE_STEP)).step_by(SAMPLE_STEP) {
            let mut neighbourhood = 0_i64;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    neighbourhood += luma_milli(frame, nx, ny);
                }
            }
            let centre = luma_milli(frame, x, y);
            // 8 * centre minus the 8 neighbours.
            let response = (9 * centre - neighbourhood) as f64 / LUMA_SCALE;
            sum += response * response;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    let score = sum / count as f64;
    tracing::debug!(samples = count, score, "Computed Laplacian score");
    score
}

#[inline]
fn luma_milli(frame: &Frame<'_>, x: usize, y: usize) -> i64 {
    let [r, g, b] = frame.rgb_at(x, y);
    LUMA_WEIGHTS[0] * i64::from(r) + LUMA_WEIGHTS[1] * i64::from(g) + LUMA_WEIGHTS[2] * i64::from(b)
}
