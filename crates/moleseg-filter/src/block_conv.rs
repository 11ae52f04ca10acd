//! Block sums with replicated borders
//!
//! Integer sliding-window sums, so that block means compare exactly against
//! pixel values. Each output is the sum over a `size x size` window centered
//! on the pixel, with out-of-image samples replaced by the nearest edge
//! pixel.

use crate::kernel::check_odd_size;
use crate::{FilterError, FilterResult};
use moleseg_core::{Pix, PixelDepth};

/// Unnormalized block sums of an 8 bpp image (row-major).
///
/// Divide by `size * size` for the block mean. Windows larger than the
/// image are allowed; they see the replicated border.
///
/// # Errors
///
/// [`FilterError::InvalidKernel`] for an even or zero size, and
/// [`FilterError::InvalidParameters`] when a full window of 255s would not
/// fit in a `u64`.
pub fn block_sum_map(pix: &Pix, size: u32) -> FilterResult<Vec<u64>> {
    if pix.depth() != PixelDepth::Bit8 {
        return Err(FilterError::UnsupportedDepth {
            expected: "8-bpp grayscale",
            actual: pix.depth().bits(),
        });
    }
    check_odd_size(size)?;
    let area = u64::from(size) * u64::from(size);
    if area.checked_mul(255).is_none() {
        return Err(FilterError::InvalidParameters(format!(
            "block size {} overflows the window sum",
            size
        )));
    }

    let (w, h) = (pix.width() as usize, pix.height() as usize);
    let half = (size / 2) as usize;

    let mut horiz = vec![0u64; w * h];
    let mut row = vec![0u64; w];
    for y in 0..h {
        for (x, v) in row.iter_mut().enumerate() {
            *v = u64::from(pix.get_pixel_unchecked(x as u32, y as u32));
        }
        let at = |i: isize| row[i.clamp(0, w as isize - 1) as usize];
        let mut sum = window_sum(w, half, |i| row[i]);
        for x in 0..w {
            horiz[y * w + x] = sum;
            let xi = x as isize;
            sum = sum + at(xi + half as isize + 1) - at(xi - half as isize);
        }
    }

    let mut out = vec![0u64; w * h];
    for x in 0..w {
        let at = |i: isize| horiz[i.clamp(0, h as isize - 1) as usize * w + x];
        let mut sum = window_sum(h, half, |i| horiz[i * w + x]);
        for y in 0..h {
            out[y * w + x] = sum;
            let yi = y as isize;
            sum = sum + at(yi + half as isize + 1) - at(yi - half as isize);
        }
    }
    Ok(out)
}

/// Sum of `at` over `-half..=half` with indices clamped to `0..n`.
fn window_sum(n: usize, half: usize, at: impl Fn(usize) -> u64) -> u64 {
    let last = half.min(n - 1);
    let inner: u64 = (0..=last).map(&at).sum();
    half as u64 * at(0) + inner + (half - last) as u64 * at(n - 1)
}
