//! Synthetic inputs
//!
//! Binary masks and lesion-like color scenes generated in code, so the
//! regression tests need no image files on disk. Randomness comes from a
//! seeded linear congruential generator and is reproducible across runs.

use crate::error::{TestError, TestResult};
use moleseg_core::{ChannelOrder, ColorChannel, Pix, PixelDepth, SampleIndex, color};

/// Logical color as (red, green, blue).
pub type Rgb = (u8, u8, u8);

/// Typical light skin tone
pub const SKIN: Rgb = (222, 180, 152);
/// Dark brown nevus
pub const MOLE: Rgb = (92, 58, 40);
/// Worn, dark reference coin
pub const DARK_COIN: Rgb = (70, 66, 60);
/// Polished reference coin with a strong blue-white highlight
pub const SHINY_COIN: Rgb = (236, 238, 250);

/// Simple linear congruential generator for reproducible randomness
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    pub fn next_u64(&mut self) -> u64 {
        // Knuth's MMIX multiplier and increment
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    /// Uniform value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in [0, n). Returns 0 when `n` is 0.
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.next_u64() >> 32) % n as u64) as u32
    }
}

/// Build a mask from ASCII art: `#` or `1` is foreground, `.` or `0` is
/// background. All rows must have the same length.
pub fn mask_from_pattern(rows: &[&str]) -> TestResult<Pix> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    for (y, row) in rows.iter().enumerate() {
        if row.len() as u32 != width {
            return Err(TestError::BadPattern(format!(
                "row {} has length {}, expected {}",
                y,
                row.len(),
                width
            )));
        }
        for (x, c) in row.bytes().enumerate() {
            let val = match c {
                b'#' | b'1' => 1,
                b'.' | b'0' => 0,
                other => {
                    return Err(TestError::BadPattern(format!(
                        "unexpected character {:?} at ({}, {})",
                        other as char, x, y
                    )));
                }
            };
            pm.set_pixel_unchecked(x as u32, y as u32, val);
        }
    }
    Ok(pm.into())
}

/// Mask with the given `(x, y, w, h)` rectangles set, clipped to the image.
pub fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    for &(rx, ry, rw, rh) in rects {
        for y in ry..(ry + rh).min(height) {
            for x in rx..(rx + rw).min(width) {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(pm.into())
}

/// Mask with a filled disk: pixel centers within `radius` of `(cx, cy)`.
pub fn disk_mask(width: u32, height: u32, cx: f64, cy: f64, radius: f64) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    let r2 = radius * radius;
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if dx * dx + dy * dy <= r2 {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(pm.into())
}

/// Mask where each pixel is foreground with probability `density`.
pub fn random_mask(width: u32, height: u32, density: f64, seed: u32) -> TestResult<Pix> {
    let mut rng = Lcg::new(seed);
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            if rng.next_f64() < density {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(pm.into())
}

/// Random 8 bpp image with values in `[0, 255]`.
pub fn random_gray(width: u32, height: u32, seed: u32) -> TestResult<Pix> {
    let mut rng = Lcg::new(seed);
    let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            pm.set_pixel_unchecked(x, y, rng.below(256));
        }
    }
    Ok(pm.into())
}

/// Pack a logical color into a 32 bpp pixel under `order`.
pub fn pack_color(rgb: Rgb, order: ChannelOrder) -> u32 {
    let mut samples = [0u8; 3];
    for (channel, value) in [
        (ColorChannel::Red, rgb.0),
        (ColorChannel::Green, rgb.1),
        (ColorChannel::Blue, rgb.2),
    ] {
        let slot = match order.sample_of(channel) {
            SampleIndex::First => 0,
            SampleIndex::Second => 1,
            SampleIndex::Third => 2,
        };
        samples[slot] = value;
    }
    color::compose_rgb(samples[0], samples[1], samples[2])
}

/// A disk of color `object` on a `background` field, stored in `order`.
///
/// Each sample gets uniform noise in `[-noise, noise]` when `noise > 0`.
#[allow(clippy::too_many_arguments)]
pub fn disk_scene(
    width: u32,
    height: u32,
    center: (f64, f64),
    radius: f64,
    object: Rgb,
    background: Rgb,
    order: ChannelOrder,
    noise: u8,
    seed: u32,
) -> TestResult<Pix> {
    let mut rng = Lcg::new(seed);
    let mut pm = Pix::new(width, height, PixelDepth::Bit32)?.to_mut();
    let r2 = radius * radius;
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            let base = if dx * dx + dy * dy <= r2 {
                object
            } else {
                background
            };
            let mut jitter = |v: u8| -> u8 {
                if noise == 0 {
                    return v;
                }
                let span = 2 * noise as u32 + 1;
                let delta = rng.below(span) as i32 - noise as i32;
                (v as i32 + delta).clamp(0, 255) as u8
            };
            let rgb = (jitter(base.0), jitter(base.1), jitter(base.2));
            pm.set_pixel_unchecked(x, y, pack_color(rgb, order));
        }
    }
    Ok(pm.into())
}

/// A mole of the given radius on skin, lightly noisy.
pub fn lesion_scene(
    width: u32,
    height: u32,
    center: (f64, f64),
    radius: f64,
    order: ChannelOrder,
) -> TestResult<Pix> {
    disk_scene(width, height, center, radius, MOLE, SKIN, order, 4, 7)
}
