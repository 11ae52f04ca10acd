//! Convolution operations
//!
//! All borders replicate the nearest edge pixel. Separable filters run a
//! horizontal pass into an `f32` plane, then a vertical pass.

use crate::kernel::{box_weights, gaussian_weights};
use crate::{FilterError, FilterResult, Kernel};
use moleseg_core::{Pix, PixelDepth, color};

/// Convolve an 8-bit grayscale image with a 2-D kernel
pub fn convolve_gray(pix: &Pix, kernel: &Kernel) -> FilterResult<Pix> {
    check_grayscale(pix)?;

    let w = pix.width();
    let h = pix.height();
    let kcx = kernel.center_x() as i32;
    let kcy = kernel.center_y() as i32;

    let mut out_mut = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();

    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for ky in 0..kernel.height() {
                for kx in 0..kernel.width() {
                    let sx = (x as i32 + kx as i32 - kcx).clamp(0, w as i32 - 1) as u32;
                    let sy = (y as i32 + ky as i32 - kcy).clamp(0, h as i32 - 1) as u32;
                    let k = kernel.get(kx, ky).unwrap_or(0.0);
                    sum += pix.get_pixel_unchecked(sx, sy) as f32 * k;
                }
            }
            out_mut.set_pixel_unchecked(x, y, to_u8(sum));
        }
    }

    Ok(out_mut.into())
}

/// Gaussian blur with an odd `kernel_size` and standard deviation `sigma`.
///
/// Works on 8 bpp images and on 32 bpp color images (each sample blurred
/// independently). A non-positive `sigma` is derived from the size.
pub fn gaussian_blur(pix: &Pix, kernel_size: u32, sigma: f32) -> FilterResult<Pix> {
    let weights = gaussian_weights(kernel_size, sigma)?;
    separable_blur(pix, &weights)
}

/// Box (mean) blur with an odd `size`.
pub fn box_blur(pix: &Pix, size: u32) -> FilterResult<Pix> {
    let weights = box_weights(size)?;
    separable_blur(pix, &weights)
}

fn separable_blur(pix: &Pix, weights: &[f32]) -> FilterResult<Pix> {
    match pix.depth() {
        PixelDepth::Bit8 => {
            let plane = smooth_plane(&gray_plane(pix), pix.width(), pix.height(), weights);
            plane_to_gray(&plane, pix.width(), pix.height())
        }
        PixelDepth::Bit32 if pix.spp() >= 3 => blur_color(pix, weights),
        _ => Err(FilterError::UnsupportedDepth {
            expected: "8-bpp grayscale or 32-bpp color",
            actual: pix.depth().bits(),
        }),
    }
}

fn blur_color(pix: &Pix, weights: &[f32]) -> FilterResult<Pix> {
    let (w, h) = pix.dimensions();
    let n = (w * h) as usize;
    let mut planes = [vec![0.0f32; n], vec![0.0f32; n], vec![0.0f32; n]];
    for y in 0..h {
        for x in 0..w {
            let (a, b, c) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
            let i = (y * w + x) as usize;
            planes[0][i] = a as f32;
            planes[1][i] = b as f32;
            planes[2][i] = c as f32;
        }
    }
    let planes = planes.map(|p| smooth_plane(&p, w, h, weights));

    let mut out_mut = Pix::new(w, h, PixelDepth::Bit32)?.to_mut();
    out_mut.set_spp(pix.spp());
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let val = color::compose_rgb(
                to_u8(planes[0][i]) as u8,
                to_u8(planes[1][i]) as u8,
                to_u8(planes[2][i]) as u8,
            );
            out_mut.set_pixel_unchecked(x, y, val);
        }
    }
    Ok(out_mut.into())
}

/// Weighted local mean of an 8 bpp image as an `f32` plane (row-major).
///
/// `weights` is applied along both axes and should sum to 1. This is the
/// unrounded reference used by adaptive thresholding.
pub fn local_mean_map(pix: &Pix, weights: &[f32]) -> FilterResult<Vec<f32>> {
    check_grayscale(pix)?;
    if weights.is_empty() || weights.len() % 2 == 0 {
        return Err(FilterError::InvalidKernel(format!(
            "weight vector length must be odd, got {}",
            weights.len()
        )));
    }
    Ok(smooth_plane(
        &gray_plane(pix),
        pix.width(),
        pix.height(),
        weights,
    ))
}

fn gray_plane(pix: &Pix) -> Vec<f32> {
    let (w, h) = pix.dimensions();
    let mut plane = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            plane.push(pix.get_pixel_unchecked(x, y) as f32);
        }
    }
    plane
}

fn plane_to_gray(plane: &[f32], w: u32, h: u32) -> FilterResult<Pix> {
    let mut out_mut = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            out_mut.set_pixel_unchecked(x, y, to_u8(plane[(y * w + x) as usize]));
        }
    }
    Ok(out_mut.into())
}

/// Horizontal then vertical pass with replicate border.
fn smooth_plane(src: &[f32], w: u32, h: u32, weights: &[f32]) -> Vec<f32> {
    let (w, h) = (w as usize, h as usize);
    let half = (weights.len() / 2) as isize;
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &wt) in weights.iter().enumerate() {
                acc += wt * row[clamp(x as isize + k as isize - half, w)];
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &wt) in weights.iter().enumerate() {
                acc += wt * tmp[clamp(y as isize + k as isize - half, h) * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

#[inline]
fn to_u8(v: f32) -> u32 {
    v.round().clamp(0.0, 255.0) as u32
}

fn check_grayscale(pix: &Pix) -> FilterResult<()> {
    if pix.depth() != PixelDepth::Bit8 {
        return Err(FilterError::UnsupportedDepth {
            expected: "8-bpp grayscale",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}
