//! Convolution kernels
//!
//! A [`Kernel`] is a small dense matrix of weights with a center cell. Most
//! smoothing in this library is separable, so 1-D weight vectors are also
//! generated here and applied along rows and columns in turn.

use crate::{FilterError, FilterResult};

/// A 2D convolution kernel
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Width of the kernel
    width: u32,
    /// Height of the kernel
    height: u32,
    /// X coordinate of the center
    cx: u32,
    /// Y coordinate of the center
    cy: u32,
    /// Kernel data (row-major order)
    data: Vec<f32>,
}

impl Kernel {
    /// Create a zeroed kernel with the center at `(width / 2, height / 2)`.
    pub fn new(width: u32, height: u32) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Kernel {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![0.0; (width * height) as usize],
        })
    }

    /// Create a kernel from row-major values.
    pub fn from_slice(width: u32, height: u32, data: &[f32]) -> FilterResult<Self> {
        let mut kernel = Self::new(width, height)?;
        if data.len() != kernel.data.len() {
            return Err(FilterError::InvalidKernel(format!(
                "expected {} values, got {}",
                kernel.data.len(),
                data.len()
            )));
        }
        kernel.data.copy_from_slice(data);
        Ok(kernel)
    }

    /// Create a box (averaging) kernel; every value is `1/(size*size)`.
    pub fn box_kernel(size: u32) -> FilterResult<Self> {
        let weights = box_weights(size)?;
        Ok(Self::outer(&weights, &weights))
    }

    /// Create a normalized Gaussian kernel.
    ///
    /// A non-positive `sigma` is derived from `size`, see [`gaussian_weights`].
    pub fn gaussian(size: u32, sigma: f32) -> FilterResult<Self> {
        let weights = gaussian_weights(size, sigma)?;
        Ok(Self::outer(&weights, &weights))
    }

    fn outer(col: &[f32], row: &[f32]) -> Self {
        let width = row.len() as u32;
        let height = col.len() as u32;
        let data = col
            .iter()
            .flat_map(|&c| row.iter().map(move |&r| c * r))
            .collect();
        Kernel {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center_x(&self) -> u32 {
        self.cx
    }

    pub fn center_y(&self) -> u32 {
        self.cy
    }

    /// Move the center cell.
    pub fn set_center(&mut self, cx: u32, cy: u32) -> FilterResult<()> {
        if cx >= self.width || cy >= self.height {
            return Err(FilterError::InvalidKernel(format!(
                "center ({}, {}) outside {}x{} kernel",
                cx, cy, self.width, self.height
            )));
        }
        self.cx = cx;
        self.cy = cy;
        Ok(())
    }

    /// Get the weight at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Set the weight at (x, y).
    pub fn set(&mut self, x: u32, y: u32, val: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Scale the weights so they sum to 1. A zero-sum kernel is left as is.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum.abs() > f32::EPSILON {
            for v in &mut self.data {
                *v /= sum;
            }
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

pub(crate) fn check_odd_size(size: u32) -> FilterResult<()> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidKernel(format!(
            "kernel size must be odd and positive, got {}",
            size
        )));
    }
    Ok(())
}

/// Sigma used when the caller passes a non-positive value.
///
/// Matches the common convention `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn default_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights of odd length `size`.
pub fn gaussian_weights(size: u32, sigma: f32) -> FilterResult<Vec<f32>> {
    check_odd_size(size)?;
    if !sigma.is_finite() {
        return Err(FilterError::InvalidParameters(format!(
            "sigma must be finite, got {}",
            sigma
        )));
    }
    let sigma = if sigma > 0.0 { sigma } else { default_sigma(size) };
    let half = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-half..=half)
        .map(|i| (-(i as f32).powi(2) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    Ok(weights)
}

/// Uniform 1-D weights of odd length `size`.
pub fn box_weights(size: u32) -> FilterResult<Vec<f32>> {
    check_odd_size(size)?;
    Ok(vec![1.0 / size as f32; size as usize])
}
