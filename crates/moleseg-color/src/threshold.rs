//! Binary thresholding
//!
//! Converts 8 bpp intensity images into 1 bpp masks (foreground = 1):
//! - Fixed threshold binarization
//! - Adaptive (local) thresholding against a mean or Gaussian-weighted
//!   neighborhood with replicated borders

use crate::{ColorError, ColorResult};
use moleseg_core::{Pix, PixelDepth};
use moleseg_filter::{block_sum_map, gaussian_weights, local_mean_map};

/// Options for adaptive thresholding
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveThresholdOptions {
    /// Side of the square neighborhood (odd, at least 3)
    pub block_size: u32,
    /// Constant subtracted from the local mean
    pub offset: f32,
    /// Method for computing the local mean
    pub method: AdaptiveMethod,
    /// Which side of the local threshold is foreground
    pub threshold_type: ThresholdType,
}

/// Method for adaptive threshold computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdaptiveMethod {
    /// Unweighted mean of the window
    #[default]
    Mean,
    /// Gaussian-weighted mean, sigma derived from the block size
    Gaussian,
}

/// Polarity of the output mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdType {
    /// Pixels at or above the local threshold are foreground
    #[default]
    Binary,
    /// Pixels below the local threshold are foreground
    BinaryInverted,
}

impl Default for AdaptiveThresholdOptions {
    fn default() -> Self {
        Self {
            block_size: 15,
            offset: 2.0,
            method: AdaptiveMethod::Mean,
            threshold_type: ThresholdType::Binary,
        }
    }
}

impl AdaptiveThresholdOptions {
    /// Options with the given window, offset and polarity, mean method.
    pub fn new(block_size: u32, offset: f32, threshold_type: ThresholdType) -> Self {
        Self {
            block_size,
            offset,
            method: AdaptiveMethod::Mean,
            threshold_type,
        }
    }

    pub fn with_method(mut self, method: AdaptiveMethod) -> Self {
        self.method = method;
        self
    }

    /// Check the window size and offset.
    pub fn validate(&self) -> ColorResult<()> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(ColorError::InvalidParameters(format!(
                "block_size must be odd and >= 3, got {}",
                self.block_size
            )));
        }
        if !self.offset.is_finite() {
            return Err(ColorError::InvalidParameters(format!(
                "offset must be finite, got {}",
                self.offset
            )));
        }
        Ok(())
    }
}

/// Convert a grayscale image to a mask using a fixed threshold
///
/// Pixels >= threshold become foreground (1).
pub fn threshold_to_binary(pix: &Pix, threshold: u8) -> ColorResult<Pix> {
    check_gray(pix)?;
    let (w, h) = pix.dimensions();
    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            if pix.get_pixel_unchecked(x, y) >= threshold as u32 {
                out.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(out.into())
}

/// Apply adaptive thresholding
///
/// For each pixel the reference is the local mean over a
/// `block_size x block_size` window minus `offset`. With
/// [`ThresholdType::Binary`] a pixel at or above the reference is
/// foreground; [`ThresholdType::BinaryInverted`] flips that.
///
/// A 1 bpp input is already two-valued and is returned as is (or inverted
/// for `BinaryInverted`), so thresholding a mask reproduces it.
///
/// # Errors
///
/// [`ColorError::InvalidParameters`] for an even or too small block size,
/// [`ColorError::UnsupportedDepth`] for 32 bpp input.
pub fn adaptive_threshold(pix: &Pix, options: &AdaptiveThresholdOptions) -> ColorResult<Pix> {
    options.validate()?;

    if pix.depth() == PixelDepth::Bit1 {
        return Ok(match options.threshold_type {
            ThresholdType::Binary => pix.clone(),
            ThresholdType::BinaryInverted => pix.invert_binary()?,
        });
    }
    check_gray(pix)?;

    let (w, h) = pix.dimensions();
    let mean = match options.method {
        AdaptiveMethod::Mean => {
            let area = f64::from(options.block_size).powi(2);
            block_sum_map(pix, options.block_size)?
                .into_iter()
                .map(|s| s as f64 / area)
                .collect::<Vec<_>>()
        }
        AdaptiveMethod::Gaussian => {
            let weights = gaussian_weights(options.block_size, 0.0)?;
            local_mean_map(pix, &weights)?
                .into_iter()
                .map(f64::from)
                .collect()
        }
    };

    let offset = options.offset as f64;
    let inverted = options.threshold_type == ThresholdType::BinaryInverted;
    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            let reference = mean[(y * w + x) as usize] - offset;
            let above = pix.get_pixel_unchecked(x, y) as f64 >= reference;
            if above != inverted {
                out.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(out.into())
}

fn check_gray(pix: &Pix) -> ColorResult<()> {
    if pix.depth() != PixelDepth::Bit8 {
        return Err(ColorError::UnsupportedDepth {
            expected: "8 bpp grayscale",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_from(rows: &[&[u8]]) -> Pix {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let mut pm = Pix::new(w, h, PixelDepth::Bit8).unwrap().to_mut();
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                pm.set_pixel_unchecked(x as u32, y as u32, v as u32);
            }
        }
        pm.into()
    }

    #[test]
    fn test_block_size_validation() {
        let pix = gray_from(&[&[0, 0, 0]]);
        for bad in [0, 1, 2, 4, 40] {
            let opts = AdaptiveThresholdOptions::new(bad, 0.0, ThresholdType::Binary);
            assert!(matches!(
                adaptive_threshold(&pix, &opts),
                Err(ColorError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn test_block_larger_than_image() {
        let pix = gray_from(&[&[255u8; 4] as &[u8]; 4]);
        let opts = AdaptiveThresholdOptions::new(4105, 5.0, ThresholdType::Binary);
        let mask = adaptive_threshold(&pix, &opts).unwrap();
        assert_eq!(mask.count_pixels(), 16);

        let inv = AdaptiveThresholdOptions::new(4105, 5.0, ThresholdType::BinaryInverted);
        assert_eq!(adaptive_threshold(&pix, &inv).unwrap().count_pixels(), 0);
    }

    #[test]
    fn test_flat_image_compares_at_or_above() {
        // Equal to the mean with zero offset counts as foreground
        let pix = gray_from(&[&[50, 50, 50], &[50, 50, 50]]);
        let opts = AdaptiveThresholdOptions::new(3, 0.0, ThresholdType::Binary);
        let mask = adaptive_threshold(&pix, &opts).unwrap();
        assert_eq!(mask.count_pixels(), 6);

        let inv = AdaptiveThresholdOptions::new(3, 0.0, ThresholdType::BinaryInverted);
        assert_eq!(adaptive_threshold(&pix, &inv).unwrap().count_pixels(), 0);
    }

    #[test]
    fn test_dark_spot_inverted() {
        let pix = gray_from(&[
            &[200, 200, 200, 200, 200],
            &[200, 200, 200, 200, 200],
            &[200, 200, 20, 200, 200],
            &[200, 200, 200, 200, 200],
            &[200, 200, 200, 200, 200],
        ]);
        let opts = AdaptiveThresholdOptions::new(3, 5.0, ThresholdType::BinaryInverted);
        let mask = adaptive_threshold(&pix, &opts).unwrap();
        assert_eq!(mask.get_pixel(2, 2), Some(1));
        assert_eq!(mask.count_pixels(), 1);
    }

    #[test]
    fn test_gaussian_method_on_step() {
        let pix = gray_from(&[&[10u8, 10, 10, 240, 240, 240] as &[u8]; 3]);
        let opts = AdaptiveThresholdOptions::new(3, 0.0, ThresholdType::Binary)
            .with_method(AdaptiveMethod::Gaussian);
        let mask = adaptive_threshold(&pix, &opts).unwrap();
        // The bright side of the step is above its blurred mean
        assert_eq!(mask.get_pixel(3, 1), Some(1));
        assert_eq!(mask.get_pixel(2, 1), Some(0));
    }

    #[test]
    fn test_mask_input_is_fixed_point() {
        let mut pm = Pix::new(6, 4, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel_unchecked(1, 1, 1);
        pm.set_pixel_unchecked(5, 3, 1);
        let mask: Pix = pm.into();
        let opts = AdaptiveThresholdOptions::new(5, 3.0, ThresholdType::Binary);
        let again = adaptive_threshold(&mask, &opts).unwrap();
        assert_eq!(again.count_pixels(), 2);
        assert_eq!(again.get_pixel(5, 3), Some(1));

        let inv = AdaptiveThresholdOptions::new(5, 3.0, ThresholdType::BinaryInverted);
        assert_eq!(adaptive_threshold(&mask, &inv).unwrap().count_pixels(), 22);
    }

    #[test]
    fn test_fixed_threshold() {
        let pix = gray_from(&[&[0, 99, 100, 255]]);
        let mask = threshold_to_binary(&pix, 100).unwrap();
        assert_eq!(mask.get_pixel(1, 0), Some(0));
        assert_eq!(mask.get_pixel(2, 0), Some(1));
        assert_eq!(mask.count_pixels(), 2);
    }

    #[test]
    fn test_color_rejected() {
        let pix = Pix::new(3, 3, PixelDepth::Bit32).unwrap();
        assert!(matches!(
            adaptive_threshold(&pix, &AdaptiveThresholdOptions::default()),
            Err(ColorError::UnsupportedDepth { .. })
        ));
    }
}
