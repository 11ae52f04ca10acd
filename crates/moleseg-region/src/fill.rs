//! Rendering of labelings and fitted circles
//!
//! Debug views for the segmentation pipeline: a pseudo-color image with one
//! hue per component, a plain foreground mask of all labeled pixels, and a
//! circle outline drawn over any image.

use crate::conncomp::check_labels;
use crate::error::{RegionError, RegionResult};
use moleseg_core::color::{compose_rgb, hsv_to_rgb};
use moleseg_core::{Pix, PixelDepth, Point};

/// Hue step between consecutive labels, in degrees (golden angle)
const HUE_STEP: f32 = 137.508;

/// Display color for a component label.
///
/// Label 0 is black; other labels get saturated colors whose hues are
/// spread by the golden angle so neighbouring labels differ visibly.
pub fn label_color(label: u32) -> u32 {
    if label == 0 {
        return 0;
    }
    let hue = (label as f32 * HUE_STEP).rem_euclid(360.0);
    let (r, g, b) = hsv_to_rgb(hue, 0.85, 0.95);
    compose_rgb(r, g, b)
}

/// Paint labels `1..=cc_count` with their [`label_color`].
///
/// Returns a 32 bpp color image. Background and labels above `cc_count`
/// stay black.
pub fn flood_fill_ccs(labels: &Pix, cc_count: u32) -> RegionResult<Pix> {
    check_labels(labels)?;
    let (w, h) = labels.dimensions();

    // Labels come in horizontal runs; remember the last color computed
    let mut last = (0u32, 0u32);
    let mut out = Pix::new(w, h, PixelDepth::Bit32)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            let l = labels.get_pixel_unchecked(x, y);
            if l == 0 || l > cc_count {
                continue;
            }
            if last.0 != l {
                last = (l, label_color(l));
            }
            out.set_pixel_unchecked(x, y, last.1);
        }
    }
    Ok(out.into())
}

/// Mask of all pixels carrying a label in `1..=cc_count`.
pub fn white_fill_ccs(labels: &Pix, cc_count: u32) -> RegionResult<Pix> {
    check_labels(labels)?;
    let (w, h) = labels.dimensions();
    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            let l = labels.get_pixel_unchecked(x, y);
            if l != 0 && l <= cc_count {
                out.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(out.into())
}

/// Draw a circle outline onto a copy of `pix`.
///
/// Every pixel whose center lies within `thickness / 2` of the circle is
/// set to `value` (truncated to the image depth). The circle may extend
/// past the frame; only the visible part is drawn.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] for a negative or non-finite
/// radius, or a thickness that is not positive.
pub fn render_circle(
    pix: &Pix,
    center: Point,
    radius: f64,
    value: u32,
    thickness: f64,
) -> RegionResult<Pix> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(RegionError::InvalidParameters(format!(
            "radius must be non-negative, got {}",
            radius
        )));
    }
    if !thickness.is_finite() || thickness <= 0.0 {
        return Err(RegionError::InvalidParameters(format!(
            "thickness must be positive, got {}",
            thickness
        )));
    }
    if !center.x.is_finite() || !center.y.is_finite() {
        return Err(RegionError::InvalidParameters(
            "circle center must be finite".to_string(),
        ));
    }

    let (w, h) = pix.dimensions();
    let half = 0.5 * thickness;
    let reach = radius + half;
    let x0 = (center.x - reach).floor().max(0.0);
    let y0 = (center.y - reach).floor().max(0.0);
    let x1 = (center.x + reach).ceil().min(w as f64 - 1.0);
    let y1 = (center.y + reach).ceil().min(h as f64 - 1.0);

    let mut out = pix.to_mut();
    if x0 > x1 || y0 > y1 {
        return Ok(out.into());
    }
    for y in y0 as u32..=y1 as u32 {
        for x in x0 as u32..=x1 as u32 {
            let d = Point::new(x as f64, y as f64).distance(&center);
            if (d - radius).abs() <= half {
                out.set_pixel_unchecked(x, y, value);
            }
        }
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conncomp::connected_components_with_stats;

    fn two_blobs() -> Pix {
        let mut pm = Pix::new(8, 4, PixelDepth::Bit1).unwrap().to_mut();
        for (x, y) in [(0, 0), (1, 0), (6, 3), (7, 3), (7, 2)] {
            pm.set_pixel_unchecked(x, y, 1);
        }
        pm.into()
    }

    #[test]
    fn test_label_colors_differ() {
        assert_eq!(label_color(0), 0);
        let colors: Vec<u32> = (1..=8).map(label_color).collect();
        for (i, a) in colors.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_flood_fill_colors_components() {
        let cc = connected_components_with_stats(&two_blobs()).unwrap();
        let colored = flood_fill_ccs(cc.labels(), cc.cc_count()).unwrap();
        assert_eq!(colored.depth(), PixelDepth::Bit32);
        assert_eq!(colored.spp(), 3);
        assert_eq!(colored.get_pixel(0, 0), Some(label_color(1)));
        assert_eq!(colored.get_pixel(7, 3), Some(label_color(2)));
        assert_eq!(colored.get_pixel(3, 1), Some(0));

        // Labels above the count are left black
        let partial = flood_fill_ccs(cc.labels(), 1).unwrap();
        assert_eq!(partial.get_pixel(7, 3), Some(0));
    }

    #[test]
    fn test_flood_fill_count_extremes() {
        let cc = connected_components_with_stats(&two_blobs()).unwrap();
        let none = flood_fill_ccs(cc.labels(), 0).unwrap();
        assert_eq!(none.dimensions(), (8, 4));
        assert!(none.data().iter().all(|&p| p == 0));

        let all = flood_fill_ccs(cc.labels(), u32::MAX).unwrap();
        let exact = flood_fill_ccs(cc.labels(), cc.cc_count()).unwrap();
        assert_eq!(all.data(), exact.data());
    }

    #[test]
    fn test_white_fill_matches_mask() {
        let mask = two_blobs();
        let cc = connected_components_with_stats(&mask).unwrap();
        let white = white_fill_ccs(cc.labels(), cc.cc_count()).unwrap();
        assert_eq!(white.data(), mask.data());
        assert_eq!(white_fill_ccs(cc.labels(), 0).unwrap().count_pixels(), 0);
    }

    #[test]
    fn test_fill_rejects_masks() {
        assert!(flood_fill_ccs(&two_blobs(), 2).is_err());
        assert!(white_fill_ccs(&two_blobs(), 2).is_err());
    }

    #[test]
    fn test_render_circle_outline() {
        let gray = Pix::new(21, 21, PixelDepth::Bit8).unwrap();
        let drawn = render_circle(&gray, Point::new(10.0, 10.0), 6.0, 255, 1.0).unwrap();
        assert_eq!(drawn.get_pixel(16, 10), Some(255));
        assert_eq!(drawn.get_pixel(10, 4), Some(255));
        assert_eq!(drawn.get_pixel(10, 10), Some(0));
        assert_eq!(drawn.get_pixel(0, 0), Some(0));
        // Source untouched
        assert_eq!(gray.count_value(255), 0);
    }

    #[test]
    fn test_render_circle_clips_to_frame() {
        let mask = Pix::new(10, 10, PixelDepth::Bit1).unwrap();
        let drawn = render_circle(&mask, Point::new(0.0, 0.0), 5.0, 1, 1.0).unwrap();
        assert_eq!(drawn.get_pixel(5, 0), Some(1));
        assert_eq!(drawn.get_pixel(0, 5), Some(1));
        let outside = render_circle(&mask, Point::new(-50.0, -50.0), 5.0, 1, 1.0).unwrap();
        assert_eq!(outside.count_pixels(), 0);
    }

    #[test]
    fn test_render_circle_validates() {
        let gray = Pix::new(4, 4, PixelDepth::Bit8).unwrap();
        let c = Point::new(2.0, 2.0);
        assert!(render_circle(&gray, c, -1.0, 1, 1.0).is_err());
        assert!(render_circle(&gray, c, 1.0, 1, 0.0).is_err());
        assert!(render_circle(&gray, c, f64::NAN, 1, 1.0).is_err());
    }
}
