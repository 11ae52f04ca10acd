//! moleseg-core - Basic data structures for lesion image analysis
//!
//! This crate provides the types every processing stage exchanges:
//!
//! - [`Pix`] / [`PixMut`] - The raster buffer (immutable / mutable)
//! - [`Box`] - Axis-aligned rectangles (component bounding boxes)
//! - [`Point`] - Floating-point image-plane coordinates
//! - [`ChannelOrder`] / [`ColorChannel`] - Explicit color channel mapping
//!   for 3-sample images

pub mod box_;
pub mod error;
pub mod pix;
pub mod point;

pub use box_::Box;
pub use error::{Error, Result};
pub use pix::{ChannelOrder, ColorChannel, Pix, PixMut, PixelDepth, SampleIndex};
pub use point::Point;

/// Sample packing helpers for 32-bit color pixels.
///
/// # Pixel format
///
/// 32-bit pixels are stored as `0xSSTTUU00`: first sample in the MSB, then
/// the second and third; the low byte is unused. Which colors the samples
/// are is decided by [`ChannelOrder`].
pub mod color {
    /// Shift amounts for the three stored samples
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;

    /// Extract the first sample from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & 0xff) as u8
    }

    /// Extract the second sample from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & 0xff) as u8
    }

    /// Extract the third sample from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & 0xff) as u8
    }

    /// Compose a 32-bit pixel from three samples in storage order.
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << RED_SHIFT) | ((g as u32) << GREEN_SHIFT) | ((b as u32) << BLUE_SHIFT)
    }

    /// Extract the three samples from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel))
    }

    /// Convert HSV to RGB.
    ///
    /// `h` is in degrees (any value, wrapped into [0, 360)), `s` and `v`
    /// in [0, 1].
    pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let h = h.rem_euclid(360.0) / 60.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u32 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        (to_u8(r), to_u8(g), to_u8(b))
    }

}
