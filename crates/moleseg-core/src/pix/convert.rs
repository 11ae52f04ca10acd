//! Depth conversion between masks and grayscale
//!
//! Masks are 1 bpp internally. For display, or to feed a mask back into an
//! intensity operation, they are expanded to 8 bpp with foreground mapped to
//! a chosen value; 8 bpp images with only two levels can be packed back.

use super::{Pix, PixelDepth};
use crate::error::{Error, Result};

impl Pix {
    /// Expand a 1 bpp mask to 8 bpp.
    ///
    /// Background becomes `val0`, foreground becomes `val1`.
    pub fn convert_1_to_8(&self, val0: u8, val1: u8) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let (w, h) = self.dimensions();
        let mut out = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
        for y in 0..h {
            for x in 0..w {
                let v = if self.get_pixel_unchecked(x, y) != 0 {
                    val1
                } else {
                    val0
                };
                out.set_pixel_unchecked(x, y, v as u32);
            }
        }
        Ok(out.into())
    }

    /// Pack an 8 bpp or 32 bpp image into a 1 bpp mask.
    ///
    /// Every nonzero pixel becomes foreground. A 1 bpp input is returned as
    /// a shared clone.
    pub fn convert_to_binary(&self) -> Result<Pix> {
        if self.depth() == PixelDepth::Bit1 {
            return Ok(self.clone());
        }
        let (w, h) = self.dimensions();
        let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
        for y in 0..h {
            for x in 0..w {
                if self.get_pixel_unchecked(x, y) != 0 {
                    out.set_pixel_unchecked(x, y, 1);
                }
            }
        }
        Ok(out.into())
    }

    /// Invert a 1 bpp mask.
    pub fn invert_binary(&self) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let mut out = self.to_mut();
        for word in out.data_mut().iter_mut() {
            *word = !*word;
        }
        clear_pad_bits(out.data_mut(), self.width(), self.wpl() as usize);
        Ok(out.into())
    }
}

/// Clear the unused low bits in the last word of each 1 bpp row.
///
/// Word-level operations can set bits past the image width; those must stay
/// zero so that foreground counts and later word-level passes are exact.
pub fn clear_pad_bits(data: &mut [u32], width: u32, wpl: usize) {
    let extra = width % 32;
    if extra == 0 || wpl == 0 {
        return;
    }
    let mask = !0u32 << (32 - extra);
    for row in data.chunks_mut(wpl) {
        row[wpl - 1] &= mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1_to_8_and_back() {
        let mut pm = Pix::new(3, 2, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel_unchecked(2, 1, 1);
        let mask: Pix = pm.into();
        let gray = mask.convert_1_to_8(0, 255).unwrap();
        assert_eq!(gray.get_pixel(2, 1), Some(255));
        assert_eq!(gray.get_pixel(0, 0), Some(0));
        let back = gray.convert_to_binary().unwrap();
        assert_eq!(back.data(), mask.data());
    }

    #[test]
    fn test_invert_keeps_pad_bits_clear() {
        let mask = Pix::new(5, 2, PixelDepth::Bit1).unwrap();
        let inv = mask.invert_binary().unwrap();
        assert_eq!(inv.count_pixels(), 10);
        assert_eq!(inv.data()[0], 0xf800_0000);
    }
}
