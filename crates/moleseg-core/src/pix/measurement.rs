//! Pixel counting

use super::{Pix, PixelDepth};

impl Pix {
    /// Count nonzero pixels.
    ///
    /// For a 1 bpp mask this is the foreground area.
    pub fn count_pixels(&self) -> u64 {
        match self.depth() {
            PixelDepth::Bit1 => self.data().iter().map(|w| w.count_ones() as u64).sum(),
            _ => {
                let (w, h) = self.dimensions();
                let mut count = 0u64;
                for y in 0..h {
                    for x in 0..w {
                        if self.get_pixel_unchecked(x, y) != 0 {
                            count += 1;
                        }
                    }
                }
                count
            }
        }
    }

    /// Count pixels equal to `val`.
    pub fn count_value(&self, val: u32) -> u64 {
        let (w, h) = self.dimensions();
        let mut count = 0u64;
        for y in 0..h {
            for x in 0..w {
                if self.get_pixel_unchecked(x, y) == val {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_binary_ignores_padding() {
        let mut pm = Pix::new(40, 2, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel_unchecked(39, 1, 1);
        pm.set_pixel_unchecked(0, 0, 1);
        let pix: Pix = pm.into();
        assert_eq!(pix.count_pixels(), 2);
        assert_eq!(pix.count_value(0), 78);
    }

    #[test]
    fn test_count_labels() {
        let mut pm = Pix::new_labels(3, 3).unwrap().to_mut();
        pm.set_pixel_unchecked(1, 1, 7);
        pm.set_pixel_unchecked(2, 1, 7);
        let pix: Pix = pm.into();
        assert_eq!(pix.count_pixels(), 2);
        assert_eq!(pix.count_value(7), 2);
    }
}
