//! Channel extraction from 3-sample color images
//!
//! A 32 bpp color `Pix` stores three samples per pixel in storage order:
//! first sample in the MSB, then the second and third. Which *color* each
//! sample holds depends on the decoding pipeline that produced the buffer.
//! Desktop decoders commonly hand over BGR, mobile decoders RGB, and
//! nothing in the buffer records which one it was.
//!
//! Every function here that talks about a logical color therefore takes a
//! [`ChannelOrder`], which has no `Default`.

use super::{Pix, PixelDepth};
use crate::color;
use crate::error::{Error, Result};

/// Sample position within a packed 32 bpp pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleIndex {
    /// Sample stored in the MSB
    First,
    /// Middle sample
    Second,
    /// Sample stored third
    Third,
}

impl SampleIndex {
    fn shift(self) -> u32 {
        match self {
            SampleIndex::First => color::RED_SHIFT,
            SampleIndex::Second => color::GREEN_SHIFT,
            SampleIndex::Third => color::BLUE_SHIFT,
        }
    }
}

/// Logical color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

/// Mapping from logical color to sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Samples are stored red, green, blue
    Rgb,
    /// Samples are stored blue, green, red
    Bgr,
}

impl ChannelOrder {
    /// Sample position that holds `channel` under this ordering.
    pub fn sample_of(self, channel: ColorChannel) -> SampleIndex {
        match (self, channel) {
            (_, ColorChannel::Green) => SampleIndex::Second,
            (ChannelOrder::Rgb, ColorChannel::Red) | (ChannelOrder::Bgr, ColorChannel::Blue) => {
                SampleIndex::First
            }
            (ChannelOrder::Rgb, ColorChannel::Blue) | (ChannelOrder::Bgr, ColorChannel::Red) => {
                SampleIndex::Third
            }
        }
    }
}

impl Pix {
    /// Extract one stored sample of a 32 bpp color image as an 8 bpp image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] unless the image is 32 bpp.
    pub fn extract_sample(&self, sample: SampleIndex) -> Result<Pix> {
        check_color(self)?;
        let (w, h) = self.dimensions();
        let shift = sample.shift();
        let mut out = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
        for y in 0..h {
            for x in 0..w {
                let val = (self.get_pixel_unchecked(x, y) >> shift) & 0xff;
                out.set_pixel_unchecked(x, y, val);
            }
        }
        Ok(out.into())
    }

    /// Extract a logical color channel as an 8 bpp image.
    pub fn extract_channel(&self, channel: ColorChannel, order: ChannelOrder) -> Result<Pix> {
        self.extract_sample(order.sample_of(channel))
    }

    /// Convert a 32 bpp color image to 8 bpp luminance.
    ///
    /// Uses the Rec. 601 weights 0.299 R + 0.587 G + 0.114 B, so the channel
    /// order matters here too.
    pub fn make_gray(&self, order: ChannelOrder) -> Result<Pix> {
        check_color(self)?;
        let (w, h) = self.dimensions();
        let rs = order.sample_of(ColorChannel::Red).shift();
        let gs = order.sample_of(ColorChannel::Green).shift();
        let bs = order.sample_of(ColorChannel::Blue).shift();
        let mut out = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
        for y in 0..h {
            for x in 0..w {
                let p = self.get_pixel_unchecked(x, y);
                let r = ((p >> rs) & 0xff) as f32;
                let g = ((p >> gs) & 0xff) as f32;
                let b = ((p >> bs) & 0xff) as f32;
                let val = (0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0);
                out.set_pixel_unchecked(x, y, val as u32);
            }
        }
        Ok(out.into())
    }
}

fn check_color(pix: &Pix) -> Result<()> {
    if pix.depth() != PixelDepth::Bit32 || pix.spp() < 3 {
        return Err(Error::UnsupportedDepth(pix.depth().bits()));
    }
    Ok(())
}
