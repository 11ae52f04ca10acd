//! JPEG decoding
//!
//! Camera captures arrive as JPEG. Decoding only: results are never written
//! back lossy.

use crate::{IoError, IoResult};
use jpeg_decoder::{Decoder, PixelFormat};
use moleseg_core::{Pix, PixelDepth, color};
use std::io::BufRead;

/// Read a JPEG image
///
/// Grayscale decodes to 8 bpp, color to 32 bpp with samples in decoder
/// order (R, G, B).
pub fn read_jpeg<R: BufRead>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    let data = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing".to_string()))?;

    let width = info.width as u32;
    let height = info.height as u32;
    let (depth, samples) = match info.pixel_format {
        PixelFormat::L8 => (PixelDepth::Bit8, 1usize),
        PixelFormat::RGB24 => (PixelDepth::Bit32, 3),
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported JPEG pixel format: {:?}",
                other
            )));
        }
    };

    let expected = width as usize * height as usize * samples;
    if data.len() < expected {
        return Err(IoError::InvalidData(format!(
            "JPEG data too short: {} < {}",
            data.len(),
            expected
        )));
    }

    let mut pix_mut = Pix::new(width, height, depth)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize * width as usize + x as usize) * samples;
            let val = match depth {
                PixelDepth::Bit8 => data[idx] as u32,
                _ => color::compose_rgb(data[idx], data[idx + 1], data[idx + 2]),
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }
    Ok(pix_mut.into())
}
