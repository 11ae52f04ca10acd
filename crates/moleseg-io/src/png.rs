//! PNG image format support
//!
//! 8-bit grayscale decodes to 8 bpp; RGB and RGBA decode to 32 bpp with the
//! samples in file order (alpha dropped). 1 bpp masks are written as 8-bit
//! grayscale with foreground white, so they read back as 0/255 intensities.

use crate::{IoError, IoResult};
use moleseg_core::{Pix, PixelDepth, color};
use png::{BitDepth, ColorType, Decoder, Encoder};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Pix> {
    let decoder = Decoder::new(reader);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let color_type = info.color_type;
    let bit_depth = info.bit_depth;

    let (pix_depth, samples) = match (color_type, bit_depth) {
        (ColorType::Grayscale, BitDepth::Eight) => (PixelDepth::Bit8, 1usize),
        (ColorType::GrayscaleAlpha, BitDepth::Eight) => (PixelDepth::Bit8, 2),
        (ColorType::Rgb, BitDepth::Eight) => (PixelDepth::Bit32, 3),
        (ColorType::Rgba, BitDepth::Eight) => (PixelDepth::Bit32, 4),
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNG format: {:?} {:?}",
                color_type, bit_depth
            )));
        }
    };

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];
    let mut pix_mut = Pix::new(width, height, pix_depth)?.to_mut();

    for y in 0..height {
        let row = &data[y as usize * bytes_per_row..];
        for x in 0..width {
            let idx = x as usize * samples;
            let val = match pix_depth {
                PixelDepth::Bit8 => row[idx] as u32,
                _ => color::compose_rgb(row[idx], row[idx + 1], row[idx + 2]),
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a PNG image
///
/// Label images (32 bpp, one sample) have no PNG representation; render
/// them first.
pub fn write_png<W: Write>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (color_type, samples) = match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => (ColorType::Grayscale, 1usize),
        PixelDepth::Bit32 if pix.spp() >= 3 => (ColorType::Rgb, 3),
        PixelDepth::Bit32 => {
            return Err(IoError::UnsupportedFormat(
                "label images cannot be written as PNG".to_string(),
            ));
        }
    };

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let bytes_per_row = width as usize * samples;
    let mut data = vec![0u8; bytes_per_row * height as usize];
    for y in 0..height {
        let row_start = y as usize * bytes_per_row;
        for x in 0..width {
            let val = pix.get_pixel_unchecked(x, y);
            match pix.depth() {
                PixelDepth::Bit1 => {
                    data[row_start + x as usize] = if val != 0 { 255 } else { 0 };
                }
                PixelDepth::Bit8 => data[row_start + x as usize] = val as u8,
                PixelDepth::Bit32 => {
                    let (r, g, b) = color::extract_rgb(val);
                    let idx = row_start + x as usize * 3;
                    data[idx..idx + 3].copy_from_slice(&[r, g, b]);
                }
            }
        }
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_gray_roundtrip() {
        let mut pm = Pix::new(5, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.set_pixel_unchecked(4, 2, 123);
        let pix: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();
        assert_eq!(back.depth(), PixelDepth::Bit8);
        assert_eq!(back.get_pixel(4, 2), Some(123));
    }

    #[test]
    fn test_mask_written_as_white_on_black() {
        let mut pm = Pix::new(9, 2, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel_unchecked(8, 1, 1);
        let mask: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&mask, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();
        assert_eq!(back.get_pixel(8, 1), Some(255));
        assert_eq!(back.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn test_rgb_keeps_sample_order() {
        let mut pm = Pix::new(2, 1, PixelDepth::Bit32).unwrap().to_mut();
        pm.set_rgb(1, 0, 9, 8, 7).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();
        assert_eq!(back.get_rgb(1, 0), Some((9, 8, 7)));
    }

    #[test]
    fn test_labels_rejected() {
        let labels = Pix::new_labels(2, 2).unwrap();
        let mut buf = Vec::new();
        assert!(matches!(
            write_png(&labels, &mut buf),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
