//! PNM (Portable Any Map) format support
//!
//! Reads PBM, PGM and PPM in both ASCII (P1/P2/P3) and binary (P4/P5/P6)
//! form. Writes binary P4, P5 or P6 depending on depth. Samples with a
//! maxval other than 255 are rescaled to 8 bits.

use crate::{IoError, IoResult};
use moleseg_core::pix::convert::clear_pad_bits;
use moleseg_core::{Pix, PixelDepth, color};
use std::io::{BufRead, Write};

/// Read a PNM image from a reader.
///
/// Returns a `Pix` at 1 bpp (PBM, black = foreground), 8 bpp (PGM) or
/// 32 bpp (PPM).
pub fn read_pnm<R: BufRead>(mut reader: R) -> IoResult<Pix> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let mut cur = Cursor { data: &bytes, pos: 0 };

    let magic = cur.take(2)?;
    let kind = match magic {
        b"P1" => 1,
        b"P2" => 2,
        b"P3" => 3,
        b"P4" => 4,
        b"P5" => 5,
        b"P6" => 6,
        _ => return Err(IoError::InvalidData("bad PNM magic".to_string())),
    };

    let width = cur.header_value()?;
    let height = cur.header_value()?;
    let maxval = if kind == 1 || kind == 4 {
        1
    } else {
        cur.header_value()?
    };
    if maxval == 0 || maxval > 255 {
        return Err(IoError::UnsupportedFormat(format!(
            "PNM maxval {} not supported",
            maxval
        )));
    }
    let depth = match kind {
        1 | 4 => PixelDepth::Bit1,
        2 | 5 => PixelDepth::Bit8,
        _ => PixelDepth::Bit32,
    };
    let mut pix_mut = Pix::new(width, height, depth)?.to_mut();
    let scale = |v: u32| -> u32 { (v.min(maxval) * 255 + maxval / 2) / maxval };

    if kind >= 4 {
        // Exactly one whitespace byte separates the header from the raster
        cur.take(1)?;
    }

    match kind {
        1 => {
            for y in 0..height {
                for x in 0..width {
                    let bit = cur.ascii_bit()?;
                    pix_mut.set_pixel_unchecked(x, y, bit);
                }
            }
        }
        2 | 3 => {
            for y in 0..height {
                for x in 0..width {
                    let val = if kind == 2 {
                        scale(cur.header_value()?)
                    } else {
                        let r = scale(cur.header_value()?) as u8;
                        let g = scale(cur.header_value()?) as u8;
                        let b = scale(cur.header_value()?) as u8;
                        color::compose_rgb(r, g, b)
                    };
                    pix_mut.set_pixel_unchecked(x, y, val);
                }
            }
        }
        4 => {
            let row_bytes = (width as usize).div_ceil(8);
            for y in 0..height {
                let row = cur.take(row_bytes)?;
                for x in 0..width {
                    let byte = row[x as usize / 8];
                    let bit = (byte >> (7 - (x % 8))) & 1;
                    pix_mut.set_pixel_unchecked(x, y, bit as u32);
                }
            }
        }
        5 => {
            for y in 0..height {
                let row = cur.take(width as usize)?;
                for x in 0..width {
                    pix_mut.set_pixel_unchecked(x, y, scale(row[x as usize] as u32));
                }
            }
        }
        _ => {
            for y in 0..height {
                let row = cur.take(width as usize * 3)?;
                for x in 0..width {
                    let i = x as usize * 3;
                    let r = scale(row[i] as u32) as u8;
                    let g = scale(row[i + 1] as u32) as u8;
                    let b = scale(row[i + 2] as u32) as u8;
                    pix_mut.set_pixel_unchecked(x, y, color::compose_rgb(r, g, b));
                }
            }
        }
    }

    let wpl = pix_mut.wpl() as usize;
    if depth == PixelDepth::Bit1 {
        clear_pad_bits(pix_mut.data_mut(), width, wpl);
    }
    Ok(pix_mut.into())
}

/// Write a `Pix` as binary PNM to a writer.
///
/// Chooses P4 (1 bpp), P5 (8 bpp) or P6 (32 bpp color). Label images are
/// rejected.
pub fn write_pnm<W: Write>(pix: &Pix, mut writer: W) -> IoResult<()> {
    let (w, h) = pix.dimensions();
    match pix.depth() {
        PixelDepth::Bit1 => {
            write!(writer, "P4\n{} {}\n", w, h)?;
            let row_bytes = (w as usize).div_ceil(8);
            let mut row = vec![0u8; row_bytes];
            for y in 0..h {
                row.fill(0);
                for x in 0..w {
                    if pix.get_pixel_unchecked(x, y) != 0 {
                        row[x as usize / 8] |= 0x80 >> (x % 8);
                    }
                }
                writer.write_all(&row)?;
            }
        }
        PixelDepth::Bit8 => {
            write!(writer, "P5\n{} {}\n255\n", w, h)?;
            let mut row = vec![0u8; w as usize];
            for y in 0..h {
                for x in 0..w {
                    row[x as usize] = pix.get_pixel_unchecked(x, y) as u8;
                }
                writer.write_all(&row)?;
            }
        }
        PixelDepth::Bit32 if pix.spp() >= 3 => {
            write!(writer, "P6\n{} {}\n255\n", w, h)?;
            let mut row = vec![0u8; w as usize * 3];
            for y in 0..h {
                for x in 0..w {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    let i = x as usize * 3;
                    row[i..i + 3].copy_from_slice(&[r, g, b]);
                }
                writer.write_all(&row)?;
            }
        }
        PixelDepth::Bit32 => {
            return Err(IoError::UnsupportedFormat(
                "label images cannot be written as PNM".to_string(),
            ));
        }
    }
    Ok(())
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> IoResult<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(IoError::InvalidData("truncated PNM data".to_string()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip whitespace and `#` comments.
    fn skip_blank(&mut self) {
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b'#' => {
                    while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn header_value(&mut self) -> IoResult<u32> {
        self.skip_blank();
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| IoError::InvalidData("expected a number in PNM data".to_string()))
    }

    /// P1 bits may be packed without separators.
    fn ascii_bit(&mut self) -> IoResult<u32> {
        self.skip_blank();
        match self.take(1)? {
            b"0" => Ok(0),
            b"1" => Ok(1),
            _ => Err(IoError::InvalidData("bad PBM sample".to_string())),
        }
    }
}
