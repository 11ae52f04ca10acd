//! Binary morphological operations
//!
//! Erosion, dilation and their compositions on 1 bpp masks. Both basic
//! operations work a row at a time on packed words: for each hit of the
//! structuring element the source row is shifted by the hit offset and
//! AND-ed (erosion) or OR-ed (dilation) into the destination.
//!
//! Pixels outside the image are background for both operations, so erosion
//! shrinks masks that touch the frame. [`close`] pads the image first so
//! that closing never removes foreground.

use crate::{MorphError, MorphResult, Sel};
use moleseg_core::pix::convert::clear_pad_bits;
use moleseg_core::{Pix, PixMut, PixelDepth};

/// Dilate a mask
///
/// `out(x, y) = OR over hits (dx, dy) of in(x - dx, y - dy)`
pub fn dilate(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    check_binary(pix)?;
    check_sel_fits(pix, sel)?;
    Ok(dilate_words(pix, sel)?.into())
}

fn dilate_words(pix: &Pix, sel: &Sel) -> MorphResult<PixMut> {
    let h = pix.height() as i32;
    let wpl = pix.wpl() as usize;
    let mut out_mut = Pix::new(pix.width(), pix.height(), PixelDepth::Bit1)?.to_mut();

    let src_data = pix.data();
    let dst_data = out_mut.data_mut();

    for (dx, dy) in sel.hit_offsets() {
        for y in 0..h {
            let src_y = y - dy;
            if src_y < 0 || src_y >= h {
                continue;
            }
            let src_start = src_y as usize * wpl;
            let dst_start = y as usize * wpl;
            shift_or_row(
                &mut dst_data[dst_start..dst_start + wpl],
                &src_data[src_start..src_start + wpl],
                dx,
            );
        }
    }

    clear_pad_bits(out_mut.data_mut(), pix.width(), wpl);
    Ok(out_mut)
}

/// Erode a mask
///
/// `out(x, y) = AND over hits (dx, dy) of in(x + dx, y + dy)`, with
/// out-of-image samples counted as background.
pub fn erode(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    check_binary(pix)?;
    check_sel_fits(pix, sel)?;
    Ok(erode_words(pix, sel)?.into())
}

fn erode_words(pix: &Pix, sel: &Sel) -> MorphResult<PixMut> {
    let h = pix.height() as i32;
    let wpl = pix.wpl() as usize;
    let mut out_mut = Pix::new(pix.width(), pix.height(), PixelDepth::Bit1)?.to_mut();

    let src_data = pix.data();
    let dst_data = out_mut.data_mut();
    // An element with no hits erodes to everything
    dst_data.fill(0xFFFF_FFFF);

    for (dx, dy) in sel.hit_offsets() {
        for y in 0..h {
            let src_y = y + dy;
            let dst_start = y as usize * wpl;
            if src_y < 0 || src_y >= h {
                dst_data[dst_start..dst_start + wpl].fill(0);
                continue;
            }
            let src_start = src_y as usize * wpl;
            shift_and_row(
                &mut dst_data[dst_start..dst_start + wpl],
                &src_data[src_start..src_start + wpl],
                -dx,
            );
        }
    }

    clear_pad_bits(out_mut.data_mut(), pix.width(), wpl);
    Ok(out_mut)
}

/// Open a mask: erosion followed by dilation.
///
/// Removes foreground specks smaller than the element. The result is
/// always a subset of the input.
pub fn open(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    let eroded = erode(pix, sel)?;
    dilate(&eroded, sel)
}

/// Close a mask: dilation followed by erosion.
///
/// The image is padded by the element's extents first and cropped after,
/// so foreground near the frame is not eroded away. The result is always a
/// superset of the input.
pub fn close(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    check_binary(pix)?;
    check_sel_fits(pix, sel)?;
    let (left, right, up, down) = sel.max_translations();
    let xbord = left.max(right);
    let ybord = up.max(down);
    let padded = add_border(pix, xbord, ybord)?;
    let dilated: Pix = dilate_words(&padded, sel)?.into();
    let closed: Pix = erode_words(&dilated, sel)?.into();
    remove_border(&closed, xbord, ybord)
}

/// Morphological gradient: dilation minus erosion
pub fn gradient(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    let dilated = dilate(pix, sel)?;
    let eroded = erode(pix, sel)?;
    subtract(&dilated, &eroded)
}

/// Top-hat: input minus its opening
///
/// Foreground features smaller than the element.
pub fn top_hat(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    let opened = open(pix, sel)?;
    subtract(pix, &opened)
}

/// Black-hat: closing minus input
///
/// Background gaps smaller than the element.
pub fn black_hat(pix: &Pix, sel: &Sel) -> MorphResult<Pix> {
    let closed = close(pix, sel)?;
    subtract(&closed, pix)
}

/// `a AND NOT b` on same-sized masks
fn subtract(a: &Pix, b: &Pix) -> MorphResult<Pix> {
    a.check_same_size(b)?;
    let mut out_mut = a.to_mut();
    for (d, &s) in out_mut.data_mut().iter_mut().zip(b.data()) {
        *d &= !s;
    }
    Ok(out_mut.into())
}

fn add_border(pix: &Pix, xbord: u32, ybord: u32) -> MorphResult<Pix> {
    if xbord == 0 && ybord == 0 {
        return Ok(pix.clone());
    }
    let (w, h) = pix.dimensions();
    let mut out = Pix::new(w + 2 * xbord, h + 2 * ybord, PixelDepth::Bit1)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            if pix.get_pixel_unchecked(x, y) != 0 {
                out.set_pixel_unchecked(x + xbord, y + ybord, 1);
            }
        }
    }
    Ok(out.into())
}

fn remove_border(pix: &Pix, xbord: u32, ybord: u32) -> MorphResult<Pix> {
    if xbord == 0 && ybord == 0 {
        return Ok(pix.clone());
    }
    let w = pix.width() - 2 * xbord;
    let h = pix.height() - 2 * ybord;
    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    for y in 0..h {
        for x in 0..w {
            if pix.get_pixel_unchecked(x + xbord, y + ybord) != 0 {
                out.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(out.into())
}

/// OR `src` shifted right by `shift` pixels (left if negative) into `dst`.
fn shift_or_row(dst: &mut [u32], src: &[u32], shift: i32) {
    let wpl = dst.len();
    let abs_shift = shift.unsigned_abs() as usize;
    let word_shift = abs_shift / 32;
    let bit_shift = (abs_shift % 32) as u32;

    if word_shift >= wpl {
        return;
    }

    if shift >= 0 {
        for i in word_shift..wpl {
            let si = i - word_shift;
            let mut v = src[si] >> bit_shift;
            if bit_shift > 0 && si > 0 {
                v |= src[si - 1] << (32 - bit_shift);
            }
            dst[i] |= v;
        }
    } else {
        let end = wpl - word_shift;
        for i in 0..end {
            let si = i + word_shift;
            let mut v = src[si] << bit_shift;
            if bit_shift > 0 && si + 1 < wpl {
                v |= src[si + 1] >> (32 - bit_shift);
            }
            dst[i] |= v;
        }
    }
}

/// AND `src` shifted right by `shift` pixels (left if negative) into `dst`.
///
/// Bits shifted in from outside the row are zero.
fn shift_and_row(dst: &mut [u32], src: &[u32], shift: i32) {
    let wpl = dst.len();
    let abs_shift = shift.unsigned_abs() as usize;
    let word_shift = abs_shift / 32;
    let bit_shift = (abs_shift % 32) as u32;

    if word_shift >= wpl {
        dst.fill(0);
        return;
    }

    if shift >= 0 {
        dst[..word_shift].fill(0);
        for i in word_shift..wpl {
            let si = i - word_shift;
            let mut v = src[si] >> bit_shift;
            if bit_shift > 0 && si > 0 {
                v |= src[si - 1] << (32 - bit_shift);
            }
            dst[i] &= v;
        }
    } else {
        let end = wpl - word_shift;
        for i in 0..end {
            let si = i + word_shift;
            let mut v = src[si] << bit_shift;
            if bit_shift > 0 && si + 1 < wpl {
                v |= src[si + 1] >> (32 - bit_shift);
            }
            dst[i] &= v;
        }
        dst[end..].fill(0);
    }
}

fn check_binary(pix: &Pix) -> MorphResult<()> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(MorphError::UnsupportedDepth {
            expected: "1 bpp",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

fn check_sel_fits(pix: &Pix, sel: &Sel) -> MorphResult<()> {
    if sel.width() > pix.width() || sel.height() > pix.height() {
        return Err(MorphError::InvalidParameters(format!(
            "{}x{} element larger than {}x{} image",
            sel.width(),
            sel.height(),
            pix.width(),
            pix.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(w: u32, h: u32, on: &[(u32, u32)]) -> Pix {
        let mut pm = Pix::new(w, h, PixelDepth::Bit1).unwrap().to_mut();
        for &(x, y) in on {
            pm.set_pixel_unchecked(x, y, 1);
        }
        pm.into()
    }

    #[test]
    fn test_shift_rows_across_words() {
        let src = [0x0000_0001u32, 0x8000_0000];
        let mut dst = [0u32; 2];
        shift_or_row(&mut dst, &src, 1);
        assert_eq!(dst, [0, 0xC000_0000]);

        let mut dst = [0u32; 2];
        shift_or_row(&mut dst, &src, -1);
        assert_eq!(dst, [0x0000_0003, 0]);

        let mut dst = [!0u32; 2];
        shift_and_row(&mut dst, &src, 33);
        assert_eq!(dst, [0, 0]);
    }

    #[test]
    fn test_dilate_single_pixel() {
        let pix = mask(40, 5, &[(33, 2)]);
        let sel = Sel::create_brick(3, 3).unwrap();
        let out = dilate(&pix, &sel).unwrap();
        assert_eq!(out.count_pixels(), 9);
        assert_eq!(out.get_pixel(32, 1), Some(1));
        assert_eq!(out.get_pixel(34, 3), Some(1));
        assert_eq!(out.get_pixel(35, 2), Some(0));
    }

    #[test]
    fn test_erode_treats_outside_as_background() {
        let pm = {
            let mut pm = Pix::new(5, 5, PixelDepth::Bit1).unwrap().to_mut();
            pm.set_all_arbitrary(1);
            pm
        };
        let full: Pix = pm.into();
        let sel = Sel::create_brick(3, 3).unwrap();
        let out = erode(&full, &sel).unwrap();
        assert_eq!(out.count_pixels(), 9);
        assert_eq!(out.get_pixel(0, 0), Some(0));
        assert_eq!(out.get_pixel(1, 1), Some(1));
    }

    #[test]
    fn test_close_keeps_frame_foreground() {
        let pix = mask(8, 8, &[(0, 0), (0, 1), (7, 7)]);
        let sel = Sel::create_ellipse(5).unwrap();
        let closed = close(&pix, &sel).unwrap();
        for &(x, y) in &[(0, 0), (0, 1), (7, 7)] {
            assert_eq!(closed.get_pixel(x, y), Some(1));
        }
    }

    #[test]
    fn test_close_fills_gap() {
        let pix = mask(9, 3, &[(2, 1), (3, 1), (5, 1), (6, 1)]);
        let sel = Sel::create_brick(3, 1).unwrap();
        let closed = close(&pix, &sel).unwrap();
        assert_eq!(closed.get_pixel(4, 1), Some(1));
        assert_eq!(closed.count_pixels(), 5);
    }

    #[test]
    fn test_open_removes_speck() {
        let mut on: Vec<(u32, u32)> = (2..7).flat_map(|y| (2..7).map(move |x| (x, y))).collect();
        on.push((9, 9));
        let pix = mask(12, 12, &on);
        let sel = Sel::create_brick(3, 3).unwrap();
        let opened = open(&pix, &sel).unwrap();
        assert_eq!(opened.get_pixel(9, 9), Some(0));
        assert_eq!(opened.count_pixels(), 25);
    }

    #[test]
    fn test_gradient_and_hats() {
        let pix = mask(7, 7, &[(3, 3)]);
        let sel = Sel::create_brick(3, 3).unwrap();
        assert_eq!(gradient(&pix, &sel).unwrap().count_pixels(), 9);
        assert_eq!(top_hat(&pix, &sel).unwrap().count_pixels(), 1);
        assert_eq!(black_hat(&pix, &sel).unwrap().count_pixels(), 0);
    }

    #[test]
    fn test_sel_larger_than_image() {
        let pix = mask(4, 4, &[]);
        let sel = Sel::create_brick(5, 3).unwrap();
        assert!(matches!(
            erode(&pix, &sel),
            Err(MorphError::InvalidParameters(_))
        ));
        assert!(matches!(
            close(&pix, &sel),
            Err(MorphError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_gray() {
        let pix = Pix::new(8, 8, PixelDepth::Bit8).unwrap();
        let sel = Sel::create_brick(3, 3).unwrap();
        assert!(matches!(
            dilate(&pix, &sel),
            Err(MorphError::UnsupportedDepth { .. })
        ));
    }
}
