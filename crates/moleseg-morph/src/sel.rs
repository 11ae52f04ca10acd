//! Structuring elements
//!
//! A [`Sel`] is a small binary pattern with an origin. Cells that are on
//! ("hits") take part in erosion and dilation; the rest are ignored.
//!
//! Shapes follow the usual kernel conventions, with the origin at
//! `(width / 2, height / 2)`:
//!
//! - [`KernelShape::Rect`]: every cell on
//! - [`KernelShape::Cross`]: the origin row and origin column
//! - [`KernelShape::Ellipse`]: the ellipse inscribed in the rectangle,
//!   computed row by row as `c ± round(c * sqrt(1 - dy² / r²))` with
//!   `r = height / 2`, `c = width / 2`

use crate::{MorphError, MorphResult};
use moleseg_core::{Pix, PixelDepth};

/// Kernel shape for [`Sel::from_shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelShape {
    Rect,
    Cross,
    Ellipse,
}

/// Structuring element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sel {
    /// Width of the element
    width: u32,
    /// Height of the element
    height: u32,
    /// Origin x
    cx: u32,
    /// Origin y
    cy: u32,
    /// Row-major hit flags
    data: Vec<bool>,
    /// Optional name for diagnostics
    name: Option<String>,
}

impl Sel {
    /// Create an element with every cell off and the origin at the center.
    pub fn new(width: u32, height: u32) -> MorphResult<Self> {
        if width == 0 || height == 0 {
            return Err(MorphError::InvalidSel(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Sel {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![false; (width * height) as usize],
            name: None,
        })
    }

    /// Create a kernel of the given shape and size.
    pub fn from_shape(shape: KernelShape, width: u32, height: u32) -> MorphResult<Self> {
        let mut sel = Self::new(width, height)?;
        let (w, h) = (width as i64, height as i64);
        let (cx, cy) = (sel.cx as i64, sel.cy as i64);
        // A 1x1 ellipse or cross is a single cell either way
        let shape = if width == 1 && height == 1 {
            KernelShape::Rect
        } else {
            shape
        };

        let r = h / 2;
        let c = w / 2;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        for y in 0..h {
            let (x0, x1) = match shape {
                KernelShape::Rect => (0, w),
                KernelShape::Cross if y == cy => (0, w),
                KernelShape::Cross => (cx, cx + 1),
                KernelShape::Ellipse => {
                    let dy = y - r;
                    if dy.abs() > r {
                        (0, 0)
                    } else {
                        let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt())
                            .round() as i64;
                        ((c - dx).max(0), (c + dx + 1).min(w))
                    }
                }
            };
            for x in x0..x1 {
                sel.set(x as u32, y as u32, true);
            }
        }

        sel.name = Some(format!("{:?}{}x{}", shape, width, height).to_lowercase());
        Ok(sel)
    }

    /// Rectangle with every cell on.
    pub fn create_brick(width: u32, height: u32) -> MorphResult<Self> {
        Self::from_shape(KernelShape::Rect, width, height)
    }

    /// Square ellipse (a disk) of side `size`.
    pub fn create_ellipse(size: u32) -> MorphResult<Self> {
        Self::from_shape(KernelShape::Ellipse, size, size)
    }

    /// Square plus-shaped element of side `size`.
    pub fn create_cross(size: u32) -> MorphResult<Self> {
        Self::from_shape(KernelShape::Cross, size, size)
    }

    /// Parse a pattern: one line per row, `x` for a hit, `.` or space for off.
    ///
    /// The origin is placed at the center.
    pub fn from_string(pattern: &str) -> MorphResult<Self> {
        let rows: Vec<&str> = pattern
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut sel = Self::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                match ch {
                    'x' | 'X' => sel.set(x as u32, y as u32, true),
                    '.' | ' ' => {}
                    other => {
                        return Err(MorphError::InvalidSel(format!(
                            "unexpected character {:?} in pattern",
                            other
                        )));
                    }
                }
            }
        }
        Ok(sel)
    }

    /// Build an element from a 1 bpp image; foreground cells are hits.
    pub fn from_pix(pix: &Pix) -> MorphResult<Self> {
        if pix.depth() != PixelDepth::Bit1 {
            return Err(MorphError::UnsupportedDepth {
                expected: "1 bpp",
                actual: pix.depth().bits(),
            });
        }
        let mut sel = Self::new(pix.width(), pix.height())?;
        for y in 0..pix.height() {
            for x in 0..pix.width() {
                if pix.get_pixel_unchecked(x, y) != 0 {
                    sel.set(x, y, true);
                }
            }
        }
        Ok(sel)
    }

    /// Render the element as a 1 bpp image (hits are foreground).
    pub fn to_pix(&self) -> MorphResult<Pix> {
        let mut pm = Pix::new(self.width, self.height, PixelDepth::Bit1)?.to_mut();
        for (x, y) in self.hits() {
            pm.set_pixel_unchecked(x, y, 1);
        }
        Ok(pm.into())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin_x(&self) -> u32 {
        self.cx
    }

    pub fn origin_y(&self) -> u32 {
        self.cy
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the cell at (x, y) is a hit.
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Turn the cell at (x, y) on or off. Out-of-range cells are ignored.
    pub fn set(&mut self, x: u32, y: u32, hit: bool) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = hit;
        }
    }

    /// Number of hit cells
    pub fn hit_count(&self) -> usize {
        self.data.iter().filter(|&&h| h).count()
    }

    fn hits(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &hit)| hit)
            .map(move |(idx, _)| (idx as u32 % width, idx as u32 / width))
    }

    /// Iterate over hit positions relative to the origin
    pub fn hit_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (cx, cy) = (self.cx as i32, self.cy as i32);
        self.hits().map(move |(x, y)| (x as i32 - cx, y as i32 - cy))
    }

    /// Largest hit offsets as `(left, right, up, down)`, all non-negative.
    pub fn max_translations(&self) -> (u32, u32, u32, u32) {
        self.hit_offsets()
            .fold((0, 0, 0, 0), |(l, r, u, d), (dx, dy)| {
                (
                    l.max((-dx).max(0) as u32),
                    r.max(dx.max(0) as u32),
                    u.max((-dy).max(0) as u32),
                    d.max(dy.max(0) as u32),
                )
            })
    }

    /// Point reflection through the origin.
    pub fn reflect(&self) -> Self {
        let mut out = self.clone();
        out.data.fill(false);
        out.cx = self.width - 1 - self.cx;
        out.cy = self.height - 1 - self.cy;
        for (x, y) in self.hits() {
            out.set(self.width - 1 - x, self.height - 1 - y, true);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_and_cross() {
        let rect = Sel::create_brick(5, 3).unwrap();
        assert_eq!(rect.hit_count(), 15);
        assert_eq!((rect.origin_x(), rect.origin_y()), (2, 1));

        let cross = Sel::create_cross(5).unwrap();
        assert_eq!(cross.hit_count(), 9);
        assert_eq!(cross.get(2, 0), Some(true));
        assert_eq!(cross.get(0, 2), Some(true));
        assert_eq!(cross.get(1, 1), Some(false));
    }

    #[test]
    fn test_ellipse_7x7_rows() {
        let sel = Sel::create_ellipse(7).unwrap();
        let widths: Vec<usize> = (0..7)
            .map(|y| (0..7).filter(|&x| sel.get(x, y) == Some(true)).count())
            .collect();
        assert_eq!(widths, vec![1, 5, 7, 7, 7, 5, 1]);
        assert_eq!(sel.hit_count(), 33);
    }

    #[test]
    fn test_ellipse_is_symmetric() {
        for size in [3, 9, 11, 23, 25] {
            let sel = Sel::create_ellipse(size).unwrap();
            assert_eq!(sel.reflect().data, sel.data, "size {}", size);
            assert_eq!(sel.get(size / 2, size / 2), Some(true));
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Sel::from_shape(KernelShape::Ellipse, 0, 3).is_err());
    }

    #[test]
    fn test_pix_conversion() {
        let sel = Sel::from_string("x.x\n.x.\nx.x").unwrap();
        let pix = sel.to_pix().unwrap();
        assert_eq!(pix.count_pixels(), 5);
        let back = Sel::from_pix(&pix).unwrap();
        assert_eq!(back.hit_count(), 5);
        assert_eq!(back.get(1, 1), Some(true));
        assert_eq!(back.get(1, 0), Some(false));
    }

    #[test]
    fn test_max_translations() {
        let mut sel = Sel::new(5, 3).unwrap();
        sel.set(0, 1, true);
        sel.set(3, 2, true);
        assert_eq!(sel.max_translations(), (2, 1, 0, 1));
    }
}
