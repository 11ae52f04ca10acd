//! Box - Axis-aligned rectangle regions
//!
//! Used for component bounding boxes. Coordinates are in pixels; `right()`
//! and `bottom()` are exclusive.

use crate::error::{Error, Result};

/// A rectangle region
///
/// A small `Copy` type, freely passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Box {
    /// Create a new box
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is negative.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(Error::InvalidParameter(format!(
                "box dimensions must be non-negative: w={}, h={}",
                w, h
            )));
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a box without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Create the tightest box holding the inclusive corners
    /// `(xmin, ymin)` and `(xmax, ymax)`.
    pub const fn from_inclusive(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            x: xmin,
            y: ymin,
            w: xmax - xmin + 1,
            h: ymax - ymin + 1,
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Get the area
    #[inline]
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Check if the box is empty (zero area)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check if a point is inside the box
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check whether the box lies inside a `width` x `height` frame.
    pub fn lies_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.w >= 0
            && self.h >= 0
            && self.x as i64 + self.w as i64 <= width as i64
            && self.y as i64 + self.h as i64 <= height as i64
    }

    /// Check whether the box reaches any edge of a `width` x `height` frame.
    pub fn touches_frame(&self, width: u32, height: u32) -> bool {
        self.x <= 0
            || self.y <= 0
            || self.right() >= width as i32
            || self.bottom() >= height as i32
    }
}
