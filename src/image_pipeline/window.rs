//! Integer raster windows
//!
//! Display, data and bounding windows all share this representation.

use std::fmt;

/// Inclusive integer rectangle `(min_x, min_y) ..= (max_x, max_y)`.
///
/// A window is empty when its max corner lies below its min corner on either
/// axis. [`RasterWindow::empty`] is the canonical empty window `(0,0)-(-1,-1)`;
/// every operation treats all empty windows alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterWindow {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl RasterWindow {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub const fn empty() -> Self {
        Self::new(0, 0, -1, -1)
    }

    /// Window starting at `(x, y)` spanning `width` by `height` pixels.
    /// A zero extent yields an empty window anchored at the origin.
    pub fn from_origin_and_size(x: i32, y: i32, width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return Self::new(x, y, x - 1, y - 1);
        }

        Self::new(x, y, x + width as i32 - 1, y + height as i32 - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.max_x) - i64::from(self.min_x) + 1) as usize
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.max_y) - i64::from(self.min_y) + 1) as usize
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty()
            && (self.min_x..=self.max_x).contains(&x)
            && (self.min_y..=self.max_y).contains(&y)
    }

    /// True when `other` is non-empty and lies entirely inside `self`.
    pub fn contains(&self, other: &RasterWindow) -> bool {
        !other.is_empty()
            && self.contains_point(other.min_x, other.min_y)
            && self.contains_point(other.max_x, other.max_y)
    }

    /// Grows the window to include `(x, y)`. An empty window becomes the
    /// 1x1 window at that point.
    pub fn union_with_point(self, x: i32, y: i32) -> Self {
        if self.is_empty() {
            return Self::new(x, y, x, y);
        }

        Self::new(
            self.min_x.min(x),
            self.min_y.min(y),
            self.max_x.max(x),
            self.max_y.max(y),
        )
    }

    pub fn union(self, other: RasterWindow) -> Self {
        if other.is_empty() {
            return self;
        }

        self.union_with_point(other.min_x, other.min_y)
            .union_with_point(other.max_x, other.max_y)
    }

    pub fn intersect(&self, other: &RasterWindow) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }

        let overlap = Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );

        if overlap.is_empty() { Self::empty() } else { overlap }
    }
}

impl fmt::Display for RasterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) ({}, {}) {}x{}",
            self.min_x,
            self.min_y,
            self.max_x,
            self.max_y,
            self.width(),
            self.height()
        )
    }
}
