use crate::image_pipeline::window::RasterWindow;

/// Running union of every non-zero sample position seen so far.
///
/// Passed by value through the scan so each row can be checked in isolation.
/// `seen_any_pixel` is true exactly when `current` is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingAccumulator {
    pub current: RasterWindow,
    pub seen_any_pixel: bool,
}

impl Default for BoundingAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingAccumulator {
    pub const fn new() -> Self {
        Self {
            current: RasterWindow::empty(),
            seen_any_pixel: false,
        }
    }

    pub fn include_point(self, x: i32, y: i32) -> Self {
        Self {
            current: self.current.union_with_point(x, y),
            seen_any_pixel: true,
        }
    }

    pub fn merge(self, other: BoundingAccumulator) -> Self {
        if !other.seen_any_pixel {
            return self;
        }

        Self {
            current: self.current.union(other.current),
            seen_any_pixel: true,
        }
    }

    /// The accumulated window, or `None` when nothing was seen.
    pub fn finish(self) -> Option<RasterWindow> {
        self.seen_any_pixel.then_some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accumulator_is_empty() {
        let accumulator = BoundingAccumulator::new();
        assert!(!accumulator.seen_any_pixel);
        assert!(accumulator.current.is_empty());
        assert_eq!(accumulator.finish(), None);
    }

    #[test]
    fn test_merge() {
        let a = BoundingAccumulator::new().include_point(0, 0);
        let b = BoundingAccumulator::new().include_point(9, 9);
        let merged = a.merge(b);
        assert_eq!(merged.finish(), Some(RasterWindow::new(0, 0, 9, 9)));
        assert_eq!(merged.merge(BoundingAccumulator::new()), merged);
        assert_eq!(BoundingAccumulator::new().merge(a), a);
    }
}
