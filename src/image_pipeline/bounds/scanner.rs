use half::f16;

use crate::image_pipeline::bounds::accumulator::BoundingAccumulator;
use crate::image_pipeline::container::types::ScanlineBuffer;

/// IEEE inequality with zero: NaN counts as non-zero, negative zero does not.
fn is_nonzero(sample: &f16) -> bool {
    *sample != f16::ZERO
}

/// Folds the first and last non-zero sample of one channel's row into `accumulator`.
///
/// `row` is addressed by absolute x through its origin, so the returned
/// bounds are in data window coordinates. A row without any non-zero sample
/// leaves the accumulator untouched.
pub fn scan_scanline(row: &ScanlineBuffer, y: i32, accumulator: BoundingAccumulator) -> BoundingAccumulator {
    let samples = row.samples();

    let Some(first) = samples.iter().position(is_nonzero) else {
        return accumulator;
    };
    // a non-zero sample exists, so searching from the right finds one too
    let last = samples.iter().rposition(is_nonzero).unwrap_or(first);

    let origin = row.origin_x();
    accumulator
        .include_point(origin + first as i32, y)
        .include_point(origin + last as i32, y)
}

#[cfg(test)]
mod tests {
    use half::f16;

    use super::*;
    use crate::image_pipeline::window::RasterWindow;

    fn row(origin_x: i32, values: &[f32]) -> ScanlineBuffer {
        ScanlineBuffer::new(origin_x, values.iter().map(|&v| f16::from_f32(v)).collect())
    }

    #[test]
    fn test_zero_row_contributes_nothing() {
        let result = scan_scanline(&row(0, &[0.0; 8]), 4, BoundingAccumulator::new());
        assert_eq!(result, BoundingAccumulator::new());
    }

    #[test]
    fn test_first_and_last_nonzero() {
        let result = scan_scanline(
            &row(0, &[0.0, 0.0, 1.0, 0.0, 0.5, 0.0, 0.0]),
            3,
            BoundingAccumulator::new(),
        );
        assert_eq!(result.finish(), Some(RasterWindow::new(2, 3, 4, 3)));
    }

    #[test]
    fn test_single_sample_gives_single_point() {
        let result = scan_scanline(&row(0, &[0.0, 0.0, 0.0, 2.0]), 7, BoundingAccumulator::new());
        assert_eq!(result.finish(), Some(RasterWindow::new(3, 7, 3, 7)));
    }

    #[test]
    fn test_origin_offset_is_applied() {
        let result = scan_scanline(&row(-10, &[0.0, 1.0, 0.0, 1.0]), -2, BoundingAccumulator::new());
        assert_eq!(result.finish(), Some(RasterWindow::new(-9, -2, -7, -2)));
    }

    #[test]
    fn test_nan_counts_as_nonzero() {
        let mut samples = vec![f16::ZERO; 5];
        samples[1] = f16::NAN;
        let result = scan_scanline(&ScanlineBuffer::new(0, samples), 0, BoundingAccumulator::new());
        assert_eq!(result.finish(), Some(RasterWindow::new(1, 0, 1, 0)));
    }

    #[test]
    fn test_negative_zero_counts_as_zero() {
        let samples = vec![f16::ZERO, f16::NEG_ZERO, f16::ZERO];
        let result = scan_scanline(&ScanlineBuffer::new(0, samples), 0, BoundingAccumulator::new());
        assert!(!result.seen_any_pixel);
    }

    #[test]
    fn test_values_below_half_precision_are_zero() {
        // 1e-9 underflows to zero once truncated to half
        let result = scan_scanline(&row(0, &[1e-9, 0.0]), 0, BoundingAccumulator::new());
        assert!(!result.seen_any_pixel);
    }

    #[test]
    fn test_extends_existing_bounds() {
        let seeded = BoundingAccumulator::new().include_point(5, 1).include_point(6, 1);
        let result = scan_scanline(&row(0, &[0.0, 0.0, 3.0, 0.0]), 2, seeded);
        assert_eq!(result.finish(), Some(RasterWindow::new(2, 1, 6, 2)));
    }
}
