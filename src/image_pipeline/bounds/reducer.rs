use tracing::{debug, instrument, trace};

use crate::image_pipeline::bounds::accumulator::BoundingAccumulator;
use crate::image_pipeline::bounds::scanner::scan_scanline;
use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::reader::RowReader;
use crate::image_pipeline::container::types::ImageMetadata;
use crate::image_pipeline::window::RasterWindow;

/// Computes the bounding window of all non-zero samples of an image.
///
/// Every channel of a row is read and scanned before the next row, rows go
/// in increasing y, and only one row buffer per channel is alive at a time.
pub struct BoundingBoxReducer<'m> {
    metadata: &'m ImageMetadata,
}

impl<'m> BoundingBoxReducer<'m> {
    pub fn new(metadata: &'m ImageMetadata) -> Self {
        Self { metadata }
    }

    /// Folds every channel of row `y` into `accumulator`.
    pub fn scan_row<R: RowReader + ?Sized>(
        &self,
        rows: &mut R,
        y: i32,
        accumulator: BoundingAccumulator,
    ) -> Result<BoundingAccumulator> {
        let mut row_bounds = BoundingAccumulator::new();

        for channel in &self.metadata.channels {
            let scanline = rows.read_row(&channel.name, y)?;
            row_bounds = scan_scanline(&scanline, y, row_bounds);
        }

        if let Some(window) = row_bounds.finish() {
            trace!(y, min_x = window.min_x, max_x = window.max_x, "row has content");
        }

        Ok(accumulator.merge(row_bounds))
    }

    /// Bounding window over the whole data window, or [`CropError::EmptyImage`]
    /// when no channel holds a non-zero sample anywhere.
    #[instrument(skip_all, fields(data_window = %self.metadata.data_window))]
    pub fn reduce<R: RowReader + ?Sized>(&self, rows: &mut R) -> Result<RasterWindow> {
        let window = self.metadata.data_window;
        let mut accumulator = BoundingAccumulator::new();

        for y in window.min_y..=window.max_y {
            accumulator = self.scan_row(rows, y, accumulator)?;
        }

        let bounds = accumulator.finish().ok_or(CropError::EmptyImage)?;
        debug!(bounds = %bounds, "bounds pass complete");
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::image_pipeline::container::memory::MemoryImage;
    use crate::image_pipeline::container::reader::ImageReader;
    use crate::image_pipeline::container::types::{ChannelSpec, PixelType};

    fn image(window: RasterWindow, channels: &[&str]) -> MemoryImage {
        let channels = channels
            .iter()
            .map(|name| ChannelSpec::new(*name, PixelType::Half))
            .collect();
        MemoryImage::new(ImageMetadata::new(window, channels))
    }

    fn reduce(image: &MemoryImage) -> Result<RasterWindow> {
        let (metadata, mut rows) = image.open_for_read(Path::new("memory")).unwrap();
        BoundingBoxReducer::new(&metadata).reduce(&mut rows)
    }

    #[test]
    fn test_all_zero_image_is_empty() {
        let image = image(RasterWindow::new(0, 0, 9, 9), &["R", "G", "B"]);
        assert!(matches!(reduce(&image), Err(CropError::EmptyImage)));
    }

    #[test]
    fn test_single_sample() {
        let mut image = image(RasterWindow::new(0, 0, 9, 9), &["Y"]);
        image.set_sample("Y", 6, 4, 1.0).unwrap();
        assert_eq!(reduce(&image).unwrap(), RasterWindow::new(6, 4, 6, 4));
    }

    #[test]
    fn test_rectangular_block() {
        let mut image = image(RasterWindow::new(0, 0, 9, 9), &["Y"]);
        for y in 3..=5 {
            for x in 2..=7 {
                image.set_sample("Y", x, y, 0.25).unwrap();
            }
        }

        let bounds = reduce(&image).unwrap();
        assert_eq!(bounds, RasterWindow::new(2, 3, 7, 5));
        assert_eq!(bounds.width(), 6);
        assert_eq!(bounds.height(), 3);
    }

    #[test]
    fn test_union_across_channels() {
        let mut image = image(RasterWindow::new(0, 0, 9, 9), &["A", "B"]);
        image.set_sample("A", 0, 0, 1.0).unwrap();
        image.set_sample("B", 9, 9, 1.0).unwrap();
        assert_eq!(reduce(&image).unwrap(), RasterWindow::new(0, 0, 9, 9));
    }

    #[test]
    fn test_offset_data_window() {
        let data_window = RasterWindow::new(-20, 100, 19, 139);
        let mut image = image(data_window, &["R", "G"]);
        image.set_sample("R", -18, 101, 1.0).unwrap();
        image.set_sample("G", 4, 130, -2.0).unwrap();

        let bounds = reduce(&image).unwrap();
        assert_eq!(bounds, RasterWindow::new(-18, 101, 4, 130));
        assert!(data_window.contains(&bounds));
    }

    #[test]
    fn test_reads_every_row_in_order() {
        let mut image = image(RasterWindow::new(0, 2, 3, 6), &["Y"]);
        image.set_sample("Y", 1, 4, 1.0).unwrap();
        reduce(&image).unwrap();
        assert_eq!(image.rows_read(), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_reader_failure_propagates() {
        let mut image = image(RasterWindow::new(0, 0, 3, 3), &["Y"]);
        image.set_sample("Y", 0, 0, 1.0).unwrap();
        let image = image.failing_at_row(2);
        assert!(matches!(reduce(&image), Err(CropError::IoError(_))));
    }
}
