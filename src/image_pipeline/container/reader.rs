use std::ops::RangeInclusive;
use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::container::types::{ImageMetadata, ScanlineBuffer};

/// Streams decoded rows of one image in increasing y.
pub trait RowReader {
    /// Full data-window-width row of `channel` at `y`, origin at the data window's min x.
    fn read_row(&mut self, channel: &str, y: i32) -> Result<ScanlineBuffer>;
}

pub trait ImageReader {
    type Rows: RowReader;

    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata>;

    /// Opens the pixels for streaming. Only rows inside `rows` may be requested.
    fn open_rows(&self, path: &Path, rows: RangeInclusive<i32>) -> Result<Self::Rows>;

    fn open_for_read(&self, path: &Path) -> Result<(ImageMetadata, Self::Rows)> {
        let metadata = self.read_metadata(path)?;
        let window = metadata.data_window;
        let rows = self.open_rows(path, window.min_y..=window.max_y)?;
        Ok((metadata, rows))
    }
}
