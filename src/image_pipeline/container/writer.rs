use std::path::Path;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::types::{ImageMetadata, ScanlineBuffer};

/// Accepts the rows of a new image, one call per row in increasing y.
pub trait RowWriter {
    /// `row` holds one buffer per channel, in metadata channel order, each
    /// spanning the output data window.
    fn write_row(&mut self, row: &[ScanlineBuffer]) -> Result<()>;
}

pub trait ImageWriter {
    /// Creates the container at `path` with `metadata` and hands a row writer
    /// to `write_rows`. The container is finalized once `write_rows` returns;
    /// headers cannot change after this call starts.
    fn open_for_write(
        &self,
        path: &Path,
        metadata: &ImageMetadata,
        write_rows: &mut dyn FnMut(&mut dyn RowWriter) -> Result<()>,
    ) -> Result<()>;
}

/// Checks that `row` may be written as row number `row_index` of an image described by `metadata`.
pub(crate) fn validate_row(row: &[ScanlineBuffer], metadata: &ImageMetadata, row_index: usize) -> Result<()> {
    let window = metadata.data_window;

    if row_index >= window.height() {
        return Err(CropError::Protocol(format!(
            "row {} written past the last row of data window {}",
            row_index, window
        )));
    }

    if row.len() != metadata.channels.len() {
        return Err(CropError::Protocol(format!(
            "row has {} channel buffers, image declares {} channels",
            row.len(),
            metadata.channels.len()
        )));
    }

    for (buffer, channel) in row.iter().zip(&metadata.channels) {
        if buffer.origin_x() != window.min_x || buffer.len() != window.width() {
            return Err(CropError::Protocol(format!(
                "channel {} buffer starts at x={} with {} samples, expected x={} with {}",
                channel.name,
                buffer.origin_x(),
                buffer.len(),
                window.min_x,
                window.width()
            )));
        }
    }

    Ok(())
}
