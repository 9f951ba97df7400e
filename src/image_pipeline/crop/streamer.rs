use tracing::{debug, instrument, trace};

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::reader::RowReader;
use crate::image_pipeline::container::types::{ImageMetadata, ScanlineBuffer};
use crate::image_pipeline::container::writer::RowWriter;
use crate::image_pipeline::window::RasterWindow;

/// Copies the rows of the bounding window from a source image to a writer.
///
/// Rows are read at full data window width and narrowed by translating the
/// bounding window's x range into buffer indices, so the reader sees data
/// window coordinates while the writer sees bounding window coordinates.
pub struct CropStreamer<'m> {
    source: &'m ImageMetadata,
    bounds: RasterWindow,
}

impl<'m> CropStreamer<'m> {
    pub fn new(source: &'m ImageMetadata, bounds: RasterWindow) -> Result<Self> {
        if !source.data_window.contains(&bounds) {
            return Err(CropError::InvalidBounds {
                bounds,
                data_window: source.data_window,
            });
        }

        Ok(Self { source, bounds })
    }

    fn narrow(&self, scanline: &ScanlineBuffer, channel: &str, y: i32) -> Result<ScanlineBuffer> {
        scanline
            .window(self.bounds.min_x, self.bounds.max_x)
            .ok_or_else(|| {
                CropError::Protocol(format!(
                    "row {y} of channel {channel} covers x={}..{}, bounding window needs {}..={}",
                    scanline.origin_x(),
                    i64::from(scanline.origin_x()) + scanline.len() as i64,
                    self.bounds.min_x,
                    self.bounds.max_x
                ))
            })
    }

    /// Copies one row; nothing is written unless every channel was read.
    pub fn copy_row<R, W>(&self, rows: &mut R, output: &mut W, y: i32) -> Result<()>
    where
        R: RowReader + ?Sized,
        W: RowWriter + ?Sized,
    {
        let mut row = Vec::with_capacity(self.source.channels.len());

        for channel in &self.source.channels {
            let scanline = rows.read_row(&channel.name, y)?;
            row.push(self.narrow(&scanline, &channel.name, y)?);
        }

        output.write_row(&row)
    }

    /// Copies every row of the bounding window in increasing y and returns the row count.
    #[instrument(skip_all, fields(bounds = %self.bounds))]
    pub fn stream<R, W>(&self, rows: &mut R, output: &mut W) -> Result<usize>
    where
        R: RowReader + ?Sized,
        W: RowWriter + ?Sized,
    {
        let mut written = 0;

        for y in self.bounds.min_y..=self.bounds.max_y {
            self.copy_row(rows, output, y)?;
            written += 1;
            trace!(y, "row copied");
        }

        debug!(rows = written, "copy pass complete");
        Ok(written)
    }
}
