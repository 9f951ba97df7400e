//! In-memory image containers.
//!
//! Used to drive the crop passes without touching the file system, in tests
//! and benchmarks alike.

use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use half::f16;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::reader::{ImageReader, RowReader};
use crate::image_pipeline::container::types::{ImageMetadata, ScanlineBuffer};
use crate::image_pipeline::container::writer::{validate_row, ImageWriter, RowWriter};

/// Image held as one row-major plane of half samples per channel.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    metadata: ImageMetadata,
    planes: Arc<Vec<Vec<f16>>>,
    rows_read: Arc<Mutex<Vec<i32>>>,
    failing_row: Option<i32>,
}

impl MemoryImage {
    /// All-zero image described by `metadata`.
    pub fn new(metadata: ImageMetadata) -> Self {
        let window = metadata.data_window;
        let plane = vec![f16::ZERO; window.width() * window.height()];
        let planes = vec![plane; metadata.channels.len()];

        Self {
            metadata,
            planes: Arc::new(planes),
            rows_read: Arc::new(Mutex::new(Vec::new())),
            failing_row: None,
        }
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    fn plane_index(&self, x: i32, y: i32) -> Option<usize> {
        let window = self.metadata.data_window;
        if !window.contains_point(x, y) {
            return None;
        }

        let column = (x - window.min_x) as usize;
        let row = (y - window.min_y) as usize;
        Some(row * window.width() + column)
    }

    pub fn set_sample(&mut self, channel: &str, x: i32, y: i32, value: f32) -> Result<()> {
        let channel_index = self.metadata.channel_index(channel).ok_or_else(|| {
            CropError::Format(format!("unknown channel {channel}"))
        })?;
        let index = self.plane_index(x, y).ok_or_else(|| {
            CropError::Format(format!(
                "({x}, {y}) is outside data window {}",
                self.metadata.data_window
            ))
        })?;

        Arc::make_mut(&mut self.planes)[channel_index][index] = f16::from_f32(value);
        Ok(())
    }

    pub fn sample(&self, channel: &str, x: i32, y: i32) -> Option<f16> {
        let channel_index = self.metadata.channel_index(channel)?;
        let index = self.plane_index(x, y)?;
        Some(self.planes[channel_index][index])
    }

    /// Makes every read of row `y` fail with an I/O error.
    #[cfg(test)]
    pub fn failing_at_row(mut self, y: i32) -> Self {
        self.failing_row = Some(y);
        self
    }

    /// Distinct rows served so far by every reader opened on this image, in read order.
    pub fn rows_read(&self) -> Vec<i32> {
        self.rows_read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageReader for MemoryImage {
    type Rows = MemoryRowReader;

    fn read_metadata(&self, _path: &Path) -> Result<ImageMetadata> {
        Ok(self.metadata.clone())
    }

    fn open_rows(&self, _path: &Path, rows: RangeInclusive<i32>) -> Result<MemoryRowReader> {
        Ok(MemoryRowReader {
            image: self.clone(),
            rows,
            last_y: None,
        })
    }
}

pub struct MemoryRowReader {
    image: MemoryImage,
    rows: RangeInclusive<i32>,
    last_y: Option<i32>,
}

impl RowReader for MemoryRowReader {
    fn read_row(&mut self, channel: &str, y: i32) -> Result<ScanlineBuffer> {
        let window = self.image.metadata.data_window;

        if !self.rows.contains(&y) || !(window.min_y..=window.max_y).contains(&y) {
            return Err(CropError::IoError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("row {y} was not opened for reading"),
            )));
        }
        if self.last_y.is_some_and(|last| y < last) {
            return Err(CropError::Protocol(format!("row {y} requested after a later row")));
        }
        if self.image.failing_row == Some(y) {
            return Err(CropError::IoError(io::Error::other(format!("failed reading row {y}"))));
        }

        let channel_index = self.image.metadata.channel_index(channel).ok_or_else(|| {
            CropError::IoError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown channel {channel}"),
            ))
        })?;

        if self.last_y != Some(y) {
            self.image
                .rows_read
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(y);
            self.last_y = Some(y);
        }

        let width = window.width();
        let start = (y - window.min_y) as usize * width;
        let samples = self.image.planes[channel_index][start..start + width].to_vec();
        Ok(ScanlineBuffer::new(window.min_x, samples))
    }
}

/// An image accepted by [`RecordingWriter`].
#[derive(Debug, Clone)]
pub struct RecordedImage {
    pub path: PathBuf,
    pub metadata: ImageMetadata,
    pub rows: Vec<Vec<ScanlineBuffer>>,
}

impl RecordedImage {
    /// Sample of `channel` at absolute `(x, y)` in the recorded data window.
    pub fn sample(&self, channel: &str, x: i32, y: i32) -> Option<f16> {
        let channel_index = self.metadata.channel_index(channel)?;
        let row = usize::try_from(y - self.metadata.data_window.min_y).ok()?;
        self.rows.get(row)?.get(channel_index)?.sample_at(x)
    }
}

/// Image writer that keeps every completed image in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    images: Arc<Mutex<Vec<RecordedImage>>>,
    fail_after_rows: Option<usize>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `rows` rows, then fails every further write with an I/O error.
    #[cfg(test)]
    pub fn failing_after(rows: usize) -> Self {
        Self {
            fail_after_rows: Some(rows),
            ..Self::default()
        }
    }

    pub fn images(&self) -> Vec<RecordedImage> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct RecordingRowWriter<'m> {
    metadata: &'m ImageMetadata,
    rows: Vec<Vec<ScanlineBuffer>>,
    fail_after_rows: Option<usize>,
}

impl RowWriter for RecordingRowWriter<'_> {
    fn write_row(&mut self, row: &[ScanlineBuffer]) -> Result<()> {
        if self.fail_after_rows.is_some_and(|limit| self.rows.len() >= limit) {
            return Err(CropError::IoError(io::Error::other("recording writer refused row")));
        }

        validate_row(row, self.metadata, self.rows.len())?;
        self.rows.push(row.to_vec());
        Ok(())
    }
}

impl ImageWriter for RecordingWriter {
    fn open_for_write(
        &self,
        path: &Path,
        metadata: &ImageMetadata,
        write_rows: &mut dyn FnMut(&mut dyn RowWriter) -> Result<()>,
    ) -> Result<()> {
        let mut rows = RecordingRowWriter {
            metadata,
            rows: Vec::new(),
            fail_after_rows: self.fail_after_rows,
        };

        write_rows(&mut rows)?;

        let expected = metadata.data_window.height();
        if rows.rows.len() != expected {
            return Err(CropError::Protocol(format!(
                "{} rows written, data window {} needs {}",
                rows.rows.len(),
                metadata.data_window,
                expected
            )));
        }

        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedImage {
                path: path.to_path_buf(),
                metadata: metadata.clone(),
                rows: rows.rows,
            });
        Ok(())
    }
}
