//! OpenEXR scanline reader built on the `exr` crate's block API.
//!
//! Only blocks overlapping the requested rows are decompressed, and only the
//! blocks still ahead of the last requested row are kept in memory. For files
//! stored in increasing line order that is a single block (1 to 32 rows).

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader};
use std::ops::RangeInclusive;
use std::path::Path;

use exr::block::reader::{ChunksReader, FilteredChunksReader, SequentialBlockDecompressor};
use exr::block::UncompressedBlock;
use exr::meta::attribute::SampleType;
use exr::meta::header::Header;
use exr::meta::MetaData;
use half::f16;
use tracing::{debug, warn};

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::reader::{ImageReader, RowReader};
use crate::image_pipeline::container::types::{ImageMetadata, ScanlineBuffer};
use crate::image_pipeline::openexr::metadata::header_to_metadata;
use crate::image_pipeline::window::RasterWindow;

/// Files are read leniently, matching what other OpenEXR readers accept.
const PEDANTIC: bool = false;

/// Reads the first part of scanline OpenEXR files.
pub struct ExrImageReader;

fn read_failure(path: &Path, error: exr::error::Error) -> CropError {
    match error {
        exr::error::Error::Io(io) => CropError::InputReadError(format!("{}: {}", path.display(), io)),
        other => CropError::from(other),
    }
}

fn first_header<'h>(headers: &'h [Header], path: &Path) -> Result<&'h Header> {
    if headers.len() > 1 {
        warn!(
            parts = headers.len(),
            file = %path.display(),
            "multi-part file, only the first part is cropped"
        );
    }

    headers
        .first()
        .ok_or_else(|| CropError::Format(format!("{}: file has no header", path.display())))
}

impl ImageReader for ExrImageReader {
    type Rows = ExrRowReader;

    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata> {
        let meta = MetaData::read_from_file(path, PEDANTIC).map_err(|e| read_failure(path, e))?;
        let header = first_header(&meta.headers, path)?;
        Ok(header_to_metadata(header))
    }

    fn open_rows(&self, path: &Path, rows: RangeInclusive<i32>) -> Result<ExrRowReader> {
        let file = File::open(path)
            .map_err(|e| CropError::InputReadError(format!("{}: {}", path.display(), e)))?;
        let reader = exr::block::read(BufReader::new(file), PEDANTIC).map_err(|e| read_failure(path, e))?;

        let header = first_header(reader.headers(), path)?.clone();
        let metadata = header_to_metadata(&header);
        metadata.ensure_scanline_layout()?;

        let data_window = metadata.data_window;
        let (first, last) = (*rows.start(), *rows.end());
        let chunks = reader
            .filter_chunks(PEDANTIC, |_meta, _tile, block| {
                let top = data_window.min_y + block.pixel_position.y() as i32;
                let bottom = top + block.pixel_size.height() as i32 - 1;
                block.layer == 0 && top <= last && bottom >= first
            })
            .map_err(|e| read_failure(path, e))?;

        debug!(
            file = %path.display(),
            first,
            last,
            chunks = chunks.expected_chunk_count(),
            "opened rows"
        );

        Ok(ExrRowReader {
            channels: metadata.channels.iter().map(|c| c.name.clone()).collect(),
            header,
            data_window,
            rows,
            blocks: chunks.sequential_decompressor(PEDANTIC),
            pending: VecDeque::new(),
            last_y: None,
        })
    }
}

/// Row reader over the decompressed blocks of one OpenEXR part.
pub struct ExrRowReader {
    channels: Vec<String>,
    header: Header,
    data_window: RasterWindow,
    rows: RangeInclusive<i32>,
    blocks: SequentialBlockDecompressor<FilteredChunksReader<BufReader<File>>>,
    pending: VecDeque<UncompressedBlock>,
    last_y: Option<i32>,
}

impl ExrRowReader {
    fn block_rows(&self, block: &UncompressedBlock) -> RangeInclusive<i32> {
        let top = self.data_window.min_y + block.index.pixel_position.y() as i32;
        top..=top + block.index.pixel_size.height() as i32 - 1
    }

    fn channel_index(&self, channel: &str) -> Result<usize> {
        self.channels
            .iter()
            .position(|name| name == channel)
            .ok_or_else(|| {
                CropError::IoError(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown channel {channel}"),
                ))
            })
    }

    /// Pulls blocks until one holding row `y` is pending.
    fn fetch_block(&mut self, y: i32) -> Result<usize> {
        self.pending.retain(|block| {
            let top = self.data_window.min_y + block.index.pixel_position.y() as i32;
            top + block.index.pixel_size.height() as i32 - 1 >= y
        });

        loop {
            if let Some(index) = self.pending.iter().position(|block| self.block_rows(block).contains(&y)) {
                return Ok(index);
            }

            let block = self
                .blocks
                .next()
                .ok_or_else(|| CropError::Format(format!("no scanline block holds row {y}")))??;

            if *self.block_rows(&block).end() >= y {
                self.pending.push_back(block);
            }
        }
    }
}

fn decode_line(
    block: &UncompressedBlock,
    header: &Header,
    data_window: RasterWindow,
    channel_index: usize,
    y: i32,
) -> Result<ScanlineBuffer> {
    let local_y = (y - data_window.min_y) as usize;
    let line = block
        .lines(&header.channels)
        .find(|line| line.location.channel == channel_index && line.location.position.y() == local_y)
        .ok_or_else(|| CropError::Format(format!("block has no line for row {y}")))?;

    let mut samples = Vec::with_capacity(line.location.sample_count);
    match header.channels.list[channel_index].sample_type {
        SampleType::F16 => {
            for sample in line.read_samples::<f16>() {
                samples.push(sample?);
            }
        }
        SampleType::F32 => {
            for sample in line.read_samples::<f32>() {
                samples.push(f16::from_f32(sample?));
            }
        }
        // saturates to infinity above the half range
        SampleType::U32 => {
            for sample in line.read_samples::<u32>() {
                samples.push(f16::from_f32(sample? as f32));
            }
        }
    }

    if samples.len() != data_window.width() {
        return Err(CropError::Format(format!(
            "row {y} has {} samples, data window is {} wide",
            samples.len(),
            data_window.width()
        )));
    }

    Ok(ScanlineBuffer::new(data_window.min_x, samples))
}

impl RowReader for ExrRowReader {
    fn read_row(&mut self, channel: &str, y: i32) -> Result<ScanlineBuffer> {
        let window = self.data_window;
        if !self.rows.contains(&y) || !(window.min_y..=window.max_y).contains(&y) {
            return Err(CropError::IoError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("row {y} was not opened for reading"),
            )));
        }
        if self.last_y.is_some_and(|last| y < last) {
            return Err(CropError::Protocol(format!("row {y} requested after a later row")));
        }

        let channel_index = self.channel_index(channel)?;
        let block_index = self.fetch_block(y)?;
        self.last_y = Some(y);

        decode_line(&self.pending[block_index], &self.header, window, channel_index, y)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::image_pipeline::container::types::{ChannelSpec, PixelType};
    use crate::image_pipeline::container::writer::{ImageWriter, RowWriter};
    use crate::image_pipeline::openexr::ExrImageWriter;

    /// Two channels over (-2, 5)-(1, 8), sample value `10 * y + x` in "B".
    fn write_ramp(path: &Path) -> ImageMetadata {
        let window = RasterWindow::new(-2, 5, 1, 8);
        let metadata = ImageMetadata::new(
            window,
            vec![
                ChannelSpec::new("B", PixelType::Half),
                ChannelSpec::new("A", PixelType::Half),
            ],
        );

        ExrImageWriter
            .open_for_write(path, &metadata, &mut |output: &mut dyn RowWriter| {
                for y in window.min_y..=window.max_y {
                    let ramp = (window.min_x..=window.max_x)
                        .map(|x| f16::from_f32((10 * y + x) as f32))
                        .collect();
                    output.write_row(&[
                        ScanlineBuffer::new(window.min_x, ramp),
                        ScanlineBuffer::zeroed(window.min_x, window.width()),
                    ])?;
                }
                Ok(())
            })
            .unwrap();
        metadata
    }

    #[test]
    fn test_reads_rows_by_absolute_coordinates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.exr");
        let written = write_ramp(&path);

        let (metadata, mut rows) = ExrImageReader.open_for_read(&path).unwrap();
        assert_eq!(metadata.data_window, written.data_window);
        assert_eq!(metadata.channels.len(), 2);

        let row = rows.read_row("B", 6).unwrap();
        assert_eq!(row.origin_x(), -2);
        assert_eq!(row.sample_at(-2), Some(f16::from_f32(58.0)));
        assert_eq!(row.sample_at(1), Some(f16::from_f32(61.0)));
        assert!(rows.read_row("A", 6).unwrap().samples().iter().all(|s| *s == f16::ZERO));
    }

    #[test]
    fn test_rows_must_not_go_backwards() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.exr");
        write_ramp(&path);

        let mut rows = ExrImageReader.open_rows(&path, 5..=8).unwrap();
        rows.read_row("B", 7).unwrap();
        assert!(matches!(rows.read_row("B", 6), Err(CropError::Protocol(_))));
    }

    #[test]
    fn test_rejects_rows_outside_opened_range_and_unknown_channels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.exr");
        write_ramp(&path);

        let mut rows = ExrImageReader.open_rows(&path, 6..=7).unwrap();
        assert!(matches!(rows.read_row("B", 5), Err(CropError::IoError(_))));
        assert!(matches!(rows.read_row("G", 6), Err(CropError::IoError(_))));
        assert_eq!(rows.read_row("B", 7).unwrap().sample_at(0), Some(f16::from_f32(70.0)));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let dir = tempdir().unwrap();
        let result = ExrImageReader.read_metadata(&dir.path().join("missing.exr"));
        assert!(matches!(result, Err(CropError::InputReadError(_))));
    }
}
