use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use exr::block::writer::{ChunkWriter, ChunksWriter};
use exr::block::{BlockIndex, UncompressedBlock};
use exr::math::Vec2;
use exr::meta::header::Header;
use smallvec::smallvec;
use tracing::debug;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::types::{ImageMetadata, PixelType, ScanlineBuffer};
use crate::image_pipeline::container::writer::{validate_row, ImageWriter, RowWriter};
use crate::image_pipeline::openexr::metadata::{header_channel_order, metadata_to_header};

/// Writes single-part scanline OpenEXR files, one chunk per row.
pub struct ExrImageWriter;

struct ExrRowWriter<'w> {
    chunks: &'w mut ChunkWriter<BufWriter<File>>,
    headers: &'w [Header],
    metadata: &'w ImageMetadata,
    channel_order: Vec<usize>,
    next_row: usize,
}

impl ExrRowWriter<'_> {
    /// Block bytes for one line: each channel in header order, native-endian halves.
    fn encode(&self, row: &[ScanlineBuffer]) -> Vec<u8> {
        let width = self.metadata.data_window.width();
        let mut data = Vec::with_capacity(width * row.len() * 2);

        for &index in &self.channel_order {
            for sample in row[index].samples() {
                data.extend_from_slice(&sample.to_ne_bytes());
            }
        }

        data
    }
}

impl RowWriter for ExrRowWriter<'_> {
    fn write_row(&mut self, row: &[ScanlineBuffer]) -> Result<()> {
        validate_row(row, self.metadata, self.next_row)?;

        let block = UncompressedBlock {
            index: BlockIndex {
                layer: 0,
                pixel_position: Vec2(0, self.next_row),
                pixel_size: Vec2(self.metadata.data_window.width(), 1),
                level: Vec2(0, 0),
            },
            data: self.encode(row),
        };

        let chunk = block.compress_to_chunk(self.headers)?;
        self.chunks.write_chunk(self.next_row, chunk)?;
        self.next_row += 1;
        Ok(())
    }
}

impl ImageWriter for ExrImageWriter {
    fn open_for_write(
        &self,
        path: &Path,
        metadata: &ImageMetadata,
        write_rows: &mut dyn FnMut(&mut dyn RowWriter) -> Result<()>,
    ) -> Result<()> {
        if let Some(channel) = metadata.channels.iter().find(|c| c.pixel_type != PixelType::Half) {
            return Err(CropError::UnsupportedLayout(format!(
                "channel {} is {:?}, rows are written as half floats",
                channel.name, channel.pixel_type
            )));
        }

        let header = metadata_to_header(metadata)?;
        let height = metadata.data_window.height();

        let file = File::create(path)
            .map_err(|e| CropError::OutputWriteError(format!("{}: {}", path.display(), e)))?;

        // exr errors cannot carry a CropError, so the callback's result is kept here
        let mut outcome: Result<()> = Ok(());

        let written = exr::block::write(BufWriter::new(file), smallvec![header], true, |meta, chunks| {
            let mut output = ExrRowWriter {
                chunks,
                headers: &meta.headers,
                metadata,
                channel_order: header_channel_order(metadata),
                next_row: 0,
            };

            outcome = write_rows(&mut output).and_then(|()| {
                if output.next_row == height {
                    Ok(())
                } else {
                    Err(CropError::Protocol(format!(
                        "{} of {} rows written",
                        output.next_row, height
                    )))
                }
            });

            if outcome.is_ok() {
                Ok(())
            } else {
                Err(exr::error::Error::Aborted)
            }
        });

        outcome?;
        written.map_err(|e| match e {
            exr::error::Error::Io(io) => CropError::OutputWriteError(format!("{}: {}", path.display(), io)),
            other => CropError::from(other),
        })?;

        debug!(file = %path.display(), rows = height, "image written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use half::f16;
    use tempfile::tempdir;

    use super::*;
    use crate::image_pipeline::container::types::{ChannelSpec, Compression, PixelType};
    use crate::image_pipeline::window::RasterWindow;

    fn metadata() -> ImageMetadata {
        let mut metadata = ImageMetadata::new(
            RasterWindow::new(1, 1, 4, 2),
            vec![ChannelSpec::new("Y", PixelType::Half)],
        );
        metadata.compression = Compression::Rle;
        metadata
    }

    fn row(value: f32) -> Vec<ScanlineBuffer> {
        vec![ScanlineBuffer::new(1, vec![f16::from_f32(value); 4])]
    }

    #[test]
    fn test_too_few_rows_is_protocol_error() {
        let dir = tempdir().unwrap();
        let result = ExrImageWriter.open_for_write(&dir.path().join("short.exr"), &metadata(), &mut |output: &mut dyn RowWriter| {
            output.write_row(&row(1.0))
        });
        assert!(matches!(result, Err(CropError::Protocol(_))));
    }

    #[test]
    fn test_too_many_rows_is_protocol_error() {
        let dir = tempdir().unwrap();
        let result = ExrImageWriter.open_for_write(&dir.path().join("long.exr"), &metadata(), &mut |output: &mut dyn RowWriter| {
            for value in [1.0, 2.0, 3.0] {
                output.write_row(&row(value))?;
            }
            Ok(())
        });
        assert!(matches!(result, Err(CropError::Protocol(_))));
    }

    #[test]
    fn test_misplaced_row_is_rejected() {
        let dir = tempdir().unwrap();
        let result = ExrImageWriter.open_for_write(&dir.path().join("shifted.exr"), &metadata(), &mut |output: &mut dyn RowWriter| {
            output.write_row(&[ScanlineBuffer::new(0, vec![f16::ONE; 4])])
        });
        assert!(matches!(result, Err(CropError::Protocol(_))));
    }

    #[test]
    fn test_unwritable_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing").join("out.exr");
        let result = ExrImageWriter.open_for_write(&target, &metadata(), &mut |_: &mut dyn RowWriter| Ok(()));
        assert!(matches!(result, Err(CropError::OutputWriteError(_))));
    }

    #[test]
    fn test_non_half_channels_are_rejected_before_creating_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("float.exr");
        let mut metadata = metadata();
        metadata.channels.push(ChannelSpec::new("Z", PixelType::Float));

        let result = ExrImageWriter.open_for_write(&target, &metadata, &mut |_: &mut dyn RowWriter| Ok(()));

        assert!(matches!(result, Err(CropError::UnsupportedLayout(_))));
        assert!(!target.exists());
    }

    #[test]
    fn test_samples_decode_with_independent_reader() {
        use exr::image::read::read_all_flat_layers_from_file;
        use exr::image::FlatSamples;

        let dir = tempdir().unwrap();
        let target = dir.path().join("values.exr");
        let values = [0.5, -1.25, 1024.0, 3.0e-5];

        ExrImageWriter
            .open_for_write(&target, &metadata(), &mut |output: &mut dyn RowWriter| {
                for _ in 0..2 {
                    let samples = values.iter().map(|v| f16::from_f32(*v)).collect();
                    output.write_row(&[ScanlineBuffer::new(1, samples)])?;
                }
                Ok(())
            })
            .unwrap();

        let image = read_all_flat_layers_from_file(&target).unwrap();
        let channel = &image.layer_data[0].channel_data.list[0];
        match &channel.sample_data {
            FlatSamples::F16(samples) => {
                let expected: Vec<f16> = values.iter().chain(values.iter()).map(|v| f16::from_f32(*v)).collect();
                assert_eq!(samples, &expected);
            }
            other => panic!("expected half samples, got {other:?}"),
        }
    }
}
