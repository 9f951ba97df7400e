use std::path::Path;

use tracing::{info, info_span, instrument, warn};

use crate::image_pipeline::bounds::BoundingBoxReducer;
use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::{ImageMetadata, ImageReader, ImageWriter, RowWriter};
use crate::image_pipeline::conversions::timing::{PipelineTimings, Timer};
use crate::image_pipeline::crop::{CropConfig, CropStreamer, CroppedHeaderBuilder, EmptyImagePolicy};
use crate::image_pipeline::openexr::{ExrImageReader, ExrImageWriter};
use crate::image_pipeline::window::RasterWindow;

/// Outcome of one successful crop.
#[derive(Debug, Clone)]
pub struct CropReport {
    pub display_window: RasterWindow,
    pub data_window: RasterWindow,
    pub bounding_window: RasterWindow,
    pub rows_written: usize,
    pub timings: PipelineTimings,
}

pub struct AutocropPipeline<R: ImageReader, W: ImageWriter> {
    reader: R,
    writer: W,
    config: CropConfig,
}

impl AutocropPipeline<ExrImageReader, ExrImageWriter> {
    pub fn new(config: CropConfig) -> Self {
        Self {
            reader: ExrImageReader,
            writer: ExrImageWriter,
            config,
        }
    }
}

impl<R: ImageReader, W: ImageWriter> AutocropPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: CropConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn resolve_empty(&self, metadata: &ImageMetadata, scanned: Result<RasterWindow>) -> Result<RasterWindow> {
        match scanned {
            Err(CropError::EmptyImage) if self.config.empty_image == EmptyImagePolicy::SinglePixel => {
                let window = metadata.data_window;
                let pixel = RasterWindow::new(window.min_x, window.min_y, window.min_x, window.min_y);
                warn!(bounding_window = %pixel, "image has no non-zero sample, keeping a single pixel");
                Ok(pixel)
            }
            other => other,
        }
    }

    /// Writes the smallest window of `source` holding every non-zero sample to `target`.
    #[instrument(skip(self, source, target))]
    pub fn crop_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, source: P, target: Q) -> Result<CropReport> {
        let source = source.as_ref();
        let target = target.as_ref();
        let mut timings = PipelineTimings::new();

        info!(source = %source.display(), target = %target.display(), "Cropping file");

        let timer = Timer::start("read_metadata");
        let metadata = {
            let _span = info_span!("read_metadata").entered();
            let metadata = self.reader.read_metadata(source)?;
            metadata.ensure_scanline_layout()?;
            metadata
        };
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        info!(display_window = %metadata.display_window, "Display window");
        info!(data_window = %metadata.data_window, "Data window");

        let timer = Timer::start("bounds_pass");
        let scanned = {
            let _span = info_span!("bounds_pass", channels = metadata.channels.len()).entered();
            let window = metadata.data_window;
            let mut rows = self.reader.open_rows(source, window.min_y..=window.max_y)?;
            BoundingBoxReducer::new(&metadata).reduce(&mut rows)
        };
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        let bounding_window = self.resolve_empty(&metadata, scanned)?;
        info!(bounding_window = %bounding_window, "Bounding window");

        let cropped = CroppedHeaderBuilder::new(self.config.compression).build(&metadata, bounding_window)?;
        let streamer = CropStreamer::new(&metadata, bounding_window)?;

        let timer = Timer::start("copy_pass");
        let mut rows_written = 0;
        {
            let _span = info_span!("copy_pass", rows = bounding_window.height()).entered();
            let mut rows = self
                .reader
                .open_rows(source, bounding_window.min_y..=bounding_window.max_y)?;
            self.writer.open_for_write(target, &cropped, &mut |output: &mut dyn RowWriter| {
                rows_written = streamer.stream(&mut rows, output)?;
                Ok(())
            })?;
        }
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        info!(
            width = bounding_window.width(),
            height = bounding_window.height(),
            ms = timings.total_duration().as_secs_f64() * 1000.0,
            "Crop complete"
        );
        timings.log_summary();

        Ok(CropReport {
            display_window: metadata.display_window,
            data_window: metadata.data_window,
            bounding_window,
            rows_written,
            timings,
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CropConfig) {
        self.config = config;
    }
}
