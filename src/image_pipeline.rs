//! Image processing pipeline module
//!
//! This module provides a structured approach to cropping OpenEXR images to
//! their content, with separate modules for window arithmetic, container
//! access, bounds detection, cropping, and orchestration.

pub mod bounds;
pub mod common;
pub mod container;
pub mod conversions;
pub mod crop;
pub mod openexr;
pub mod window;

pub use common::{
    CropError,
    Result,
};

pub use window::RasterWindow;

pub use container::{
    ImageMetadata,
    ImageReader,
    ImageWriter,
    RowReader,
    RowWriter,
    ScanlineBuffer,
};

pub use bounds::{
    BoundingAccumulator,
    BoundingBoxReducer,
    scan_scanline,
};

pub use crop::{
    CropConfig,
    CropConfigBuilder,
    CropStreamer,
    CroppedHeaderBuilder,
    EmptyImagePolicy,
    OutputCompression,
};

pub use openexr::{
    ExrImageReader,
    ExrImageWriter,
};

pub use conversions::{
    AutocropPipeline,
    CropReport,
};
