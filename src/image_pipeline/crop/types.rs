//! Crop configuration types

use crate::image_pipeline::container::types::Compression;

/// Compression written to the cropped image.
///
/// All of these store a single scanline per block, which is what lets the
/// copy pass emit the output one row at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCompression {
    /// No compression (fastest, largest file)
    None,
    /// Run-length encoding (cheap, only helps flat areas)
    Rle,
    /// Zip deflate per scanline (good size/speed balance for compositing, default)
    ZipScanline,
}

impl OutputCompression {
    pub fn compression(self) -> Compression {
        match self {
            OutputCompression::None => Compression::Uncompressed,
            OutputCompression::Rle => Compression::Rle,
            OutputCompression::ZipScanline => Compression::ZipScanline,
        }
    }
}

/// What to do when no channel holds a non-zero sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyImagePolicy {
    /// Abort with `CropError::EmptyImage` (default)
    Fail,
    /// Keep only the data window's top-left pixel and log a warning
    SinglePixel,
}

/// Configuration for cropping
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Compression method for the output
    pub compression: OutputCompression,
    /// Behaviour for images without any non-zero sample
    pub empty_image: EmptyImagePolicy,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            compression: OutputCompression::ZipScanline,
            empty_image: EmptyImagePolicy::Fail,
        }
    }
}

impl CropConfig {
    pub fn builder() -> CropConfigBuilder {
        CropConfigBuilder::default()
    }
}

/// Builder for CropConfig
#[derive(Default)]
pub struct CropConfigBuilder {
    compression: Option<OutputCompression>,
    empty_image: Option<EmptyImagePolicy>,
}

impl CropConfigBuilder {
    pub fn compression(mut self, compression: OutputCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn empty_image(mut self, policy: EmptyImagePolicy) -> Self {
        self.empty_image = Some(policy);
        self
    }

    pub fn build(self) -> CropConfig {
        let default = CropConfig::default();
        CropConfig {
            compression: self.compression.unwrap_or(default.compression),
            empty_image: self.empty_image.unwrap_or(default.empty_image),
        }
    }
}
