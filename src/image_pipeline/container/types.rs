//! Container-neutral image description types

use std::collections::BTreeMap;

use half::f16;

pub use exr::meta::attribute::AttributeValue;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::window::RasterWindow;

/// Sample type a channel is stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    /// 16-bit float
    Half,
    /// 32-bit float
    Float,
    /// 32-bit unsigned integer
    Uint,
}

/// One named plane of samples sharing the data window geometry
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Channel name, case-sensitive
    pub name: String,
    pub pixel_type: PixelType,
    /// Hint that the channel holds perceptually linear values
    pub linear: bool,
    /// Horizontal and vertical subsampling factors
    pub sampling: (usize, usize),
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>, pixel_type: PixelType) -> Self {
        Self {
            name: name.into(),
            pixel_type,
            linear: false,
            sampling: (1, 1),
        }
    }

    pub fn is_subsampled(&self) -> bool {
        self.sampling != (1, 1)
    }
}

/// How pixel blocks are laid out in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLayout {
    ScanLines,
    /// Tiled storage, possibly with mip or rip levels
    Tiled,
    /// Deep samples (variable sample count per pixel)
    Deep,
}

/// Order in which rows are stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrder {
    Increasing,
    Decreasing,
    Unspecified,
}

/// Compression scheme of a container
#[derive(Debug, Clone, PartialEq)]
pub enum Compression {
    Uncompressed,
    Rle,
    /// Zip deflate, one scanline per block
    ZipScanline,
    /// Zip deflate, sixteen scanlines per block
    Zip,
    Piz,
    Pxr24,
    B44,
    B44a,
    /// A scheme this crate can read past but never writes
    Other(String),
}

/// Attribute name to opaque typed value.
///
/// Iteration order is by name, which keeps diagnostics and comparisons stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Everything about an image except its pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub display_window: RasterWindow,
    pub data_window: RasterWindow,
    pub channels: Vec<ChannelSpec>,
    pub layout: StorageLayout,
    pub line_order: LineOrder,
    pub compression: Compression,
    /// Every attribute not represented by one of the fields above
    pub attributes: AttributeMap,
}

impl ImageMetadata {
    /// Scanline metadata with no extra attributes, display window equal to the data window.
    pub fn new(data_window: RasterWindow, channels: Vec<ChannelSpec>) -> Self {
        Self {
            display_window: data_window,
            data_window,
            channels,
            layout: StorageLayout::ScanLines,
            line_order: LineOrder::Increasing,
            compression: Compression::Uncompressed,
            attributes: AttributeMap::new(),
        }
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel.name == name)
    }

    /// Fails unless the pixels can be streamed one full scanline at a time.
    pub fn ensure_scanline_layout(&self) -> Result<()> {
        match self.layout {
            StorageLayout::ScanLines => {}
            StorageLayout::Tiled => {
                return Err(CropError::UnsupportedLayout(
                    "tiled images cannot be cropped by scanline windowing".to_string(),
                ));
            }
            StorageLayout::Deep => {
                return Err(CropError::UnsupportedLayout(
                    "deep images are not supported".to_string(),
                ));
            }
        }

        if let Some(channel) = self.channels.iter().find(|channel| channel.is_subsampled()) {
            return Err(CropError::UnsupportedLayout(format!(
                "channel {} is subsampled {}x{}",
                channel.name, channel.sampling.0, channel.sampling.1
            )));
        }

        if self.data_window.is_empty() {
            return Err(CropError::Format(format!(
                "data window {} is empty",
                self.data_window
            )));
        }

        Ok(())
    }
}

/// One row of one channel, addressed by absolute x.
///
/// The sample for pixel `x` lives at index `x - origin_x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanlineBuffer {
    origin_x: i32,
    samples: Vec<f16>,
}

impl ScanlineBuffer {
    pub fn new(origin_x: i32, samples: Vec<f16>) -> Self {
        Self { origin_x, samples }
    }

    pub fn zeroed(origin_x: i32, width: usize) -> Self {
        Self::new(origin_x, vec![f16::ZERO; width])
    }

    pub fn origin_x(&self) -> i32 {
        self.origin_x
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f16] {
        &self.samples
    }

    fn index_of(&self, x: i32) -> Option<usize> {
        let offset = i64::from(x) - i64::from(self.origin_x);
        usize::try_from(offset)
            .ok()
            .filter(|&index| index < self.samples.len())
    }

    /// Sample at absolute `x`, or `None` outside the buffer.
    pub fn sample_at(&self, x: i32) -> Option<f16> {
        self.index_of(x).map(|index| self.samples[index])
    }

    /// Copies the samples of `min_x ..= max_x` into a buffer whose origin is `min_x`.
    /// Returns `None` unless the whole range lies inside this buffer.
    pub fn window(&self, min_x: i32, max_x: i32) -> Option<ScanlineBuffer> {
        let start = self.index_of(min_x)?;
        let end = self.index_of(max_x)?;
        if end < start {
            return None;
        }

        Some(Self::new(min_x, self.samples[start..=end].to_vec()))
    }
}
