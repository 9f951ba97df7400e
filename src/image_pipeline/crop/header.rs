use tracing::debug;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::types::{
    AttributeMap, ChannelSpec, Compression, ImageMetadata, LineOrder, PixelType, StorageLayout,
};
use crate::image_pipeline::crop::types::OutputCompression;
use crate::image_pipeline::window::RasterWindow;

/// How an attribute of the source image reaches the cropped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePolicy {
    /// Copied unchanged.
    Copy,
    /// Rebuilt from the crop result, never copied.
    Derived,
    /// Copied in spirit but overwritten with the configured value.
    Replaced,
    /// Recomputed by the container when the file is written.
    ContainerManaged,
}

const ATTRIBUTE_POLICIES: &[(&str, AttributePolicy)] = &[
    ("channels", AttributePolicy::Derived),
    ("dataWindow", AttributePolicy::Derived),
    ("displayWindow", AttributePolicy::Derived),
    ("lineOrder", AttributePolicy::Derived),
    ("tiles", AttributePolicy::Derived),
    ("compression", AttributePolicy::Replaced),
    ("chunkCount", AttributePolicy::ContainerManaged),
    ("type", AttributePolicy::ContainerManaged),
    ("version", AttributePolicy::ContainerManaged),
    ("maxSamplesPerPixel", AttributePolicy::ContainerManaged),
];

/// Policy for the attribute called `name`. Names are case-sensitive.
pub fn attribute_policy(name: &str) -> AttributePolicy {
    ATTRIBUTE_POLICIES
        .iter()
        .find(|(policy_name, _)| *policy_name == name)
        .map(|(_, policy)| *policy)
        .unwrap_or(AttributePolicy::Copy)
}

/// Builds the metadata of the cropped image from the source metadata.
pub struct CroppedHeaderBuilder {
    compression: Compression,
}

impl CroppedHeaderBuilder {
    pub fn new(compression: OutputCompression) -> Self {
        Self {
            compression: compression.compression(),
        }
    }

    /// Metadata for `bounds` cropped out of `source`.
    ///
    /// The display window stays as it is, channels become half floats and
    /// every attribute whose policy is [`AttributePolicy::Copy`] is carried over.
    pub fn build(&self, source: &ImageMetadata, bounds: RasterWindow) -> Result<ImageMetadata> {
        source.ensure_scanline_layout()?;

        if !source.data_window.contains(&bounds) {
            return Err(CropError::InvalidBounds {
                bounds,
                data_window: source.data_window,
            });
        }

        let channels = source
            .channels
            .iter()
            .map(|channel| ChannelSpec {
                pixel_type: PixelType::Half,
                ..channel.clone()
            })
            .collect();

        let attributes: AttributeMap = source
            .attributes
            .iter()
            .filter(|(name, _)| attribute_policy(name) == AttributePolicy::Copy)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        debug!(
            copied = attributes.len(),
            dropped = source.attributes.len() - attributes.len(),
            "attributes carried over"
        );

        Ok(ImageMetadata {
            display_window: source.display_window,
            data_window: bounds,
            channels,
            layout: StorageLayout::ScanLines,
            line_order: LineOrder::Increasing,
            compression: self.compression.clone(),
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::container::types::AttributeValue;

    fn source() -> ImageMetadata {
        let mut metadata = ImageMetadata::new(
            RasterWindow::new(0, 0, 9, 9),
            vec![
                ChannelSpec::new("A", PixelType::Float),
                ChannelSpec {
                    linear: true,
                    ..ChannelSpec::new("Z", PixelType::Uint)
                },
            ],
        );
        metadata.display_window = RasterWindow::new(-5, -5, 14, 14);
        metadata.line_order = LineOrder::Decreasing;
        metadata.compression = Compression::Piz;
        metadata.attributes.insert("pixelAspectRatio", AttributeValue::F32(2.0));
        metadata.attributes.insert("focus", AttributeValue::F32(3.5));
        metadata.attributes.insert("frameNumber", AttributeValue::I32(1001));
        metadata.attributes.insert("lineOrder", AttributeValue::I32(1));
        metadata.attributes.insert("tiles", AttributeValue::I32(64));
        metadata.attributes.insert("compression", AttributeValue::I32(4));
        metadata.attributes.insert("chunkCount", AttributeValue::I32(10));
        metadata
    }

    #[test]
    fn test_policy_table() {
        for name in ["channels", "dataWindow", "displayWindow", "lineOrder", "tiles"] {
            assert_eq!(attribute_policy(name), AttributePolicy::Derived, "{name}");
        }
        assert_eq!(attribute_policy("compression"), AttributePolicy::Replaced);
        assert_eq!(attribute_policy("chunkCount"), AttributePolicy::ContainerManaged);
        assert_eq!(attribute_policy("comments"), AttributePolicy::Copy);
        assert_eq!(attribute_policy("Channels"), AttributePolicy::Copy);
    }

    #[test]
    fn test_windows() {
        let bounds = RasterWindow::new(2, 3, 7, 5);
        let cropped = CroppedHeaderBuilder::new(OutputCompression::ZipScanline)
            .build(&source(), bounds)
            .unwrap();

        assert_eq!(cropped.data_window, bounds);
        assert_eq!(cropped.display_window, RasterWindow::new(-5, -5, 14, 14));
        assert_eq!(cropped.data_window.width(), 6);
        assert_eq!(cropped.data_window.height(), 3);
    }

    #[test]
    fn test_channels_become_half() {
        let cropped = CroppedHeaderBuilder::new(OutputCompression::ZipScanline)
            .build(&source(), RasterWindow::new(0, 0, 1, 1))
            .unwrap();

        let names: Vec<&str> = cropped.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Z"]);
        assert!(cropped.channels.iter().all(|c| c.pixel_type == PixelType::Half));
        assert!(cropped.channels[1].linear);
    }

    #[test]
    fn test_encoding_is_rederived() {
        let cropped = CroppedHeaderBuilder::new(OutputCompression::Rle)
            .build(&source(), RasterWindow::new(0, 0, 1, 1))
            .unwrap();

        assert_eq!(cropped.compression, Compression::Rle);
        assert_eq!(cropped.line_order, LineOrder::Increasing);
        assert_eq!(cropped.layout, StorageLayout::ScanLines);
    }

    #[test]
    fn test_attributes_follow_policy() {
        let source = source();
        let cropped = CroppedHeaderBuilder::new(OutputCompression::ZipScanline)
            .build(&source, RasterWindow::new(0, 0, 1, 1))
            .unwrap();

        for name in ["pixelAspectRatio", "focus", "frameNumber"] {
            assert_eq!(cropped.attributes.get(name), source.attributes.get(name), "{name}");
        }
        for name in ["lineOrder", "tiles", "compression", "chunkCount"] {
            assert!(!cropped.attributes.contains(name), "{name}");
        }
        assert_eq!(cropped.attributes.len(), 3);
    }

    #[test]
    fn test_tiled_source_is_rejected() {
        let mut tiled = source();
        tiled.layout = StorageLayout::Tiled;
        let result = CroppedHeaderBuilder::new(OutputCompression::ZipScanline)
            .build(&tiled, RasterWindow::new(0, 0, 1, 1));
        assert!(matches!(result, Err(CropError::UnsupportedLayout(_))));
    }

    #[test]
    fn test_bounds_outside_data_window_are_rejected() {
        let builder = CroppedHeaderBuilder::new(OutputCompression::ZipScanline);
        assert!(matches!(
            builder.build(&source(), RasterWindow::new(5, 5, 10, 6)),
            Err(CropError::InvalidBounds { .. })
        ));
        assert!(matches!(
            builder.build(&source(), RasterWindow::empty()),
            Err(CropError::InvalidBounds { .. })
        ));
    }
}
