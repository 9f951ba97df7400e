//! Conversion between OpenEXR headers and [`ImageMetadata`].

use exr::compression::Compression as ExrCompression;
use exr::math::Vec2;
use exr::meta::BlockDescription;
use exr::meta::attribute::{
    ChannelDescription, IntegerBounds, LineOrder as ExrLineOrder, SampleType,
};
use exr::meta::header::Header;
use smallvec::SmallVec;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::types::{
    ChannelSpec, Compression, ImageMetadata, LineOrder, PixelType, StorageLayout,
};
use crate::image_pipeline::openexr::attributes::{apply_attributes, collect_attributes, text};
use crate::image_pipeline::window::RasterWindow;

fn window_from_bounds(bounds: &IntegerBounds) -> RasterWindow {
    RasterWindow::from_origin_and_size(
        bounds.position.x(),
        bounds.position.y(),
        bounds.size.width(),
        bounds.size.height(),
    )
}

fn bounds_from_window(window: &RasterWindow) -> IntegerBounds {
    IntegerBounds::new(
        Vec2(window.min_x, window.min_y),
        Vec2(window.width(), window.height()),
    )
}

fn compression_from_exr(compression: ExrCompression) -> Compression {
    match compression {
        ExrCompression::Uncompressed => Compression::Uncompressed,
        ExrCompression::RLE => Compression::Rle,
        ExrCompression::ZIP1 => Compression::ZipScanline,
        ExrCompression::ZIP16 => Compression::Zip,
        ExrCompression::PIZ => Compression::Piz,
        ExrCompression::PXR24 => Compression::Pxr24,
        ExrCompression::B44 => Compression::B44,
        ExrCompression::B44A => Compression::B44a,
        other => Compression::Other(format!("{other:?}")),
    }
}

/// Only schemes storing one scanline per block can be written row by row.
fn compression_to_exr(compression: &Compression) -> Result<ExrCompression> {
    match compression {
        Compression::Uncompressed => Ok(ExrCompression::Uncompressed),
        Compression::Rle => Ok(ExrCompression::RLE),
        Compression::ZipScanline => Ok(ExrCompression::ZIP1),
        other => Err(CropError::UnsupportedLayout(format!(
            "{other:?} compression stores several scanlines per block"
        ))),
    }
}

fn pixel_type_from_exr(sample_type: SampleType) -> PixelType {
    match sample_type {
        SampleType::F16 => PixelType::Half,
        SampleType::F32 => PixelType::Float,
        SampleType::U32 => PixelType::Uint,
    }
}

fn pixel_type_to_exr(pixel_type: PixelType) -> SampleType {
    match pixel_type {
        PixelType::Half => SampleType::F16,
        PixelType::Float => SampleType::F32,
        PixelType::Uint => SampleType::U32,
    }
}

pub fn header_to_metadata(header: &Header) -> ImageMetadata {
    let position = header.own_attributes.layer_position;
    let data_window = RasterWindow::from_origin_and_size(
        position.x(),
        position.y(),
        header.layer_size.width(),
        header.layer_size.height(),
    );

    let channels = header
        .channels
        .list
        .iter()
        .map(|channel| ChannelSpec {
            name: channel.name.to_string(),
            pixel_type: pixel_type_from_exr(channel.sample_type),
            linear: channel.quantize_linearly,
            sampling: (channel.sampling.x(), channel.sampling.y()),
        })
        .collect();

    let layout = if header.deep {
        StorageLayout::Deep
    } else {
        match header.blocks {
            BlockDescription::ScanLines => StorageLayout::ScanLines,
            BlockDescription::Tiles(_) => StorageLayout::Tiled,
        }
    };

    let line_order = match header.line_order {
        ExrLineOrder::Increasing => LineOrder::Increasing,
        ExrLineOrder::Decreasing => LineOrder::Decreasing,
        ExrLineOrder::Unspecified => LineOrder::Unspecified,
    };

    ImageMetadata {
        display_window: window_from_bounds(&header.shared_attributes.display_window),
        data_window,
        channels,
        layout,
        line_order,
        compression: compression_from_exr(header.compression),
        attributes: collect_attributes(header),
    }
}

/// Channels in the order the header stores them, alphabetically by name,
/// paired with their index in `metadata.channels`.
pub(crate) fn header_channel_order(metadata: &ImageMetadata) -> Vec<usize> {
    let mut order: Vec<usize> = (0..metadata.channels.len()).collect();
    order.sort_by(|&a, &b| metadata.channels[a].name.as_bytes().cmp(metadata.channels[b].name.as_bytes()));
    order
}

/// Single-part scanline header for `metadata`.
pub fn metadata_to_header(metadata: &ImageMetadata) -> Result<Header> {
    if metadata.layout != StorageLayout::ScanLines {
        return Err(CropError::UnsupportedLayout(format!(
            "cannot write {:?} images",
            metadata.layout
        )));
    }

    let compression = compression_to_exr(&metadata.compression)?;
    let line_order = match metadata.line_order {
        LineOrder::Increasing => ExrLineOrder::Increasing,
        LineOrder::Decreasing => ExrLineOrder::Decreasing,
        LineOrder::Unspecified => ExrLineOrder::Unspecified,
    };

    let channels = header_channel_order(metadata)
        .into_iter()
        .map(|index| {
            let channel = &metadata.channels[index];
            Ok(ChannelDescription {
                name: text(&channel.name)?,
                sample_type: pixel_type_to_exr(channel.pixel_type),
                quantize_linearly: channel.linear,
                sampling: Vec2(channel.sampling.0, channel.sampling.1),
            })
        })
        .collect::<Result<SmallVec<[ChannelDescription; 5]>>>()?;

    let window = metadata.data_window;
    let mut header = Header::new(text("")?, Vec2(window.width(), window.height()), channels);

    header.own_attributes.layer_name = None;
    header.own_attributes.layer_position = Vec2(window.min_x, window.min_y);
    header.shared_attributes.display_window = bounds_from_window(&metadata.display_window);
    apply_attributes(&mut header, &metadata.attributes)?;

    Ok(header.with_encoding(compression, BlockDescription::ScanLines, line_order))
}
