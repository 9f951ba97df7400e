//! Name-keyed view of the typed OpenEXR header attributes.
//!
//! The `exr` crate parses standard attributes into typed header fields and
//! keeps everything else in `other` maps. These functions translate between
//! that representation and a flat [`AttributeMap`] using the standard
//! OpenEXR attribute names.

use exr::meta::attribute::{AttributeValue, Text};
use exr::meta::header::Header;
use tracing::debug;

use crate::image_pipeline::common::error::{CropError, Result};
use crate::image_pipeline::container::types::AttributeMap;

/// Attributes the header stores structurally; never taken from the map.
const STRUCTURAL_NAMES: &[&str] = &[
    "channels",
    "compression",
    "dataWindow",
    "displayWindow",
    "lineOrder",
    "tiles",
    "chunkCount",
    "type",
    "version",
    "maxSamplesPerPixel",
];

pub(crate) fn text(value: &str) -> Result<Text> {
    Text::new_or_none(value)
        .ok_or_else(|| CropError::Format(format!("{value:?} cannot be stored as OpenEXR text")))
}

fn insert_optional(attributes: &mut AttributeMap, name: &str, value: Option<AttributeValue>) {
    if let Some(value) = value {
        attributes.insert(name, value);
    }
}

/// Every non-structural attribute of `header`, keyed by its OpenEXR name.
pub fn collect_attributes(header: &Header) -> AttributeMap {
    let shared = &header.shared_attributes;
    let own = &header.own_attributes;
    let mut attributes = AttributeMap::new();

    attributes.insert("pixelAspectRatio", AttributeValue::F32(shared.pixel_aspect));
    insert_optional(&mut attributes, "chromaticities", shared.chromaticities.clone().map(AttributeValue::Chromaticities));
    insert_optional(&mut attributes, "timeCode", shared.time_code.clone().map(AttributeValue::TimeCode));

    attributes.insert("screenWindowCenter", AttributeValue::FloatVec2(own.screen_window_center));
    attributes.insert("screenWindowWidth", AttributeValue::F32(own.screen_window_width));

    let texts = [
        ("name", &own.layer_name),
        ("renderingTransform", &own.rendering_transform_name),
        ("lookModTransform", &own.look_modification_transform_name),
        ("owner", &own.owner),
        ("comments", &own.comments),
        ("capDate", &own.capture_date),
        ("wrapmodes", &own.wrap_mode_name),
        ("view", &own.view_name),
        ("software", &own.software_name),
    ];
    for (name, value) in texts {
        insert_optional(&mut attributes, name, value.clone().map(AttributeValue::Text));
    }

    let floats = [
        ("whiteLuminance", own.white_luminance),
        ("xDensity", own.horizontal_density),
        ("utcOffset", own.utc_offset),
        ("longitude", own.longitude),
        ("latitude", own.latitude),
        ("altitude", own.altitude),
        ("focus", own.focus),
        ("expTime", own.exposure),
        ("aperture", own.aperture),
        ("isoSpeed", own.iso_speed),
        ("nearClipPlane", own.near_clip_plane),
        ("farClipPlane", own.far_clip_plane),
        ("fieldOfViewHorizontal", own.horizontal_field_of_view),
        ("fieldOfViewVertical", own.vertical_field_of_view),
    ];
    for (name, value) in floats {
        insert_optional(&mut attributes, name, value.map(AttributeValue::F32));
    }

    insert_optional(&mut attributes, "adoptedNeutral", own.adopted_neutral.clone().map(AttributeValue::FloatVec2));
    insert_optional(&mut attributes, "envmap", own.environment_map.clone().map(AttributeValue::EnvironmentMap));
    insert_optional(&mut attributes, "keyCode", own.film_key_code.clone().map(AttributeValue::KeyCode));
    insert_optional(&mut attributes, "framesPerSecond", own.frames_per_second.clone().map(AttributeValue::Rational));
    insert_optional(&mut attributes, "deepImageState", own.deep_image_state.clone().map(AttributeValue::Rational));
    insert_optional(&mut attributes, "multiView", own.multi_view_names.clone().map(AttributeValue::TextVector));
    insert_optional(&mut attributes, "worldToCamera", own.world_to_camera.clone().map(AttributeValue::Matrix4x4));
    insert_optional(&mut attributes, "worldToNDC", own.world_to_normalized_device.clone().map(AttributeValue::Matrix4x4));
    insert_optional(&mut attributes, "originalDataWindow", own.original_data_window.clone().map(AttributeValue::IntegerBounds));
    insert_optional(&mut attributes, "preview", own.preview.clone().map(AttributeValue::Preview));

    for (name, value) in shared.other.iter().chain(own.other.iter()) {
        attributes.insert(name.to_string(), value.clone());
    }

    attributes
}

/// Stores every attribute of `attributes` in the matching typed field of
/// `header`, or in its layer's `other` map when no field matches.
/// Structural names are skipped since the header derives them itself.
pub fn apply_attributes(header: &mut Header, attributes: &AttributeMap) -> Result<()> {
    for (name, value) in attributes.iter() {
        if STRUCTURAL_NAMES.contains(&name) {
            debug!(attribute = name, "structural attribute not copied");
            continue;
        }

        let shared = &mut header.shared_attributes;
        let own = &mut header.own_attributes;

        match (name, value.clone()) {
            ("pixelAspectRatio", AttributeValue::F32(v)) => shared.pixel_aspect = v,
            ("chromaticities", AttributeValue::Chromaticities(v)) => shared.chromaticities = Some(v),
            ("timeCode", AttributeValue::TimeCode(v)) => shared.time_code = Some(v),

            ("screenWindowCenter", AttributeValue::FloatVec2(v)) => own.screen_window_center = v,
            ("screenWindowWidth", AttributeValue::F32(v)) => own.screen_window_width = v,

            ("name", AttributeValue::Text(v)) => own.layer_name = Some(v),
            ("renderingTransform", AttributeValue::Text(v)) => own.rendering_transform_name = Some(v),
            ("lookModTransform", AttributeValue::Text(v)) => own.look_modification_transform_name = Some(v),
            ("owner", AttributeValue::Text(v)) => own.owner = Some(v),
            ("comments", AttributeValue::Text(v)) => own.comments = Some(v),
            ("capDate", AttributeValue::Text(v)) => own.capture_date = Some(v),
            ("wrapmodes", AttributeValue::Text(v)) => own.wrap_mode_name = Some(v),
            ("view", AttributeValue::Text(v)) => own.view_name = Some(v),
            ("software", AttributeValue::Text(v)) => own.software_name = Some(v),

            ("whiteLuminance", AttributeValue::F32(v)) => own.white_luminance = Some(v),
            ("xDensity", AttributeValue::F32(v)) => own.horizontal_density = Some(v),
            ("utcOffset", AttributeValue::F32(v)) => own.utc_offset = Some(v),
            ("longitude", AttributeValue::F32(v)) => own.longitude = Some(v),
            ("latitude", AttributeValue::F32(v)) => own.latitude = Some(v),
            ("altitude", AttributeValue::F32(v)) => own.altitude = Some(v),
            ("focus", AttributeValue::F32(v)) => own.focus = Some(v),
            ("expTime", AttributeValue::F32(v)) => own.exposure = Some(v),
            ("aperture", AttributeValue::F32(v)) => own.aperture = Some(v),
            ("isoSpeed", AttributeValue::F32(v)) => own.iso_speed = Some(v),
            ("nearClipPlane", AttributeValue::F32(v)) => own.near_clip_plane = Some(v),
            ("farClipPlane", AttributeValue::F32(v)) => own.far_clip_plane = Some(v),
            ("fieldOfViewHorizontal", AttributeValue::F32(v)) => own.horizontal_field_of_view = Some(v),
            ("fieldOfViewVertical", AttributeValue::F32(v)) => own.vertical_field_of_view = Some(v),

            ("adoptedNeutral", AttributeValue::FloatVec2(v)) => own.adopted_neutral = Some(v),
            ("envmap", AttributeValue::EnvironmentMap(v)) => own.environment_map = Some(v),
            ("keyCode", AttributeValue::KeyCode(v)) => own.film_key_code = Some(v),
            ("framesPerSecond", AttributeValue::Rational(v)) => own.frames_per_second = Some(v),
            ("deepImageState", AttributeValue::Rational(v)) => own.deep_image_state = Some(v),
            ("multiView", AttributeValue::TextVector(v)) => own.multi_view_names = Some(v),
            ("worldToCamera", AttributeValue::Matrix4x4(v)) => own.world_to_camera = Some(v),
            ("worldToNDC", AttributeValue::Matrix4x4(v)) => own.world_to_normalized_device = Some(v),
            ("originalDataWindow", AttributeValue::IntegerBounds(v)) => own.original_data_window = Some(v),
            ("preview", AttributeValue::Preview(v)) => own.preview = Some(v),

            (name, value) => {
                own.other.insert(text(name)?, value);
            }
        }
    }

    Ok(())
}
