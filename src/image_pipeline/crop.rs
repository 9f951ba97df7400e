//! Cropping module
//!
//! Derives the cropped image's metadata and streams the bounding window's
//! pixels into it.

mod header;
mod streamer;
pub mod types;

pub use header::{attribute_policy, AttributePolicy, CroppedHeaderBuilder};
pub use streamer::CropStreamer;
pub use types::{CropConfig, CropConfigBuilder, EmptyImagePolicy, OutputCompression};
