//! Image container module
//!
//! Container-neutral metadata and row streaming interfaces, plus an in-memory
//! implementation of both sides.

pub mod reader;
pub mod writer;
pub mod memory;
pub mod types;

pub use reader::{ImageReader, RowReader};
pub use writer::{ImageWriter, RowWriter};
pub use memory::{MemoryImage, MemoryRowReader, RecordedImage, RecordingWriter};
pub use types::{
    AttributeMap, AttributeValue, ChannelSpec, Compression, ImageMetadata, LineOrder, PixelType,
    ScanlineBuffer, StorageLayout,
};
