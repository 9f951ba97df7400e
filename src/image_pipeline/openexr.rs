//! OpenEXR container collaborators
//!
//! Reads and writes single-part scanline OpenEXR files through the `exr`
//! crate's block-level API, so pixels are streamed one row at a time.

mod attributes;
mod exr_reader;
mod exr_writer;
mod metadata;

pub use exr_reader::{ExrImageReader, ExrRowReader};
pub use exr_writer::ExrImageWriter;
pub use metadata::{header_to_metadata, metadata_to_header};
