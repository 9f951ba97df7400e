//! Bounding box detection
//!
//! Finds the smallest window holding every non-zero sample of an image in a
//! single forward pass over its scanlines.

mod accumulator;
mod reducer;
mod scanner;

pub use accumulator::BoundingAccumulator;
pub use reducer::BoundingBoxReducer;
pub use scanner::scan_scanline;
