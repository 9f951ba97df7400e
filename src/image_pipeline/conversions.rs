//! Pipeline conversions module
//!
//! Orchestrates the bounds and copy passes of an autocrop between a reader
//! and a writer.

mod autocrop;
mod timing;


pub use autocrop::{AutocropPipeline, CropReport};
pub use timing::{PipelineTimings, StepTiming, Timer};
