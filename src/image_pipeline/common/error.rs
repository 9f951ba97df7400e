use thiserror::Error;

use crate::image_pipeline::window::RasterWindow;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Malformed or unsupported image: {0}")]
    Format(String),

    #[error("Unsupported storage layout: {0}")]
    UnsupportedLayout(String),

    #[error("Image contains no non-zero sample in any channel")]
    EmptyImage,

    #[error("Row protocol violation: {0}")]
    Protocol(String),

    #[error("Bounding window {bounds} is not a non-empty part of data window {data_window}")]
    InvalidBounds {
        bounds: RasterWindow,
        data_window: RasterWindow,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<exr::error::Error> for CropError {
    fn from(error: exr::error::Error) -> Self {
        match error {
            exr::error::Error::Io(io) => CropError::IoError(io),
            other => CropError::Format(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CropError>;
