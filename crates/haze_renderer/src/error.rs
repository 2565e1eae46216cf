use haze_core::CoreError;
use thiserror::Error;

/// Errors produced while rendering or writing output.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Pixel buffer does not match a {width}x{height} image")]
    BufferSize { width: u32, height: u32 },
}

pub type RenderResult<T> = Result<T, RenderError>;
