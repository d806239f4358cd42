/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images that must share a size do not.
    #[error("Invalid image size: {0}x{1} does not match {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel index is outside the image.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel index is outside the image.
    #[error("Channel index {0} is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a sample cannot be represented in the target type.
    #[error("Failed to cast image data to {0}")]
    CastError(String),
}
