//! Pixel interpolation methods for image transformations.
//!
//! All kernels accumulate in `f64` regardless of the sample type and
//! expect coordinates already inside `[0, cols - 1] × [0, rows - 1]`.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels

mod bilinear;
mod interpolate;
mod nearest;

pub(crate) use interpolate::interpolate_pixel;
pub use interpolate::InterpolationMode;
