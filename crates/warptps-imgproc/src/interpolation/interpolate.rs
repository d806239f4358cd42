use serde::{Deserialize, Serialize};
use warptps_image::{Image, ImageDtype};

use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;

/// Interpolation mode for resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated samples of every channel, widened to `f64`. An image
/// without pixels yields zeros.
pub(crate) fn interpolate_pixel<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
    interpolation: InterpolationMode,
) -> [f64; C] {
    if image.cols() == 0 || image.rows() == 0 {
        return [0.0; C];
    }

    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warptps_image::{ImageError, ImageSize};

    #[test]
    fn empty_image_yields_zeros() -> Result<(), ImageError> {
        for size in [[0, 0], [0, 3], [3, 0]] {
            let size: ImageSize = size.into();
            let image = Image::<u8, 2>::from_size_val(size, 7)?;
            for mode in [InterpolationMode::Bilinear, InterpolationMode::Nearest] {
                assert_eq!(interpolate_pixel(&image, 0.0, 0.0, mode), [0.0; 2]);
            }
        }
        Ok(())
    }

    #[test]
    fn dispatches_on_mode() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 100])?;
        assert_eq!(interpolate_pixel(&image, 0.5, 0.0, InterpolationMode::Bilinear), [50.0]);
        assert_eq!(interpolate_pixel(&image, 0.6, 0.0, InterpolationMode::Nearest), [100.0]);
        Ok(())
    }
}
