use warptps_image::{Image, ImageDtype, ImageError};

use crate::parallel;

/// Performs weighted addition of two images `src1` and `src2` with weights
/// `alpha` and `beta`:
///
/// dst(x,y,c) = src1(x,y,c) * alpha + src2(x,y,c) * beta
///
/// The sum is accumulated in `f64` and rounded and saturated back to the
/// sample type for integer images.
///
/// # Arguments
///
/// * `src1` - The first input image.
/// * `alpha` - Weight of the first image elements to be multiplied.
/// * `src2` - The second input image.
/// * `beta` - Weight of the second image elements to be multiplied.
/// * `dst` - The output image.
///
/// # Errors
///
/// Returns an error if the sizes of `src1`, `src2` and `dst` do not match.
pub fn add_weighted<T: ImageDtype, const C: usize>(
    src1: &Image<T, C>,
    alpha: f64,
    src2: &Image<T, C>,
    beta: f64,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError> {
    if src1.size() != src2.size() {
        return Err(ImageError::InvalidImageSize(
            src1.cols(),
            src1.rows(),
            src2.cols(),
            src2.rows(),
        ));
    }

    if src1.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src1.cols(),
            src1.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, out| {
        *out = T::from_f64(a.as_f64() * alpha + b.as_f64() * beta);
    });

    Ok(())
}
