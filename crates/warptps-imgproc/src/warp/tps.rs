use warptps_image::{Image, ImageDtype};
use warptps_tps::{blend, Point2d, TpsModel};

use super::{check_same_size, resample, WarpError, WarpParams};

/// Warp an image through a thin-plate spline.
///
/// Every destination pixel `(x, y)` is pulled from the source location
/// `blend(inverse, (x, y), params.percent)`, so `inverse` must map
/// destination coordinates back to source coordinates. Fit it on the
/// landmarks with source and destination swapped.
///
/// # Arguments
///
/// * `src` - The input image with shape (height, width, C).
/// * `dst` - The output image, same shape as `src`.
/// * `inverse` - The destination to source transform.
/// * `params` - Blend factor, fill policy, interpolation and scheduling.
///
/// # Errors
///
/// * [`WarpError::Image`] if `dst` and `src` differ in size.
/// * [`WarpError::Tps`] / [`WarpError::InvalidParameter`] for bad parameters.
/// * [`WarpError::Cancelled`] if the cancel token fired before every band ran.
///
/// # Example
///
/// ```
/// use warptps_image::{Image, ImageSize};
/// use warptps_imgproc::warp::{warp_tps, WarpParams};
/// use warptps_tps::{solve, LandmarkSet};
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([10.0, 10.0], [12.0, 11.0]);
/// landmarks.add([50.0, 10.0], [50.0, 10.0]);
/// landmarks.add([30.0, 50.0], [30.0, 48.0]);
/// let inverse = solve(&landmarks.swapped(), 0.0)?;
///
/// let size = ImageSize { width: 64, height: 64 };
/// let src = Image::<u8, 3>::from_size_val(size, 128)?;
/// let mut dst = Image::<u8, 3>::from_size_val(size, 0)?;
/// warp_tps(&src, &mut dst, &inverse, &WarpParams::default())?;
/// assert_eq!(dst.size(), src.size());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn warp_tps<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    inverse: &TpsModel,
    params: &WarpParams,
) -> Result<(), WarpError> {
    check_same_size(src, dst)?;
    params.validate(C)?;

    log::debug!(
        "warping {}x{}x{} image through {} control points at percent {}",
        src.cols(),
        src.rows(),
        C,
        inverse.num_control_points(),
        params.percent
    );

    let percent = params.percent;
    resample(src, dst, params, |x, y| {
        let p = blend(inverse, Point2d::new(x as f64, y as f64), percent);
        (p.x, p.y)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillPolicy;
    use crate::interpolation::InterpolationMode;
    use crate::parallel::{CancelToken, ExecutionStrategy};
    use warptps_image::ImageSize;
    use warptps_tps::{solve, LandmarkSet};

    fn gradient<T: ImageDtype, const C: usize>(size: ImageSize) -> Result<Image<T, C>, WarpError> {
        let mut data = Vec::with_capacity(size.area() * C);
        for y in 0..size.height {
            for x in 0..size.width {
                for c in 0..C {
                    data.push(T::from_f64(((x * 7 + y * 13 + c * 31) % 251) as f64));
                }
            }
        }
        Ok(Image::new(size, data)?)
    }

    fn identity_landmarks() -> LandmarkSet {
        let mut landmarks = LandmarkSet::new();
        for p in [[3.0, 4.0], [40.0, 7.0], [22.0, 30.0], [9.0, 35.0], [35.0, 36.0]] {
            landmarks.add(p, p);
        }
        landmarks
    }

    #[test]
    fn identity_is_exact_u8() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize { width: 45, height: 38 };
        let src = gradient::<u8, 3>(size)?;
        let inverse = solve(&identity_landmarks(), 0.0)?;
        for percent in [0.0, 0.3, 1.0, 1.7, -0.5] {
            let mut dst = Image::<u8, 3>::from_size_val(size, 0)?;
            let params = WarpParams::default().with_percent(percent);
            warp_tps(&src, &mut dst, &inverse, &params)?;
            assert_eq!(dst.as_slice(), src.as_slice(), "percent {percent}");
        }
        Ok(())
    }

    #[test]
    fn identity_is_exact_f32() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize { width: 33, height: 20 };
        let mut src = gradient::<f32, 1>(size)?;
        src.as_slice_mut().iter_mut().for_each(|v| *v = *v / 7.0 + 0.1);
        let inverse = solve(&identity_landmarks(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(size, -1.0)?;
        warp_tps(&src, &mut dst, &inverse, &WarpParams::default())?;
        assert_eq!(dst.as_slice(), src.as_slice());
        Ok(())
    }

    #[test]
    fn size_mismatch_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let src = Image::<u8, 1>::from_size_val(ImageSize { width: 4, height: 4 }, 0)?;
        let mut dst = Image::<u8, 1>::from_size_val(ImageSize { width: 5, height: 4 }, 0)?;
        let res = warp_tps(&src, &mut dst, &TpsModel::identity(), &WarpParams::default());
        assert!(matches!(res, Err(WarpError::Image(_))));
        Ok(())
    }

    #[test]
    fn translation_fills_uncovered_border() -> Result<(), Box<dyn std::error::Error>> {
        // destination = source + (2, 0); the inverse pulls from x - 2
        let mut landmarks = LandmarkSet::new();
        landmarks.add([0.0, 0.0], [2.0, 0.0]);
        landmarks.add([10.0, 0.0], [12.0, 0.0]);
        landmarks.add([0.0, 10.0], [2.0, 10.0]);
        let inverse = solve(&landmarks.swapped(), 0.0)?;

        let size = ImageSize { width: 6, height: 3 };
        let src = Image::<u8, 1>::from_size_val(size, 200)?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 1)?;
        let params = WarpParams::default().with_fill(FillPolicy::Constant(vec![50.0]));
        warp_tps(&src, &mut dst, &inverse, &params)?;
        for y in 0..3 {
            assert_eq!(dst.pixel(0, y)?, &[50]);
            assert_eq!(dst.pixel(1, y)?, &[50]);
            assert_eq!(dst.pixel(2, y)?, &[200]);
            assert_eq!(dst.pixel(5, y)?, &[200]);
        }
        Ok(())
    }

    #[test]
    fn strategies_agree() -> Result<(), Box<dyn std::error::Error>> {
        let mut landmarks = LandmarkSet::new();
        landmarks.add([5.0, 5.0], [8.0, 6.0]);
        landmarks.add([40.0, 5.0], [38.0, 9.0]);
        landmarks.add([20.0, 30.0], [24.0, 28.0]);
        landmarks.add([5.0, 30.0], [5.0, 30.0]);
        let inverse = solve(&landmarks.swapped(), 0.0)?;

        let size = ImageSize { width: 48, height: 37 };
        let src = gradient::<u16, 2>(size)?;
        let mut expected = Image::<u16, 2>::from_size_val(size, 0)?;
        let serial = WarpParams::default()
            .with_strategy(ExecutionStrategy::Serial)
            .with_percent(0.8);
        warp_tps(&src, &mut expected, &inverse, &serial)?;

        for params in [
            serial.clone().with_strategy(ExecutionStrategy::Parallel).with_band_rows(5),
            serial.clone().with_strategy(ExecutionStrategy::Fixed(3)).with_band_rows(1),
            serial.clone().with_band_rows(100),
        ] {
            let mut dst = Image::<u16, 2>::from_size_val(size, 0)?;
            warp_tps(&src, &mut dst, &inverse, &params)?;
            assert_eq!(dst.as_slice(), expected.as_slice());
        }
        Ok(())
    }

    #[test]
    fn nearest_interpolation_copies_source_samples() -> Result<(), Box<dyn std::error::Error>> {
        let mut landmarks = LandmarkSet::new();
        landmarks.add([0.0, 0.0], [0.3, 0.2]);
        landmarks.add([20.0, 0.0], [20.4, 0.1]);
        landmarks.add([0.0, 20.0], [0.2, 20.3]);
        landmarks.add([20.0, 20.0], [20.1, 20.2]);
        let inverse = solve(&landmarks.swapped(), 0.0)?;

        let size = ImageSize { width: 21, height: 21 };
        let src = gradient::<u8, 1>(size)?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
        let params = WarpParams::default()
            .with_interpolation(InterpolationMode::Nearest)
            .with_fill(FillPolicy::Replicate);
        warp_tps(&src, &mut dst, &inverse, &params)?;
        assert!(dst.as_slice().iter().all(|v| src.as_slice().contains(v)));
        Ok(())
    }

    #[test]
    fn cancelled_warp() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize { width: 8, height: 8 };
        let src = Image::<u8, 1>::from_size_val(size, 10)?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
        let token = CancelToken::new();
        token.cancel();
        let params = WarpParams::default().with_cancel_token(token);
        let res = warp_tps(&src, &mut dst, &TpsModel::identity(), &params);
        assert_eq!(res, Err(WarpError::Cancelled));
        assert!(dst.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }
}
