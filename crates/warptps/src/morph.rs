use warptps_image::{Image, ImageDtype, ImageError};
use warptps_imgproc::enhance::add_weighted;
use warptps_imgproc::warp::warp_tps;
use warptps_tps::{LandmarkSet, Point2d, SolverParams, TpsSolver};

use crate::config::TransformConfig;
use crate::error::WarpTpsError;

/// Morph between two images through `num_frames + 1` in-between frames.
///
/// `landmarks_a[i]` in `img_a` corresponds to `landmarks_b[i]` in `img_b`.
/// Frame `i` uses `t = i / num_frames`: both images are warped onto the
/// landmark geometry `(1 - t)·a + t·b` and blended with weights `1 - t` and
/// `t`. The first frame reproduces `img_a` and the last one `img_b`.
///
/// The config supplies regularization, fill, interpolation and scheduling;
/// its `percent` is not used. Every frame warps onto zeroed buffers, so a
/// `Transparent` fill leaves zeros outside the source just like `Zeros`.
///
/// # Errors
///
/// * [`WarpTpsError::Image`] if the images differ in size.
/// * [`WarpTpsError::InvalidParameter`] if the landmark lists differ in
///   length or `num_frames` is zero.
/// * Fitting and warping errors for any frame.
pub fn morph_sequence<T: ImageDtype, const C: usize>(
    img_a: &Image<T, C>,
    img_b: &Image<T, C>,
    landmarks_a: &[Point2d],
    landmarks_b: &[Point2d],
    num_frames: usize,
    config: &TransformConfig,
) -> Result<Vec<Image<T, C>>, WarpTpsError> {
    if img_a.size() != img_b.size() {
        return Err(ImageError::InvalidImageSize(
            img_a.cols(),
            img_a.rows(),
            img_b.cols(),
            img_b.rows(),
        )
        .into());
    }
    if landmarks_a.len() != landmarks_b.len() {
        return Err(WarpTpsError::invalid(
            "landmarks",
            format!(
                "{} landmarks in the first image but {} in the second",
                landmarks_a.len(),
                landmarks_b.len()
            ),
        ));
    }
    if num_frames == 0 {
        return Err(WarpTpsError::invalid("num_frames", "must be > 0"));
    }
    config.validate()?;

    let solver = TpsSolver::new(SolverParams::with_regularization(config.regularization));
    let params = config.warp_params().with_percent(1.0);
    params.validate(C)?;

    log::debug!(
        "morphing {}x{} images over {} frames with {} landmarks",
        img_a.cols(),
        img_a.rows(),
        num_frames,
        landmarks_a.len()
    );

    let mut frames = Vec::with_capacity(num_frames + 1);

    for i in 0..=num_frames {
        let t = i as f64 / num_frames as f64;
        let between: Vec<Point2d> = landmarks_a
            .iter()
            .zip(landmarks_b.iter())
            .map(|(a, b)| a.lerp(*b, t))
            .collect();

        // pull from each source image: in-between geometry -> own geometry
        let to_a = solver.solve(&LandmarkSet::from_points(&between, landmarks_a))?;
        let to_b = solver.solve(&LandmarkSet::from_points(&between, landmarks_b))?;

        // fresh zeroed targets: a transparent fill must not see the previous frame
        let mut warped_a = Image::from_size_val(img_a.size(), T::from_f64(0.0))?;
        let mut warped_b = warped_a.clone();
        warp_tps(img_a, &mut warped_a, &to_a, &params)?;
        warp_tps(img_b, &mut warped_b, &to_b, &params)?;

        let mut frame = Image::from_size_val(img_a.size(), T::from_f64(0.0))?;
        add_weighted(&warped_a, 1.0 - t, &warped_b, t, &mut frame)?;
        frames.push(frame);
    }

    Ok(frames)
}
