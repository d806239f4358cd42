use warptps_image::{Image, ImageDtype};
use warptps_imgproc::warp::{warp_tps, WarpParams};
use warptps_tps::{evaluate, LandmarkSet, Point2d, SolverParams, TpsModel, TpsSolver};

use crate::config::TransformConfig;
use crate::error::WarpTpsError;

/// A fitted pair of forward and inverse splines.
///
/// `forward` maps source coordinates to destination coordinates and is what
/// [`WarpModel::evaluate`] uses. `inverse` is fitted on the swapped
/// landmarks and drives the pull-based image warp.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpModel {
    forward: TpsModel,
    inverse: TpsModel,
}

impl WarpModel {
    /// Fit both directions on `landmarks`.
    ///
    /// # Errors
    ///
    /// Propagates [`warptps_tps::TpsError`] from either solve.
    pub fn fit(landmarks: &LandmarkSet, regularization: f64) -> Result<Self, WarpTpsError> {
        let solver = TpsSolver::new(SolverParams::with_regularization(regularization));
        let forward = solver.solve(landmarks)?;
        let inverse = solver.solve(&landmarks.swapped())?;
        Ok(Self { forward, inverse })
    }

    /// Assemble a handle from already fitted splines.
    pub fn from_models(forward: TpsModel, inverse: TpsModel) -> Self {
        Self { forward, inverse }
    }

    /// The source to destination spline.
    pub fn forward(&self) -> &TpsModel {
        &self.forward
    }

    /// The destination to source spline.
    pub fn inverse(&self) -> &TpsModel {
        &self.inverse
    }

    /// Map a source point towards its destination.
    pub fn evaluate(&self, point: Point2d, percent: f64) -> Result<Point2d, WarpTpsError> {
        Ok(evaluate(&self.forward, point, percent)?)
    }

    /// Warp `src` into a new image of the same size, channel count and sample type.
    pub fn warp<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
        params: &WarpParams,
    ) -> Result<Image<T, C>, WarpTpsError> {
        let mut dst = Image::from_size_val(src.size(), T::from_f64(0.0))?;
        self.warp_into(src, &mut dst, params)?;
        Ok(dst)
    }

    /// Warp `src` into a preallocated destination of the same size.
    ///
    /// With [`warptps_imgproc::fill::FillPolicy::Transparent`] the pixels
    /// that map outside `src` keep their previous value in `dst`.
    pub fn warp_into<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
        dst: &mut Image<T, C>,
        params: &WarpParams,
    ) -> Result<(), WarpTpsError> {
        warp_tps(src, dst, &self.inverse, params)?;
        Ok(())
    }
}

/// Builds a landmark set incrementally and fits it.
///
/// # Example
///
/// ```
/// use warptps::{Image, ImageSize, TpsTransform};
///
/// let mut transform = TpsTransform::default();
/// transform.add_landmark([100.0, 100.0], [110.0, 110.0]);
/// transform.add_landmark([200.0, 100.0], [210.0, 120.0]);
/// transform.add_landmark([150.0, 200.0], [155.0, 205.0]);
///
/// let model = transform.compute_model()?;
/// let image = Image::<u8, 3>::from_size_val(ImageSize { width: 300, height: 300 }, 0)?;
/// let warped = model.warp(&image, &transform.config().warp_params())?;
/// assert_eq!(warped.size(), image.size());
/// # Ok::<(), warptps::WarpTpsError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TpsTransform {
    landmarks: LandmarkSet,
    config: TransformConfig,
}

impl TpsTransform {
    /// Create an empty transform with the given configuration.
    pub fn new(config: TransformConfig) -> Self {
        Self {
            landmarks: LandmarkSet::new(),
            config,
        }
    }

    /// Create a transform from existing landmarks.
    pub fn with_landmarks(landmarks: LandmarkSet, config: TransformConfig) -> Self {
        Self { landmarks, config }
    }

    /// Append a correspondence.
    pub fn add_landmark(&mut self, source: impl Into<Point2d>, destination: impl Into<Point2d>) {
        self.landmarks.add(source, destination);
    }

    /// Remove every correspondence.
    pub fn clear_landmarks(&mut self) {
        self.landmarks.clear();
    }

    /// Number of correspondences.
    pub fn landmark_count(&self) -> usize {
        self.landmarks.count()
    }

    /// The correspondences.
    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    /// The configuration.
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: TransformConfig) {
        self.config = config;
    }

    /// Fit forward and inverse splines on a snapshot of the landmarks.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, fewer than three landmarks or a
    /// singular system. No model is produced in that case.
    pub fn compute_model(&self) -> Result<WarpModel, WarpTpsError> {
        self.config.validate()?;
        WarpModel::fit(&self.landmarks, self.config.regularization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use warptps_tps::TpsError;

    #[test]
    fn compute_model_needs_three_landmarks() {
        let mut transform = TpsTransform::default();
        for _ in 0..3 {
            assert!(matches!(
                transform.compute_model(),
                Err(WarpTpsError::Tps(TpsError::InsufficientLandmarks { .. }))
            ));
            let k = transform.landmark_count() as f64;
            transform.add_landmark([k * 10.0, k * k], [k * 10.0, k * k + 1.0]);
        }
        assert!(transform.compute_model().is_ok());

        transform.clear_landmarks();
        assert_eq!(transform.landmark_count(), 0);
    }

    #[test]
    fn forward_and_inverse_are_consistent() -> Result<(), WarpTpsError> {
        let mut transform = TpsTransform::default();
        transform.add_landmark([100.0, 100.0], [110.0, 110.0]);
        transform.add_landmark([200.0, 100.0], [210.0, 120.0]);
        transform.add_landmark([150.0, 200.0], [155.0, 205.0]);
        transform.add_landmark([120.0, 160.0], [118.0, 163.0]);
        let model = transform.compute_model()?;

        for pair in transform.landmarks() {
            let p = model.evaluate(pair.source, 1.0)?;
            assert_relative_eq!(p.x, pair.destination.x, epsilon = 1e-6);
            assert_relative_eq!(p.y, pair.destination.y, epsilon = 1e-6);

            let back = model.inverse().transform(pair.destination);
            assert_relative_eq!(back.x, pair.source.x, epsilon = 1e-6);
            assert_relative_eq!(back.y, pair.source.y, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn invalid_config_blocks_fit() {
        let mut transform = TpsTransform::new(TransformConfig {
            regularization: f64::NAN,
            ..Default::default()
        });
        transform.add_landmark([0.0, 0.0], [0.0, 0.0]);
        transform.add_landmark([1.0, 0.0], [1.0, 0.0]);
        transform.add_landmark([0.0, 1.0], [0.0, 1.0]);
        assert!(transform.compute_model().is_err());
    }
}
