use serde::{Deserialize, Serialize};

use crate::error::TpsError;
use crate::kernel::tps_kernel_sq;
use crate::landmarks::LandmarkSet;
use crate::point::Point2d;

/// Relative tolerance for the side conditions `Σw = 0`, `Σw·x = 0`, `Σw·y = 0`.
pub const SIDE_CONDITION_TOLERANCE: f64 = 1e-8;

/// A fitted thin-plate spline mapping the plane onto itself.
///
/// For each output coordinate `k ∈ {x, y}`:
///
/// ```text
/// f_k(p) = a_k[0] + a_k[1]·p.x + a_k[2]·p.y + Σᵢ w_k[i]·U(‖cᵢ - p‖)
/// ```
///
/// with `U(r) = r² ln r`. The model is immutable once built and cheap to
/// share across threads by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelData", into = "ModelData")]
pub struct TpsModel {
    control_points: Vec<Point2d>,
    weights: [Vec<f64>; 2],
    affine: [[f64; 3]; 2],
}

/// Unvalidated serialized form of [`TpsModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelData {
    control_points: Vec<Point2d>,
    weights_x: Vec<f64>,
    weights_y: Vec<f64>,
    affine_x: [f64; 3],
    affine_y: [f64; 3],
}

impl TryFrom<ModelData> for TpsModel {
    type Error = TpsError;

    fn try_from(data: ModelData) -> Result<Self, Self::Error> {
        TpsModel::new(
            data.control_points,
            data.weights_x,
            data.weights_y,
            data.affine_x,
            data.affine_y,
        )
    }
}

impl From<TpsModel> for ModelData {
    fn from(model: TpsModel) -> Self {
        let [weights_x, weights_y] = model.weights;
        let [affine_x, affine_y] = model.affine;
        Self {
            control_points: model.control_points,
            weights_x,
            weights_y,
            affine_x,
            affine_y,
        }
    }
}

impl TpsModel {
    /// Build a model from its coefficients.
    ///
    /// # Arguments
    ///
    /// * `control_points` - The source-side landmark positions.
    /// * `weights_x` - Radial weights of the x output, one per control point.
    /// * `weights_y` - Radial weights of the y output, one per control point.
    /// * `affine_x` - `[constant, x, y]` coefficients of the x output.
    /// * `affine_y` - `[constant, x, y]` coefficients of the y output.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::InvalidParameter`] if the lengths disagree, a value
    /// is not finite, or the weights violate the side conditions.
    pub fn new(
        control_points: Vec<Point2d>,
        weights_x: Vec<f64>,
        weights_y: Vec<f64>,
        affine_x: [f64; 3],
        affine_y: [f64; 3],
    ) -> Result<Self, TpsError> {
        let n = control_points.len();
        if weights_x.len() != n || weights_y.len() != n {
            return Err(TpsError::invalid(
                "weights",
                format!(
                    "expected {n} weights per axis, got {} and {}",
                    weights_x.len(),
                    weights_y.len()
                ),
            ));
        }

        if !control_points.iter().all(|p| p.is_finite()) {
            return Err(TpsError::invalid(
                "control_points",
                "coordinates must be finite",
            ));
        }

        let coefficients_finite = weights_x
            .iter()
            .chain(weights_y.iter())
            .chain(affine_x.iter())
            .chain(affine_y.iter())
            .all(|v| v.is_finite());
        if !coefficients_finite {
            return Err(TpsError::invalid("weights", "coefficients must be finite"));
        }

        let model = Self {
            control_points,
            weights: [weights_x, weights_y],
            affine: [affine_x, affine_y],
        };
        model.check_side_conditions()?;

        Ok(model)
    }

    /// The identity transform, with no control points.
    pub fn identity() -> Self {
        Self {
            control_points: Vec::new(),
            weights: [Vec::new(), Vec::new()],
            affine: [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    // The conditions are checked in a frame centred on the control points and
    // scaled to unit RMS radius, where every term is comparable to the
    // affine slopes.
    fn check_side_conditions(&self) -> Result<(), TpsError> {
        let n = self.control_points.len();
        if n == 0 {
            return Ok(());
        }

        let centroid = self
            .control_points
            .iter()
            .fold(Point2d::ZERO, |acc, &p| acc + p)
            * (1.0 / n as f64);
        let rms = (self
            .control_points
            .iter()
            .map(|p| p.distance_squared(centroid))
            .sum::<f64>()
            / n as f64)
            .sqrt();
        let scale = if rms > 0.0 { rms } else { 1.0 };

        for (axis, (weights, affine)) in self.weights.iter().zip(self.affine.iter()).enumerate() {
            let mut sum = 0.0;
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            let mut magnitude = (affine[1].abs() + affine[2].abs()) * scale;
            for (w, p) in weights.iter().zip(self.control_points.iter()) {
                let w = w * scale * scale;
                let q = (*p - centroid) * (1.0 / scale);
                sum += w;
                sum_x += w * q.x;
                sum_y += w * q.y;
                magnitude += w.abs();
            }

            let residual = sum.abs().max(sum_x.abs()).max(sum_y.abs());
            if residual > SIDE_CONDITION_TOLERANCE * magnitude {
                return Err(TpsError::invalid(
                    "weights",
                    format!(
                        "side conditions violated on axis {axis}: \
                         residual {residual:.3e} for magnitude {magnitude:.3e}"
                    ),
                ));
            }
        }

        Ok(())
    }

    /// The control points the model was fitted on.
    pub fn control_points(&self) -> &[Point2d] {
        &self.control_points
    }

    /// Number of control points.
    pub fn num_control_points(&self) -> usize {
        self.control_points.len()
    }

    /// Radial weights of the x output.
    pub fn weights_x(&self) -> &[f64] {
        &self.weights[0]
    }

    /// Radial weights of the y output.
    pub fn weights_y(&self) -> &[f64] {
        &self.weights[1]
    }

    /// `[constant, x, y]` coefficients of the x output.
    pub fn affine_x(&self) -> [f64; 3] {
        self.affine[0]
    }

    /// `[constant, x, y]` coefficients of the y output.
    pub fn affine_y(&self) -> [f64; 3] {
        self.affine[1]
    }

    /// Map a point through the full transform.
    #[inline]
    pub fn transform(&self, p: Point2d) -> Point2d {
        let [ax, ay] = &self.affine;
        let mut tx = ax[0] + ax[1] * p.x + ax[2] * p.y;
        let mut ty = ay[0] + ay[1] * p.x + ay[2] * p.y;

        for ((cp, wx), wy) in self
            .control_points
            .iter()
            .zip(self.weights[0].iter())
            .zip(self.weights[1].iter())
        {
            let u = tps_kernel_sq(p.distance_squared(*cp));
            tx += wx * u;
            ty += wy * u;
        }

        Point2d::new(tx, ty)
    }

    /// Map several points through the full transform.
    pub fn transform_points(&self, points: &[Point2d]) -> Vec<Point2d> {
        points.iter().map(|&p| self.transform(p)).collect()
    }

    /// Bending energy of the spline, `wₓᵀ K wₓ + wᵧᵀ K wᵧ`.
    ///
    /// Lower values indicate a smoother transform; a pure affine map has zero
    /// bending energy.
    pub fn bending_energy(&self) -> f64 {
        let n = self.control_points.len();
        let mut energy = 0.0;

        for i in 0..n {
            for j in (i + 1)..n {
                let r2 = self.control_points[i].distance_squared(self.control_points[j]);
                let u = tps_kernel_sq(r2);
                energy += 2.0 * u * self.weights[0][i] * self.weights[0][j];
                energy += 2.0 * u * self.weights[1][i] * self.weights[1][j];
            }
        }

        energy.abs()
    }

    /// Distance between the transformed source and the destination of every pair.
    ///
    /// With zero regularization these should all be close to zero when the
    /// model was fitted on `landmarks`.
    pub fn residuals(&self, landmarks: &LandmarkSet) -> Vec<f64> {
        landmarks
            .iter()
            .map(|pair| self.transform(pair.source).distance(pair.destination))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_model() {
        let model = TpsModel::identity();
        let p = Point2d::new(3.5, -2.0);
        assert_eq!(model.transform(p), p);
        assert_eq!(model.bending_energy(), 0.0);
        assert_eq!(model.num_control_points(), 0);
    }

    #[test]
    fn affine_only_model() -> Result<(), TpsError> {
        let model = TpsModel::new(
            vec![Point2d::new(0.0, 0.0), Point2d::new(1.0, 0.0), Point2d::new(0.0, 1.0)],
            vec![0.0; 3],
            vec![0.0; 3],
            [1.0, 2.0, 0.0],
            [-1.0, 0.0, 3.0],
        )?;
        let p = model.transform(Point2d::new(2.0, 1.0));
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 2.0);
        Ok(())
    }

    #[test]
    fn rejects_length_mismatch() {
        let res = TpsModel::new(
            vec![Point2d::new(0.0, 0.0)],
            vec![0.0; 2],
            vec![0.0],
            [0.0; 3],
            [0.0; 3],
        );
        assert!(matches!(res, Err(TpsError::InvalidParameter { name: "weights", .. })));
    }

    #[test]
    fn rejects_non_finite() {
        let res = TpsModel::new(
            vec![Point2d::new(0.0, f64::NAN)],
            vec![0.0],
            vec![0.0],
            [0.0; 3],
            [0.0; 3],
        );
        assert!(matches!(
            res,
            Err(TpsError::InvalidParameter {
                name: "control_points",
                ..
            })
        ));
    }

    #[test]
    fn rejects_side_condition_violation() {
        let res = TpsModel::new(
            vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0), Point2d::new(0.0, 10.0)],
            vec![1.0, 1.0, 1.0],
            vec![0.0; 3],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        );
        assert!(matches!(res, Err(TpsError::InvalidParameter { name: "weights", .. })));
    }

    #[test]
    fn accepts_balanced_weights() -> Result<(), TpsError> {
        // four corners of a square with alternating signs: Σw = 0, Σw·x = 0, Σw·y = 0
        let model = TpsModel::new(
            vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 0.0),
                Point2d::new(1.0, 1.0),
                Point2d::new(0.0, 1.0),
            ],
            vec![0.5, -0.5, 0.5, -0.5],
            vec![0.0; 4],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        )?;
        assert!(model.bending_energy() > 0.0);
        Ok(())
    }

    #[test]
    fn serde_validates_on_load() -> Result<(), serde_json::Error> {
        let json = r#"{
            "control_points": [[0.0, 0.0], [4.0, 0.0]],
            "weights_x": [1.0, 1.0],
            "weights_y": [0.0, 0.0],
            "affine_x": [0.0, 1.0, 0.0],
            "affine_y": [0.0, 0.0, 1.0]
        }"#;
        assert!(serde_json::from_str::<TpsModel>(json).is_err());

        let model = TpsModel::identity();
        let back: TpsModel = serde_json::from_str(&serde_json::to_string(&model)?)?;
        assert_eq!(back, model);
        Ok(())
    }
}
