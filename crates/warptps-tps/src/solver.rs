//! Fitting a [`TpsModel`] from a [`LandmarkSet`].
//!
//! The system has the form:
//!
//! ```text
//! [K + λI  A] [W]   [V]
//! [Aᵀ      0] [C] = [0]
//! ```
//!
//! where `K[i, j] = U(‖pᵢ - pⱼ‖)`, `A[i, :] = [1, xᵢ, yᵢ]`, `W` are the radial
//! weights and `C` the affine coefficients. Both output coordinates share
//! the factorization and differ only in the right-hand side `V`.

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::error::TpsError;
use crate::kernel::tps_kernel_sq;
use crate::landmarks::LandmarkSet;
use crate::linalg::LuFactorization;
use crate::model::TpsModel;
use crate::point::Point2d;

/// Minimum number of landmarks needed to fit a thin-plate spline.
pub const MIN_LANDMARKS: usize = 3;

/// Default relative pivot threshold for singularity detection.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-10;

/// Parameters for the thin-plate spline solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Regularization `λ`, added to the diagonal of the kernel block.
    ///
    /// `0.0` interpolates the landmarks exactly; larger values trade accuracy
    /// at the landmarks for smoothness. It is applied after the source points
    /// are normalised to unit RMS radius, so its effect does not depend on
    /// the pixel scale of the landmarks.
    pub regularization: f64,
    /// Pivots below `pivot_tolerance * ‖M‖∞` are treated as singular.
    pub pivot_tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            regularization: 0.0,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
        }
    }
}

impl SolverParams {
    /// Solver parameters with the given regularization and default tolerance.
    pub fn with_regularization(regularization: f64) -> Self {
        Self {
            regularization,
            ..Default::default()
        }
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::InvalidParameter`] for a negative or non-finite
    /// regularization, or a non-positive pivot tolerance.
    pub fn validate(&self) -> Result<(), TpsError> {
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(TpsError::invalid(
                "regularization",
                format!("must be finite and >= 0, got {}", self.regularization),
            ));
        }
        if !self.pivot_tolerance.is_finite() || self.pivot_tolerance <= 0.0 {
            return Err(TpsError::invalid(
                "pivot_tolerance",
                format!("must be finite and > 0, got {}", self.pivot_tolerance),
            ));
        }
        Ok(())
    }
}

/// Similarity that centres the source points and scales them to unit RMS radius.
#[derive(Debug, Clone, Copy)]
struct Normalization {
    center: Point2d,
    scale: f64,
}

impl Normalization {
    fn from_points(points: &[Point2d]) -> Result<Self, TpsError> {
        let n = points.len() as f64;
        let center = points.iter().fold(Point2d::ZERO, |acc, &p| acc + p) * (1.0 / n);
        let scale = (points.iter().map(|p| p.distance_squared(center)).sum::<f64>() / n).sqrt();

        if !(scale > f64::EPSILON * (1.0 + center.length())) {
            return Err(TpsError::SingularSystem(
                "all source landmarks coincide".to_string(),
            ));
        }

        Ok(Self { center, scale })
    }

    #[inline]
    fn apply(&self, p: Point2d) -> Point2d {
        (p - self.center) * (1.0 / self.scale)
    }
}

/// Thin-plate spline solver.
///
/// # Example
///
/// ```
/// use warptps_tps::{LandmarkSet, SolverParams, TpsSolver};
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([100.0, 100.0], [110.0, 110.0]);
/// landmarks.add([200.0, 100.0], [210.0, 120.0]);
/// landmarks.add([150.0, 200.0], [155.0, 205.0]);
///
/// let model = TpsSolver::new(SolverParams::default()).solve(&landmarks)?;
/// let p = model.transform([200.0, 100.0].into());
/// assert!((p.x - 210.0).abs() < 1e-6 && (p.y - 120.0).abs() < 1e-6);
/// # Ok::<(), warptps_tps::TpsError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TpsSolver {
    params: SolverParams,
}

impl TpsSolver {
    /// Create a solver with the given parameters.
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    /// The solver parameters.
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Fit a model mapping every landmark source onto its destination.
    ///
    /// # Errors
    ///
    /// * [`TpsError::InvalidParameter`] for a bad regularization or tolerance,
    ///   or a non-finite landmark coordinate.
    /// * [`TpsError::InsufficientLandmarks`] for fewer than three pairs.
    /// * [`TpsError::SingularSystem`] when the source points are collinear,
    ///   duplicated without regularization, or otherwise degenerate.
    pub fn solve(&self, landmarks: &LandmarkSet) -> Result<TpsModel, TpsError> {
        self.params.validate()?;

        let n = landmarks.count();
        if n < MIN_LANDMARKS {
            return Err(TpsError::InsufficientLandmarks {
                required: MIN_LANDMARKS,
                actual: n,
            });
        }

        if let Some(i) = landmarks
            .iter()
            .position(|pair| !pair.source.is_finite() || !pair.destination.is_finite())
        {
            return Err(TpsError::invalid(
                "landmarks",
                format!("pair {i} has a non-finite coordinate"),
            ));
        }

        if !landmarks.conditioning_risks().is_empty() && self.params.regularization == 0.0 {
            log::warn!(
                "fitting {} landmarks with {} nearly coincident sources and no regularization",
                n,
                landmarks.conditioning_risks().len()
            );
        }

        log::debug!(
            "fitting thin-plate spline: {} landmarks, regularization {}",
            n,
            self.params.regularization
        );

        let sources = landmarks.source_points();
        let norm = Normalization::from_points(&sources)?;
        let normalized: Vec<Point2d> = sources.iter().map(|&p| norm.apply(p)).collect();

        let system = assemble_system(&normalized, self.params.regularization);
        let lu = LuFactorization::factorize(&system, self.params.pivot_tolerance)?;

        // one column per output coordinate, zero rows for the side conditions
        let mut rhs = Mat::<f64>::zeros(n + 3, 2);
        for (i, pair) in landmarks.iter().enumerate() {
            rhs[(i, 0)] = pair.destination.x;
            rhs[(i, 1)] = pair.destination.y;
        }

        let solution = lu.solve(&rhs);
        let solution_x: Vec<f64> = (0..n + 3).map(|i| solution[(i, 0)]).collect();
        let solution_y: Vec<f64> = (0..n + 3).map(|i| solution[(i, 1)]).collect();

        if !solution_x.iter().chain(solution_y.iter()).all(|v| v.is_finite()) {
            return Err(TpsError::SingularSystem(
                "solution has non-finite coefficients".to_string(),
            ));
        }

        let (weights_x, affine_x) = denormalize(&solution_x, &normalized, norm);
        let (weights_y, affine_y) = denormalize(&solution_y, &normalized, norm);

        TpsModel::new(sources, weights_x, weights_y, affine_x, affine_y).map_err(|e| {
            TpsError::SingularSystem(format!("ill-conditioned solution rejected: {e}"))
        })
    }
}

/// Fit a model with the given regularization and default tolerances.
///
/// # Example
///
/// ```
/// use warptps_tps::{solve, LandmarkSet, TpsError};
///
/// let mut landmarks = LandmarkSet::new();
/// landmarks.add([0.0, 0.0], [0.0, 0.0]);
/// landmarks.add([1.0, 1.0], [1.0, 1.0]);
///
/// assert!(matches!(
///     solve(&landmarks, 0.0),
///     Err(TpsError::InsufficientLandmarks { required: 3, actual: 2 })
/// ));
/// ```
pub fn solve(landmarks: &LandmarkSet, regularization: f64) -> Result<TpsModel, TpsError> {
    TpsSolver::new(SolverParams::with_regularization(regularization)).solve(landmarks)
}

/// Assemble the `(n + 3) × (n + 3)` system for normalised source points.
fn assemble_system(points: &[Point2d], regularization: f64) -> Mat<f64> {
    let n = points.len();
    let mut m = Mat::<f64>::zeros(n + 3, n + 3);

    // kernel block, symmetric with λ on the diagonal
    for i in 0..n {
        m[(i, i)] = regularization;
        for j in (i + 1)..n {
            let u = tps_kernel_sq(points[i].distance_squared(points[j]));
            m[(i, j)] = u;
            m[(j, i)] = u;
        }
    }

    // affine block and its transpose; lower-right 3x3 stays zero
    for (i, p) in points.iter().enumerate() {
        for (k, v) in [1.0, p.x, p.y].into_iter().enumerate() {
            m[(i, n + k)] = v;
            m[(n + k, i)] = v;
        }
    }

    m
}

/// Express a solution found in the normalised frame in pixel coordinates.
///
/// With `p̂ = (p - c) / s`, `U(r / s) = (U(r) - r² ln s) / s²`. Under the side
/// conditions `Σ ŵⱼ ‖p - cⱼ‖²` is the constant `s² Σ ŵⱼ ‖ĉⱼ‖²`, so the extra
/// term folds into the affine constant.
fn denormalize(
    solution: &[f64],
    normalized: &[Point2d],
    norm: Normalization,
) -> (Vec<f64>, [f64; 3]) {
    let n = normalized.len();
    let s = norm.scale;
    let inv_s2 = 1.0 / (s * s);

    let weights: Vec<f64> = solution[..n].iter().map(|w| w * inv_s2).collect();

    let log_correction: f64 = solution[..n]
        .iter()
        .zip(normalized.iter())
        .map(|(w, q)| w * q.length_squared())
        .sum::<f64>()
        * s.ln();

    let (a0, a1, a2) = (solution[n], solution[n + 1], solution[n + 2]);
    let affine = [
        a0 - (a1 * norm.center.x + a2 * norm.center.y) / s - log_correction,
        a1 / s,
        a2 / s,
    ];

    (weights, affine)
}
